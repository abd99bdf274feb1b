//! Image cleanup applied before recognition.
//!
//! Steps run in a fixed order on a grayscale copy: contrast, denoise,
//! sharpen, resize. The result is re-encoded as PNG.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Luma};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::model::ImageSize;

pub const STEP_CONTRAST: &str = "contrast";
pub const STEP_DENOISE: &str = "denoise";
pub const STEP_SHARPEN: &str = "sharpen";
pub const STEP_RESIZE: &str = "resize";

const CONTRAST_MIDPOINT: f32 = 128.0;
const CONTRAST_FACTOR: f32 = 1.5;
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Band the shorter image side is scaled into
pub const MIN_SHORT_SIDE: u32 = 1000;
pub const MAX_SHORT_SIDE: u32 = 2000;
pub const MAX_LONG_SIDE: u32 = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreprocessOptions {
    pub contrast: bool,
    pub denoise: bool,
    pub sharpen: bool,
    pub resize: bool,
}

impl PreprocessOptions {
    pub fn all() -> Self {
        PreprocessOptions {
            contrast: true,
            denoise: true,
            sharpen: true,
            resize: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.contrast || self.denoise || self.sharpen || self.resize
    }
}

#[derive(Debug, Clone)]
pub struct PreprocessOutcome {
    pub data: Vec<u8>,
    /// Step names in execution order
    pub applied: Vec<String>,
    pub original_size: ImageSize,
}

pub fn image_size(data: &[u8]) -> Option<ImageSize> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    Some(ImageSize { width, height })
}

pub fn preprocess(
    data: &[u8],
    options: &PreprocessOptions,
) -> Result<PreprocessOutcome, image::ImageError> {
    let decoded = image::load_from_memory(data)?;
    let original_size = ImageSize {
        width: decoded.width(),
        height: decoded.height(),
    };
    let mut gray = decoded.to_luma8();
    let mut applied = Vec::new();

    if options.contrast {
        stretch_contrast(&mut gray);
        applied.push(STEP_CONTRAST.to_string());
    }
    if options.denoise {
        gray = median_3x3(&gray);
        applied.push(STEP_DENOISE.to_string());
    }
    if options.sharpen {
        gray = imageops::filter3x3(&gray, &SHARPEN_KERNEL);
        applied.push(STEP_SHARPEN.to_string());
    }
    if options.resize {
        if let Some((width, height)) = target_dimensions(gray.width(), gray.height()) {
            gray = imageops::resize(&gray, width, height, FilterType::Triangle);
        }
        applied.push(STEP_RESIZE.to_string());
    }

    let mut out = Vec::new();
    DynamicImage::ImageLuma8(gray).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;

    Ok(PreprocessOutcome {
        data: out,
        applied,
        original_size,
    })
}

fn stretch_contrast(image: &mut GrayImage) {
    for pixel in image.pixels_mut() {
        let value = (pixel.0[0] as f32 - CONTRAST_MIDPOINT) * CONTRAST_FACTOR + CONTRAST_MIDPOINT;
        pixel.0[0] = value.round().clamp(0.0, 255.0) as u8;
    }
}

/// 3x3 median with clamped edges
fn median_3x3(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    GrayImage::from_fn(width, height, |x, y| {
        let mut window = [0u8; 9];
        let mut i = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
                let ny = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
                window[i] = image.get_pixel(nx, ny).0[0];
                i += 1;
            }
        }
        window.sort_unstable();
        Luma([window[4]])
    })
}

/// New dimensions putting the shorter side inside the band, or None if it
/// already is. Enlargement never pushes the longer side past
/// `MAX_LONG_SIDE`.
pub fn target_dimensions(width: u32, height: u32) -> Option<(u32, u32)> {
    let short = width.min(height);
    let long = width.max(height);
    if short == 0 {
        return None;
    }
    let target = if short < MIN_SHORT_SIDE {
        MIN_SHORT_SIDE
    } else if short > MAX_SHORT_SIDE {
        MAX_SHORT_SIDE
    } else {
        return None;
    };

    let scale = (target as f64 / short as f64).min(MAX_LONG_SIDE as f64 / long as f64);
    if target == MIN_SHORT_SIDE && scale <= 1.0 {
        return None;
    }
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    Some((scaled(width), scaled(height)))
}
