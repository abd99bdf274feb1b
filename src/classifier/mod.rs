//! Input classification.
//!
//! Decides whether an input is a URL, free text, an image or a video, and
//! attaches the hints later stages need (platform, file type, structure
//! counts). Classification never fails: unknown shapes land in the
//! lowest-confidence bucket of the most forgiving type.

mod platform;
mod text;
mod url;

pub use platform::{match_platform, PlatformSignature};
pub use text::{validate_text, TextSignals, TextValidation, MAX_TEXT_LENGTH, MIN_TEXT_LENGTH};
pub use url::{normalize_url, parse_web_url};

use log::debug;

use crate::model::{
    BinaryFileRef, DetectionMetadata, DetectionResult, ImportInput, InputType, Platform,
};

const MIME_CONFIDENCE: f64 = 0.95;
const MIME_TEXT_CONFIDENCE: f64 = 0.9;
const EXTENSION_CONFIDENCE: f64 = 0.8;
const EXTENSION_TEXT_CONFIDENCE: f64 = 0.7;
/// Unknown binaries are assumed to be images so OCR can still try
const UNKNOWN_FILE_CONFIDENCE: f64 = 0.3;
const GENERIC_URL_CONFIDENCE: f64 = 0.8;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "heic", "heif",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "webm", "mkv", "3gp"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

pub struct InputClassifier;

impl InputClassifier {
    pub fn classify(input: &ImportInput) -> DetectionResult {
        let result = match input {
            ImportInput::Text(text) => Self::classify_str(text),
            ImportInput::File(file) => Self::classify_file(file),
        };
        debug!(
            "Classified input as {:?} (confidence {:.2})",
            result.input_type, result.confidence
        );
        result
    }

    fn classify_str(input: &str) -> DetectionResult {
        match parse_web_url(input) {
            Some(url) => Self::classify_url(&normalize_url(&url).to_string()),
            None => Self::classify_text(input),
        }
    }

    fn classify_url(normalized: &str) -> DetectionResult {
        let mut metadata = DetectionMetadata {
            url: Some(normalized.to_string()),
            ..Default::default()
        };

        let confidence = match match_platform(normalized) {
            Some(signature) => {
                metadata.platform = Some(signature.platform);
                if signature.is_video {
                    metadata.is_video_url = Some(true);
                }
                if signature.is_social {
                    metadata.is_social_media = Some(true);
                }
                signature.confidence
            }
            None => {
                metadata.platform = Some(Platform::Generic);
                GENERIC_URL_CONFIDENCE
            }
        };

        DetectionResult {
            input_type: InputType::Url,
            confidence,
            metadata,
        }
    }

    fn classify_text(text: &str) -> DetectionResult {
        let signals = TextSignals::analyze(text);
        let confidence = signals.confidence(text);

        DetectionResult {
            input_type: InputType::Text,
            confidence,
            metadata: DetectionMetadata {
                has_recipe_structure: Some(signals.has_recipe_structure),
                bullet_points: Some(signals.bullet_points),
                numbered_steps: Some(signals.numbered_steps),
                measurements: Some(signals.measurements),
                ..Default::default()
            },
        }
    }

    fn classify_file(file: &BinaryFileRef) -> DetectionResult {
        let size = file.size.or(Some(file.data.len() as u64));

        if let Some(mime) = file.mime_type.as_deref() {
            if let Some((input_type, confidence)) = type_from_mime(mime) {
                return file_result(input_type, confidence, mime.to_string(), size);
            }
        }

        if let Some(ext) = file.name.as_deref().and_then(extension) {
            if let Some((input_type, confidence)) = type_from_extension(&ext) {
                return file_result(input_type, confidence, ext, size);
            }
        }

        let file_type = file
            .mime_type
            .clone()
            .or_else(|| file.name.as_deref().and_then(extension))
            .unwrap_or_else(|| "unknown".to_string());
        file_result(InputType::Image, UNKNOWN_FILE_CONFIDENCE, file_type, size)
    }
}

fn file_result(
    input_type: InputType,
    confidence: f64,
    file_type: String,
    size: Option<u64>,
) -> DetectionResult {
    DetectionResult {
        input_type,
        confidence,
        metadata: DetectionMetadata {
            file_type: Some(file_type),
            size,
            ..Default::default()
        },
    }
}

fn type_from_mime(mime: &str) -> Option<(InputType, f64)> {
    let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
    let (top, sub) = essence.split_once('/')?;
    if sub.is_empty() {
        return None;
    }
    match top {
        "image" => Some((InputType::Image, MIME_CONFIDENCE)),
        "video" => Some((InputType::Video, MIME_CONFIDENCE)),
        "text" => Some((InputType::Text, MIME_TEXT_CONFIDENCE)),
        _ => None,
    }
}

fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

fn type_from_extension(ext: &str) -> Option<(InputType, f64)> {
    if IMAGE_EXTENSIONS.contains(&ext) {
        Some((InputType::Image, EXTENSION_CONFIDENCE))
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Some((InputType::Video, EXTENSION_CONFIDENCE))
    } else if TEXT_EXTENSIONS.contains(&ext) {
        Some((InputType::Text, EXTENSION_TEXT_CONFIDENCE))
    } else {
        None
    }
}
