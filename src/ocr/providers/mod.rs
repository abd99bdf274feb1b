pub mod google_vision;
pub mod tesseract;

pub use google_vision::GoogleVisionProvider;
pub use tesseract::TesseractProvider;
