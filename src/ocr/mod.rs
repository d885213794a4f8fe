pub mod engine;
pub mod preprocess;
pub mod recognize;
pub mod setup;

pub use engine::{LayoutMode, OcrWord, TesseractEngine, TextRecognizer};
pub use preprocess::{crop_region, preprocess_region};
pub use recognize::{best_transcription, Transcription};
pub use setup::ensure_tessdata;

use image::DynamicImage;

use crate::config::DetectorConfig;

/// Cropped region → text, using the configured modes and confidence floor.
pub fn read_region<R: TextRecognizer + ?Sized>(
    recognizer: &R,
    crop: &DynamicImage,
    config: &DetectorConfig,
) -> Transcription {
    let prepared = preprocess_region(crop, config);
    best_transcription(recognizer, &prepared, &config.layout_modes, config.confidence_floor)
}
