use thiserror::Error;

use crate::ocr::engine::LayoutMode;

/// Failures that abort a whole `process_screenshot` call.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid screenshot: {width}x{height} image has no pixels")]
    InvalidImage { width: u32, height: u32 },

    #[error("Text recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Extraction tables failed to build: {0}")]
    Tables(#[from] regex::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Failures of the text recognition engine.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Tesseract not found. Please install Tesseract-OCR or set TESSERACT_PATH.")]
    EngineNotFound,

    #[error("Tesseract failed in {mode} mode: {stderr}")]
    EngineFailed { mode: LayoutMode, stderr: String },

    #[error("Malformed TSV output: {0}")]
    Tsv(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Failures confined to a single region. The orchestrator skips the region
/// and keeps going.
#[derive(Error, Debug)]
pub enum RegionError {
    #[error(
        "Region {x},{y} {width}x{height} lies outside the {image_width}x{image_height} screenshot"
    )]
    EmptyCrop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("Recognition failed in all {modes} modes: {message}")]
    RecognitionFailed { modes: usize, message: String },
}
