//! Dashboard Screenshot
//!
//! Finds the individual widget panels in a monitoring-dashboard screenshot,
//! reads each one with a text recognition engine and turns the text into
//! structured widget records.

pub mod annotate;
pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod extract;
pub mod ocr;
pub mod paths;
pub mod pipeline;
pub mod tables;
pub mod widget;

pub use config::DetectorConfig;
pub use error::{OcrError, PipelineError, RegionError};
pub use pipeline::{process_screenshot, RegionOutcome, SkipReason, WidgetPipeline};
pub use widget::{Category, ExtractedWidget, FlatWidgetRecord, Trend};
