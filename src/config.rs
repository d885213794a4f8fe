//! Detector configuration.
//!
//! Loads tunables from config.json at startup. Every field has a default, so a
//! partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::PipelineError;
use crate::ocr::engine::LayoutMode;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<DetectorConfig> = OnceLock::new();

/// Complete detection and extraction configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum contour area (px²) for the contour and panel strategies
    pub min_area: u32,
    /// Margin added around contour bounding boxes, clamped to the image
    pub contour_padding: u32,
    /// Accepted width/height range for contour regions
    pub aspect_ratio_min: f32,
    pub aspect_ratio_max: f32,
    /// Canny hysteresis thresholds
    pub canny_low: f32,
    pub canny_high: f32,
    /// Side of the square structuring element used to isolate panels
    pub panel_kernel: u32,
    /// Neighbourhood radius for adaptive thresholding (radius 5 = 11x11 block)
    pub adaptive_block_radius: u32,
    /// Fixed (rows, cols) layouts tried by the grid strategy
    pub grid_layouts: Vec<(u32, u32)>,
    /// Inset applied on every side of a grid cell
    pub grid_inset: u32,
    /// IoU at or above which a lower-confidence candidate is dropped
    pub overlap_threshold: f32,
    /// Cap on regions kept after deduplication
    pub max_regions: usize,
    /// Regions smaller than this on either side get upscaled before OCR
    pub min_dimension: u32,
    /// Minimum upscale factor applied to small regions
    pub upscale_factor: f32,
    /// Histogram clip limit for tile-based contrast equalization
    pub clahe_clip_limit: f32,
    /// Tiles per side for contrast equalization
    pub clahe_tiles: u32,
    /// OCR tokens at or below this confidence are discarded
    pub confidence_floor: f32,
    /// Layout modes tried per region, in order
    pub layout_modes: Vec<LayoutMode>,
    /// Tesseract language code
    pub language: String,
    /// Worker threads for per-region extraction (1 = sequential)
    pub workers: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_area: 3000,
            contour_padding: 10,
            aspect_ratio_min: 0.5,
            aspect_ratio_max: 4.0,
            canny_low: 30.0,
            canny_high: 100.0,
            panel_kernel: 20,
            adaptive_block_radius: 5,
            grid_layouts: vec![
                (2, 2),
                (3, 2),
                (2, 3),
                (3, 3),
                (4, 2),
                (2, 4),
                (4, 3),
                (3, 4),
            ],
            grid_inset: 10,
            overlap_threshold: 0.5,
            max_regions: 15,
            min_dimension: 100,
            upscale_factor: 2.0,
            clahe_clip_limit: 3.0,
            clahe_tiles: 8,
            confidence_floor: 30.0,
            layout_modes: LayoutMode::ALL.to_vec(),
            language: "eng".to_string(),
            workers: 1,
        }
    }
}

impl DetectorConfig {
    /// Reads a config file, failing if it is missing or malformed.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Loads configuration from `path` or returns defaults.
///
/// A missing or unparsable file is logged and ignored.
pub fn load_config(path: &Path) -> DetectorConfig {
    log::info!("Looking for config at: {}", path.display());

    if !path.exists() {
        log::info!("config.json not found. Using default config.");
        return DetectorConfig::default();
    }

    match DetectorConfig::from_file(path) {
        Ok(config) => {
            log::info!("Config loaded from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            DetectorConfig::default()
        }
    }
}

/// Installs the global configuration. Only the first call has any effect.
pub fn init_config(config: DetectorConfig) {
    if CONFIG.set(config).is_err() {
        log::debug!("Config already initialized; keeping the existing one");
    }
}

/// Returns the global configuration, falling back to defaults if
/// `init_config` was never called.
pub fn get_config() -> &'static DetectorConfig {
    CONFIG.get_or_init(DetectorConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{ "max_regions": 4, "language": "deu" }"#).unwrap();

        assert_eq!(config.max_regions, 4);
        assert_eq!(config.language, "deu");
        assert_eq!(config.min_area, 3000);
        assert_eq!(config.layout_modes.len(), 4);
    }

    #[test]
    fn test_grid_layouts_from_json_arrays() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{ "grid_layouts": [[1, 2], [3, 3]] }"#).unwrap();
        assert_eq!(config.grid_layouts, vec![(1, 2), (3, 3)]);
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.json"));
        assert_eq!(config.max_regions, 15);
    }

    #[test]
    fn test_load_config_malformed_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(DetectorConfig::from_file(&path).is_err());
        assert_eq!(load_config(&path).overlap_threshold, 0.5);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = concat!(env!("CARGO_MANIFEST_DIR"), "/config.json");
        let config = DetectorConfig::from_file(Path::new(shipped)).unwrap();
        let defaults = DetectorConfig::default();

        assert_eq!(config.grid_layouts, defaults.grid_layouts);
        assert_eq!(config.layout_modes, defaults.layout_modes);
        assert_eq!(config.max_regions, defaults.max_regions);
    }
}
