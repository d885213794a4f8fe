use image::GrayImage;

use super::region::{RegionSource, WidgetRegion};
use crate::config::DetectorConfig;

/// Proposes every cell of every configured (rows, cols) layout.
///
/// Content is ignored entirely; this only exists to cover layouts the other
/// strategies miss. Layouts whose cells are not larger than `min_area` are
/// skipped, and each cell is inset by `grid_inset` on all sides.
pub fn detect_by_grid(gray: &GrayImage, config: &DetectorConfig) -> Vec<WidgetRegion> {
    let (width, height) = gray.dimensions();
    let inset = config.grid_inset;
    let source = RegionSource::Grid;
    let mut regions = Vec::new();

    for &(rows, cols) in &config.grid_layouts {
        if rows == 0 || cols == 0 {
            continue;
        }

        let cell_w = width / cols;
        let cell_h = height / rows;
        if (cell_w as u64 * cell_h as u64) <= config.min_area as u64 {
            continue;
        }

        let inner_w = cell_w.saturating_sub(2 * inset);
        let inner_h = cell_h.saturating_sub(2 * inset);

        for r in 0..rows {
            for c in 0..cols {
                regions.extend(WidgetRegion::new(
                    c * cell_w + inset,
                    r * cell_h + inset,
                    inner_w,
                    inner_h,
                    source.confidence(),
                    source,
                    (width, height),
                ));
            }
        }
    }

    regions
}
