use image::GrayImage;
use imageproc::contrast::adaptive_threshold;
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;

use super::region::{RegionSource, WidgetRegion};
use super::external_contours;
use crate::config::DetectorConfig;

/// Proposes regions from large blocky shapes.
///
/// Adaptive thresholding followed by an opening with a `panel_kernel`-sized
/// square wipes out text and thin lines, leaving panel-sized blobs.
pub fn detect_by_panels(gray: &GrayImage, config: &DetectorConfig) -> Vec<WidgetRegion> {
    let block_radius = config.adaptive_block_radius.max(1);
    let thresh = adaptive_threshold(gray, block_radius);
    let opened = open(&thresh, Norm::LInf, structuring_radius(config.panel_kernel));
    let image_size = gray.dimensions();
    let source = RegionSource::Panel;

    external_contours(&opened)
        .into_iter()
        .filter(|c| c.area > config.min_area as f64)
        .filter_map(|c| {
            WidgetRegion::new(
                c.x,
                c.y,
                c.width,
                c.height,
                source.confidence(),
                source,
                image_size,
            )
        })
        .collect()
}

/// Radius of the LInf ball closest to a square of side `kernel`.
fn structuring_radius(kernel: u32) -> u8 {
    (kernel / 2).clamp(1, u8::MAX as u32) as u8
}
