use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::close;

use super::region::{RegionSource, WidgetRegion};
use super::external_contours;
use crate::config::DetectorConfig;

/// Proposes regions around closed edge outlines.
///
/// Canny edges are closed with a 3x3 square to bridge small breaks, then each
/// outer contour that is large enough and panel-shaped becomes a region,
/// padded by `contour_padding` on every side.
pub fn detect_by_contours(gray: &GrayImage, config: &DetectorConfig) -> Vec<WidgetRegion> {
    let edges = canny(gray, config.canny_low, config.canny_high);
    let closed = close(&edges, Norm::LInf, 1);
    let image_size = gray.dimensions();
    let pad = config.contour_padding;
    let source = RegionSource::Contour;

    external_contours(&closed)
        .into_iter()
        .filter(|c| c.area > config.min_area as f64)
        .filter(|c| {
            let aspect_ratio = c.width as f32 / c.height as f32;
            (config.aspect_ratio_min..=config.aspect_ratio_max).contains(&aspect_ratio)
        })
        .filter_map(|c| {
            let x = c.x.saturating_sub(pad);
            let y = c.y.saturating_sub(pad);
            let right = c.x + c.width + pad;
            let bottom = c.y + c.height + pad;
            WidgetRegion::new(
                x,
                y,
                right - x,
                bottom - y,
                source.confidence(),
                source,
                image_size,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::test_support::dashboard;

    #[test]
    fn test_finds_separated_panels() {
        let img = dashboard(800, 600, &[(30, 40, 340, 240), (410, 60, 360, 220)]);
        let mut regions = detect_by_contours(&img, &DetectorConfig::default());
        regions.sort_by_key(|r| r.x);

        assert_eq!(regions.len(), 2, "{:?}", regions);
        // Padded by 10px around the outline, give or take the edge width
        assert!(regions[0].x.abs_diff(20) <= 3 && regions[0].y.abs_diff(30) <= 3);
        assert!(regions[0].width.abs_diff(360) <= 6);
        assert!(regions[1].x.abs_diff(400) <= 3);
        assert!(regions.iter().all(|r| r.confidence == 0.7));
    }

    #[test]
    fn test_padding_clamped_at_image_border() {
        let img = dashboard(400, 300, &[(2, 2, 200, 150)]);
        let regions = detect_by_contours(&img, &DetectorConfig::default());

        assert_eq!(regions.len(), 1);
        assert_eq!((regions[0].x, regions[0].y), (0, 0));
    }

    #[test]
    fn test_rejects_small_and_elongated_shapes() {
        // 40x40 is under the area floor, 600x60 is a 10:1 bar
        let img = dashboard(800, 600, &[(50, 50, 40, 40), (100, 300, 600, 60)]);
        assert!(detect_by_contours(&img, &DetectorConfig::default()).is_empty());
    }

    #[test]
    fn test_blank_image() {
        let img = dashboard(640, 480, &[]);
        assert!(detect_by_contours(&img, &DetectorConfig::default()).is_empty());
    }
}
