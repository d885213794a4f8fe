//! Widget region detection.
//!
//! Three independent strategies propose rectangular candidates:
//! - edge contours (strongest prior)
//! - thresholded panel blobs
//! - fixed grid layouts (weakest prior, fills gaps)
//!
//! Their output is concatenated, then deduplicated by overlap and capped.

pub mod contours;
pub mod dedup;
pub mod grid;
pub mod panels;
pub mod region;

pub use dedup::deduplicate;
pub use region::{RegionSource, WidgetRegion};

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};

use crate::config::DetectorConfig;

/// Bounding box and enclosed area of one outer contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ContourBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub area: f64,
}

/// Finds the outermost contours of the non-zero pixels in `binary`.
///
/// Contours nested inside another shape are ignored.
pub(crate) fn external_contours(binary: &GrayImage) -> Vec<ContourBox> {
    find_contours::<i32>(binary)
        .iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .filter_map(contour_box)
        .collect()
}

fn contour_box(contour: &Contour<i32>) -> Option<ContourBox> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(ContourBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
        area: polygon_area(contour),
    })
}

/// Shoelace area of the closed polygon through the contour points.
fn polygon_area(contour: &Contour<i32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    twice_area.abs() as f64 / 2.0
}

/// Runs every strategy over `gray` and returns the raw, overlapping candidates.
pub fn generate_candidates(gray: &GrayImage, config: &DetectorConfig) -> Vec<WidgetRegion> {
    let by_contours = contours::detect_by_contours(gray, config);
    let by_panels = panels::detect_by_panels(gray, config);
    let by_grid = grid::detect_by_grid(gray, config);

    log::info!(
        "Region candidates: {} contour, {} panel, {} grid",
        by_contours.len(),
        by_panels.len(),
        by_grid.len()
    );

    let mut candidates = by_contours;
    candidates.extend(by_panels);
    candidates.extend(by_grid);
    candidates
}

/// Candidate generation followed by deduplication.
pub fn detect_widget_regions(gray: &GrayImage, config: &DetectorConfig) -> Vec<WidgetRegion> {
    let candidates = generate_candidates(gray, config);
    let regions = deduplicate(candidates, config.overlap_threshold, config.max_regions);
    log::info!("Detected {} potential widget regions", regions.len());
    regions
}


#[cfg(test)]
mod tests {
    use super::test_support::dashboard;
    use super::*;

    #[test]
    fn test_external_contours_of_filled_rect() {
        let img = dashboard(200, 150, &[(20, 30, 100, 60)]);
        // Foreground is the dark rectangle
        let binary = imageproc::map::map_colors(&img, |p| {
            if p[0] < 128 { image::Luma([255u8]) } else { image::Luma([0u8]) }
        });

        let boxes = external_contours(&binary);
        assert_eq!(boxes.len(), 1);
        let b = boxes[0];
        assert_eq!((b.x, b.y, b.width, b.height), (20, 30, 100, 60));
        // Boundary polygon runs through pixel centres: 99 x 59
        assert!((b.area - 99.0 * 59.0).abs() < 1.0);
    }

    #[test]
    fn test_nested_contours_ignored() {
        let mut img = dashboard(200, 200, &[(10, 10, 180, 180)]);
        imageproc::drawing::draw_filled_rect_mut(
            &mut img,
            imageproc::rect::Rect::at(40, 40).of_size(120, 120),
            image::Luma([255]),
        );
        imageproc::drawing::draw_filled_rect_mut(
            &mut img,
            imageproc::rect::Rect::at(70, 70).of_size(60, 60),
            image::Luma([60]),
        );
        let binary = imageproc::map::map_colors(&img, |p| {
            if p[0] < 128 { image::Luma([255u8]) } else { image::Luma([0u8]) }
        });

        let boxes = external_contours(&binary);
        assert_eq!(boxes.len(), 1);
        assert_eq!((boxes[0].x, boxes[0].width), (10, 180));
    }

    #[test]
    fn test_detected_regions_stay_in_bounds() {
        let img = dashboard(
            800,
            600,
            &[(30, 40, 340, 240), (410, 60, 360, 220), (60, 350, 680, 200)],
        );
        let config = DetectorConfig::default();

        for r in generate_candidates(&img, &config) {
            assert!(r.width > 0 && r.height > 0);
            assert!(r.right() <= 800, "{:?}", r);
            assert!(r.bottom() <= 600, "{:?}", r);
            assert_eq!(r.area, r.width as u64 * r.height as u64);
            assert!((0.0..=1.0).contains(&r.confidence));
        }
    }

    #[test]
    fn test_detect_widget_regions_respects_cap_and_overlap() {
        let img = dashboard(800, 600, &[(30, 40, 340, 240), (410, 60, 360, 220)]);
        let config = DetectorConfig::default();

        let regions = detect_widget_regions(&img, &config);
        assert!(!regions.is_empty());
        assert!(regions.len() <= config.max_regions);
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                assert!(a.iou(b) < config.overlap_threshold);
            }
        }
    }

    #[test]
    fn test_tiny_image_has_no_candidates() {
        let img = dashboard(20, 20, &[]);
        assert!(detect_widget_regions(&img, &DetectorConfig::default()).is_empty());
    }
}
