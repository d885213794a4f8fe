//! Debug overlay of detected regions.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;

use crate::detect::{RegionSource, WidgetRegion};

fn source_color(source: RegionSource) -> Rgba<u8> {
    match source {
        RegionSource::Contour => Rgba([0, 200, 0, 255]),
        RegionSource::Panel => Rgba([0, 120, 255, 255]),
        RegionSource::Grid => Rgba([255, 160, 0, 255]),
        RegionSource::WholeImage => Rgba([255, 0, 255, 255]),
    }
}

/// Copy of `image` with every region outlined, colour-coded by strategy.
///
/// Outlines are drawn 2px thick, inward from the region edge.
pub fn annotate_regions(image: &DynamicImage, regions: &[WidgetRegion]) -> RgbaImage {
    let mut canvas = image.to_rgba8();

    for region in regions {
        let color = source_color(region.source);
        draw_hollow_rect_mut(&mut canvas, region.to_rect(), color);
        if region.width > 2 && region.height > 2 {
            let inner = imageproc::rect::Rect::at(region.x as i32 + 1, region.y as i32 + 1)
                .of_size(region.width - 2, region.height - 2);
            draw_hollow_rect_mut(&mut canvas, inner, color);
        }
    }

    canvas
}
