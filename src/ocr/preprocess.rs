use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageBuffer, Luma};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::{filter3x3, median_filter};

use crate::config::DetectorConfig;
use crate::detect::region::WidgetRegion;
use crate::error::RegionError;

/// Centre-weighted sharpening kernel.
const SHARPEN_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// Crops a region out of the screenshot.
///
/// Fails if the region does not lie entirely within the image, which can only
/// happen when it was built for a different screenshot.
pub fn crop_region(img: &DynamicImage, region: &WidgetRegion) -> Result<DynamicImage, RegionError> {
    let (w, h) = img.dimensions();
    if region.width == 0 || region.height == 0 || region.right() > w || region.bottom() > h {
        return Err(RegionError::EmptyCrop {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            image_width: w,
            image_height: h,
        });
    }

    Ok(img.crop_imm(region.x, region.y, region.width, region.height))
}

/// Turns a cropped region into a binary image for the recognition engine.
///
/// Grayscale → upscale if small → median denoise → tile-based contrast
/// equalization → sharpen → adaptive threshold.
pub fn preprocess_region(img: &DynamicImage, config: &DetectorConfig) -> GrayImage {
    let gray = upscale_small(img.to_luma8(), config.min_dimension, config.upscale_factor);
    let denoised = median_filter(&gray, 1, 1);
    let enhanced = equalize_tiles(&denoised, config.clahe_tiles, config.clahe_clip_limit);
    let sharpened = sharpen(&enhanced);
    adaptive_threshold(&sharpened, config.adaptive_block_radius.max(1))
}

/// Upscales with bicubic interpolation so the shorter side reaches
/// `min_dimension`, by at least `factor`. Larger images pass through.
pub fn upscale_small(gray: GrayImage, min_dimension: u32, factor: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let shorter = w.min(h);
    if shorter == 0 || shorter >= min_dimension {
        return gray;
    }

    let scale = (min_dimension as f32 / shorter as f32).max(factor);
    let new_w = (w as f32 * scale).ceil() as u32;
    let new_h = (h as f32 * scale).ceil() as u32;

    image::imageops::resize(&gray, new_w, new_h, FilterType::CatmullRom)
}

pub fn sharpen(gray: &GrayImage) -> GrayImage {
    filter3x3::<Luma<u8>, f32, u8>(gray, &SHARPEN_KERNEL)
}

/// Contrast-limited histogram equalization over a `tiles` x `tiles` grid.
///
/// Each tile gets its own clipped histogram mapping; pixels blend the
/// mappings of the four nearest tile centres so tile seams don't show.
pub fn equalize_tiles(gray: &GrayImage, tiles: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tile_w = width.div_ceil(tiles.clamp(1, width));
    let tile_h = height.div_ceil(tiles.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            luts.push(tile_lut(gray, tx * tile_w, ty * tile_h, tile_w, tile_h, clip_limit));
        }
    }

    ImageBuffer::from_fn(width, height, |x, y| {
        let (tx0, tx1, wx) = neighbour_tiles(x, tile_w, tiles_x);
        let (ty0, ty1, wy) = neighbour_tiles(y, tile_h, tiles_y);
        let v = gray.get_pixel(x, y)[0] as usize;
        let map = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][v] as f32;

        let top = map(tx0, ty0) * (1.0 - wx) + map(tx1, ty0) * wx;
        let bottom = map(tx0, ty1) * (1.0 - wx) + map(tx1, ty1) * wx;
        let value = top * (1.0 - wy) + bottom * wy;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// The two tiles whose centres bracket `pos`, and the weight of the second.
fn neighbour_tiles(pos: u32, tile: u32, count: u32) -> (u32, u32, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }

    let lo = f.floor() as u32;
    if lo + 1 >= count {
        return (count - 1, count - 1, 0.0);
    }
    (lo, lo + 1, f - lo as f32)
}

/// Clipped-histogram equalization mapping for one tile.
fn tile_lut(
    gray: &GrayImage,
    x0: u32,
    y0: u32,
    tile_w: u32,
    tile_h: u32,
    clip_limit: f32,
) -> [u8; 256] {
    let x1 = (x0 + tile_w).min(gray.width());
    let y1 = (y0 + tile_h).min(gray.height());

    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let pixels = (x1 - x0) * (y1 - y0);
    if clip_limit > 0.0 {
        let limit = ((clip_limit * pixels as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for count in hist.iter_mut() {
            if *count > limit {
                excess += *count - limit;
                *count = limit;
            }
        }

        // Spread the clipped mass back evenly, remainder to the darkest bins
        let bonus = excess / 256;
        let mut remainder = excess % 256;
        for count in hist.iter_mut() {
            *count += bonus;
            if remainder > 0 {
                *count += 1;
                remainder -= 1;
            }
        }
    }

    let scale = 255.0 / pixels.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (value, &count) in hist.iter().enumerate() {
        cdf += count;
        lut[value] = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::region::RegionSource;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_crop_region() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(100, 200, |x, y| {
            Rgba([x as u8, y as u8, 0, 255])
        }));

        let region =
            WidgetRegion::new(10, 50, 50, 20, 0.7, RegionSource::Contour, (100, 200)).unwrap();
        let cropped = crop_region(&img, &region).unwrap();

        assert_eq!(cropped.dimensions(), (50, 20));
        // Top-left pixel should be (10, 50) of the full image
        let px = cropped.get_pixel(0, 0);
        assert_eq!((px[0], px[1]), (10, 50));
    }

    #[test]
    fn test_crop_region_from_other_image_fails() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(100, 100));
        let region =
            WidgetRegion::new(50, 50, 100, 100, 0.7, RegionSource::Contour, (400, 400)).unwrap();

        let err = crop_region(&img, &region).unwrap_err();
        assert!(matches!(err, RegionError::EmptyCrop { image_width: 100, .. }));
    }

    #[test]
    fn test_upscale_small_reaches_min_dimension() {
        let small = GrayImage::new(300, 40);
        let up = upscale_small(small, 100, 2.0);
        // 100 / 40 = 2.5 beats the 2.0 floor
        assert_eq!(up.dimensions(), (750, 100));

        let tiny = GrayImage::new(90, 90);
        let up = upscale_small(tiny, 100, 2.0);
        assert_eq!(up.dimensions(), (180, 180));
    }

    #[test]
    fn test_upscale_leaves_large_images() {
        let img = GrayImage::new(120, 100);
        assert_eq!(upscale_small(img, 100, 2.0).dimensions(), (120, 100));
    }

    #[test]
    fn test_upscale_odd_sizes_never_fall_short() {
        for (w, h) in [(333, 7), (13, 97), (99, 3)] {
            let up = upscale_small(GrayImage::new(w, h), 100, 2.0);
            assert!(up.width().min(up.height()) >= 100, "{}x{} -> {:?}", w, h, up.dimensions());
        }
    }

    #[test]
    fn test_equalize_tiles_stretches_low_contrast() {
        // Left half 100, right half 110
        let img = GrayImage::from_fn(64, 64, |x, _| Luma([if x < 32 { 100 } else { 110 }]));
        let out = equalize_tiles(&img, 1, 40.0);

        assert_eq!(out.dimensions(), (64, 64));
        let left = out.get_pixel(0, 0)[0] as i32;
        let right = out.get_pixel(63, 0)[0] as i32;
        assert!(right - left > 10, "left={} right={}", left, right);
    }

    #[test]
    fn test_equalize_tiles_more_tiles_than_pixels() {
        let img = GrayImage::from_pixel(3, 2, Luma([128]));
        let out = equalize_tiles(&img, 8, 3.0);
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn test_neighbour_tiles() {
        assert_eq!(neighbour_tiles(0, 10, 4), (0, 0, 0.0));
        assert_eq!(neighbour_tiles(39, 10, 4), (3, 3, 0.0));
        let (a, b, w) = neighbour_tiles(10, 10, 4);
        assert_eq!((a, b), (0, 1));
        assert!((w - 0.55).abs() < 1e-6, "w={}", w);

        // Exactly on the centre of tile 1 (odd tile width so the centre is a pixel)
        assert_eq!(neighbour_tiles(16, 11, 4), (1, 2, 0.0));
        // Last tile centre and beyond clamp to the final tile
        assert_eq!(neighbour_tiles(38, 11, 4), (3, 3, 0.0));
    }

    #[test]
    fn test_preprocess_region_is_binary() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(160, 120, |x, y| {
            let v = if (x / 8 + y / 8) % 2 == 0 { 40 } else { 220 };
            Rgba([v, v, v, 255])
        }));

        let out = preprocess_region(&img, &DetectorConfig::default());
        assert_eq!(out.dimensions(), (160, 120));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_preprocess_upscales_small_crop() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 25, Luma([200])));
        let out = preprocess_region(&img, &DetectorConfig::default());
        assert_eq!(out.dimensions(), (200, 100));
    }
}
