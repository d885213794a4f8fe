use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

/// Which strategy proposed a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSource {
    Contour,
    Panel,
    Grid,
    WholeImage,
}

impl RegionSource {
    /// Static prior assigned to every region from this strategy.
    pub fn confidence(&self) -> f32 {
        match self {
            RegionSource::Contour => 0.7,
            RegionSource::Panel => 0.6,
            RegionSource::Grid => 0.4,
            RegionSource::WholeImage => 1.0,
        }
    }
}

/// A rectangular candidate for a widget panel, in absolute pixel coordinates.
///
/// Always non-empty and fully inside the image it was built for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Always `width * height`
    pub area: u64,
    pub confidence: f32,
    pub source: RegionSource,
}

impl WidgetRegion {
    /// Builds a region clamped to `image_size` (width, height).
    ///
    /// Returns `None` if nothing is left after clamping.
    pub fn new(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        confidence: f32,
        source: RegionSource,
        image_size: (u32, u32),
    ) -> Option<Self> {
        let (image_width, image_height) = image_size;
        if x >= image_width || y >= image_height {
            return None;
        }

        let width = width.min(image_width - x);
        let height = height.min(image_height - y);
        if width == 0 || height == 0 {
            return None;
        }

        Some(Self {
            x,
            y,
            width,
            height,
            area: width as u64 * height as u64,
            confidence: confidence.clamp(0.0, 1.0),
            source,
        })
    }

    /// Region covering the whole image.
    pub fn whole_image(image_size: (u32, u32)) -> Option<Self> {
        let (width, height) = image_size;
        let source = RegionSource::WholeImage;
        Self::new(0, 0, width, height, source.confidence(), source, image_size)
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn to_rect(&self) -> Rect {
        Rect::at(self.x as i32, self.y as i32).of_size(self.width, self.height)
    }

    /// Intersection area over union area.
    pub fn iou(&self, other: &WidgetRegion) -> f32 {
        let Some(overlap) = self.to_rect().intersect(other.to_rect()) else {
            return 0.0;
        };

        let intersection = overlap.width() as u64 * overlap.height() as u64;
        let union = self.area + other.area - intersection;
        if union == 0 {
            return 0.0;
        }

        (intersection as f64 / union as f64) as f32
    }
}
