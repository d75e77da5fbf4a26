//! Geometry primitives in content coordinates (points).

use doc_model::{DeviceIdiom, Orientation, ScrollDirection};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are finite and strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Extent along the scroll axis.
    pub fn along(&self, direction: ScrollDirection) -> f32 {
        match direction {
            ScrollDirection::Horizontal => self.width,
            ScrollDirection::Vertical => self.height,
        }
    }

    pub fn fits_within(&self, other: Size) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Leading edge along the scroll axis.
    pub fn start(&self, direction: ScrollDirection) -> f32 {
        match direction {
            ScrollDirection::Horizontal => self.x,
            ScrollDirection::Vertical => self.y,
        }
    }

    /// Trailing edge along the scroll axis.
    pub fn end(&self, direction: ScrollDirection) -> f32 {
        self.start(direction) + self.size().along(direction)
    }

    /// Length of the overlap between this rect and `[start, end)` along the scroll axis.
    pub fn overlap(&self, direction: ScrollDirection, start: f32, end: f32) -> f32 {
        (self.end(direction).min(end) - self.start(direction).max(start)).max(0.0)
    }

    /// Centers `size` inside this rect.
    pub fn centered(&self, size: Size) -> Rect {
        Rect::new(
            self.x + (self.width - size.width) / 2.0,
            self.y + (self.height - size.height) / 2.0,
            size.width,
            size.height,
        )
    }
}

/// Viewport size plus the orientation signal used to resolve automatic page mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometry {
    pub viewport: Size,
    pub orientation: Orientation,
}

impl Geometry {
    /// Geometry whose orientation is implied by the viewport aspect.
    pub fn new(width: f32, height: f32) -> Self {
        Self { viewport: Size::new(width, height), orientation: Orientation::from_size(width, height) }
    }

    /// Geometry with an orientation reported by the host (device rotation).
    pub fn with_orientation(width: f32, height: f32, orientation: Orientation) -> Self {
        Self { viewport: Size::new(width, height), orientation }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(768.0, 1024.0)
    }
}

/// Cell size for the thumbnail grid. Phones use the reduction factor.
pub fn thumbnail_size(base: Size, idiom: DeviceIdiom, reduction_factor: f32) -> Size {
    match idiom {
        DeviceIdiom::Tablet => base,
        DeviceIdiom::Phone => {
            let factor = if reduction_factor.is_finite() && reduction_factor > 0.0 {
                reduction_factor
            } else {
                1.0
            };
            Size::new((base.width * factor).round(), (base.height * factor).round())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_clamped_to_zero() {
        let rect = Rect::new(100.0, 0.0, 100.0, 50.0);

        assert_eq!(rect.overlap(ScrollDirection::Horizontal, 150.0, 400.0), 50.0);
        assert_eq!(rect.overlap(ScrollDirection::Horizontal, 300.0, 400.0), 0.0);
        assert_eq!(rect.overlap(ScrollDirection::Vertical, 0.0, 20.0), 20.0);
    }

    #[test]
    fn centered_keeps_size() {
        let frame = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let inner = frame.centered(Size::new(600.0, 800.0));

        assert_eq!(inner, Rect::new(200.0, 0.0, 600.0, 800.0));
    }

    #[test]
    fn non_positive_sizes_are_rejected() {
        assert!(Size::new(10.0, 10.0).is_positive());
        assert!(!Size::new(0.0, 10.0).is_positive());
        assert!(!Size::new(10.0, -1.0).is_positive());
        assert!(!Size::new(f32::INFINITY, 10.0).is_positive());
    }

    #[test]
    fn phone_thumbnails_are_reduced() {
        let base = Size::new(170.0, 220.0);

        assert_eq!(thumbnail_size(base, DeviceIdiom::Tablet, 0.588), base);
        assert_eq!(thumbnail_size(base, DeviceIdiom::Phone, 0.588), Size::new(100.0, 129.0));
        assert_eq!(thumbnail_size(base, DeviceIdiom::Phone, 0.0), base);
    }

    #[test]
    fn geometry_derives_orientation() {
        assert_eq!(Geometry::new(1024.0, 768.0).orientation, Orientation::Landscape);
        assert_eq!(Geometry::default().orientation, Orientation::Portrait);
    }
}
