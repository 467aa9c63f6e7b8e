//! Rectangle math and display-to-sensor coordinate mapping

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::Rotation;

/// Axis-aligned rectangle given by its edges
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from origin and size
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Zero-area, inverted or non-finite
    pub fn is_degenerate(&self) -> bool {
        // Written negated so NaN edges count as degenerate
        !(self.right > self.left && self.bottom > self.top)
    }

    /// Whether the two rectangles overlap. Shared edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Width and height in display units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Reasons a cycle cannot produce a usable sensor region
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("preview has no area ({width}x{height})")]
    DegeneratePreview { width: f32, height: f32 },
    #[error("sensor image has no area ({width}x{height})")]
    DegenerateImage { width: u32, height: u32 },
    #[error("target region collapses to {0:?} in sensor space")]
    DegenerateRegion(Rect),
}

/// Converts the on-screen target region into sensor pixel coordinates
///
/// Horizontal and vertical axes are scaled independently by
/// `image / preview`. The inset is trimmed from the top edge before scaling.
/// Rotation only affects the result when `apply_rotation` is set, in which
/// case quarter-turn frames are treated as upright images with swapped axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    inset: f32,
    apply_rotation: bool,
}

impl CoordinateMapper {
    pub fn new(inset: f32, apply_rotation: bool) -> Self {
        Self {
            inset,
            apply_rotation,
        }
    }

    /// Image dimensions in the space the recognizer reports boxes in
    fn effective_image(&self, image: (u32, u32), rotation: Rotation) -> (u32, u32) {
        if self.apply_rotation && rotation.swaps_axes() {
            (image.1, image.0)
        } else {
            image
        }
    }

    /// Scale factors `(scale_x, scale_y)` from display units to sensor pixels
    pub fn scale_factors(
        &self,
        preview: Size,
        image: (u32, u32),
        rotation: Rotation,
    ) -> Result<(f32, f32), GeometryError> {
        if !(preview.width > 0.0 && preview.height > 0.0)
            || !preview.width.is_finite()
            || !preview.height.is_finite()
        {
            return Err(GeometryError::DegeneratePreview {
                width: preview.width,
                height: preview.height,
            });
        }

        let (image_width, image_height) = self.effective_image(image, rotation);
        if image_width == 0 || image_height == 0 {
            return Err(GeometryError::DegenerateImage {
                width: image_width,
                height: image_height,
            });
        }

        Ok((
            image_width as f32 / preview.width,
            image_height as f32 / preview.height,
        ))
    }

    /// Map a target region in display units to the sensor region
    pub fn map(
        &self,
        target: Rect,
        preview: Size,
        image: (u32, u32),
        rotation: Rotation,
    ) -> Result<Rect, GeometryError> {
        let (scale_x, scale_y) = self.scale_factors(preview, image, rotation)?;

        let region = Rect::new(
            target.left * scale_x,
            (target.top + self.inset) * scale_y,
            target.right * scale_x,
            target.bottom * scale_y,
        );

        if region.is_degenerate() {
            return Err(GeometryError::DegenerateRegion(region));
        }
        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_intersects_overlap_and_separation() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(a.intersects(&Rect::new(2.0, 2.0, 3.0, 3.0)));
        assert!(!a.intersects(&Rect::new(20.0, 0.0, 30.0, 10.0)));
        assert!(!a.intersects(&Rect::new(0.0, 11.0, 10.0, 20.0)));
        // Touching edges are not an overlap
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_intersects_is_symmetric() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, -5.0, 8.0, 2.0),
            Rect::new(10.0, 10.0, 12.0, 12.0),
            Rect::new(-3.0, 4.0, 30.0, 6.0),
            Rect::new(9.0, 9.0, 9.0, 9.0),
            Rect::new(4.0, 4.0, 2.0, 2.0),
        ];
        for a in &rects {
            for b in &rects {
                assert_eq!(a.intersects(b), b.intersects(a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_degenerate_rects() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(Rect::new(5.0, 5.0, 1.0, 10.0).is_degenerate());
        assert!(Rect::new(0.0, f32::NAN, 1.0, 1.0).is_degenerate());
        assert!(!Rect::from_xywh(1.0, 1.0, 2.0, 2.0).is_degenerate());
    }

    #[test]
    fn test_map_scales_axes_and_trims_inset() {
        let mapper = CoordinateMapper::new(50.0, false);
        let target = Rect::new(100.0, 500.0, 500.0, 650.0);
        let preview = Size::new(1080.0, 2220.0);

        let (scale_x, scale_y) = mapper
            .scale_factors(preview, (1080, 1920), Rotation::Deg0)
            .unwrap();
        assert_close(scale_x, 1.0);
        assert_close(scale_y, 0.8649);

        let region = mapper
            .map(target, preview, (1080, 1920), Rotation::Deg0)
            .unwrap();
        assert_close(region.left, 100.0);
        assert_close(region.top, 550.0 * 1920.0 / 2220.0);
        assert_close(region.top, 475.68);
        assert_close(region.right, 500.0);
        assert_close(region.bottom, 562.16);
    }

    #[test]
    fn test_rotation_ignored_by_default() {
        let mapper = CoordinateMapper::new(0.0, false);
        let target = Rect::new(0.0, 0.0, 540.0, 1110.0);
        let preview = Size::new(1080.0, 2220.0);

        let region = mapper
            .map(target, preview, (1920, 1080), Rotation::Deg90)
            .unwrap();
        assert_close(region.right, 960.0);
        assert_close(region.bottom, 540.0);
    }

    #[test]
    fn test_rotation_swaps_axes_when_enabled() {
        let mapper = CoordinateMapper::new(0.0, true);
        let target = Rect::new(0.0, 0.0, 540.0, 1110.0);
        let preview = Size::new(1080.0, 2220.0);

        let region = mapper
            .map(target, preview, (1920, 1080), Rotation::Deg270)
            .unwrap();
        assert_close(region.right, 540.0);
        assert_close(region.bottom, 960.0);

        // Half turns keep the original axes
        let region = mapper
            .map(target, preview, (1920, 1080), Rotation::Deg180)
            .unwrap();
        assert_close(region.right, 960.0);
    }

    #[test]
    fn test_degenerate_inputs_are_errors() {
        let mapper = CoordinateMapper::new(50.0, false);
        let target = Rect::new(100.0, 500.0, 500.0, 650.0);

        assert!(matches!(
            mapper.map(target, Size::new(0.0, 2220.0), (1080, 1920), Rotation::Deg0),
            Err(GeometryError::DegeneratePreview { .. })
        ));
        assert!(matches!(
            mapper.map(target, Size::new(1080.0, 2220.0), (0, 1920), Rotation::Deg0),
            Err(GeometryError::DegenerateImage { .. })
        ));

        // Inset larger than the region height
        let thin = Rect::new(100.0, 500.0, 500.0, 540.0);
        assert!(matches!(
            mapper.map(thin, Size::new(1080.0, 2220.0), (1080, 1920), Rotation::Deg0),
            Err(GeometryError::DegenerateRegion(_))
        ));
    }
}
