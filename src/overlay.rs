//! Mapping face boxes from video pixels to screen space.
//!
//! The video is shown "cover" fitted (scaled until both axes fill the display,
//! overflow cropped evenly on both sides) and horizontally mirrored, while the
//! detector sees the raw, unmirrored frame.

use crate::constants::{CROWN_ASPECT, CROWN_LIFT, CROWN_WIDTH_SCALE};
use crate::face_detection::BoundingBox;
use crate::{Error, Result};

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSize {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl FrameSize {
    /// Create a new size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Screen-space anchor of the overlay: horizontal face center, top of the face
/// and face width, all in display pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPosition {
    /// Horizontal center in display pixels
    pub x: f64,
    /// Top edge in display pixels
    pub y: f64,
    /// Face width in display pixels
    pub width: f64,
}

/// Converts frame-pixel boxes into display anchors for one (video, display) size pair
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    video: FrameSize,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    mirror: bool,
}

impl CoordinateMapper {
    /// Create a mapper for the given intrinsic video size and displayed size
    ///
    /// # Errors
    ///
    /// Returns an error if either size is zero, negative or not finite
    /// (typically a video that has not delivered its first frame yet)
    pub fn new(video: FrameSize, display: FrameSize, mirror: bool) -> Result<Self> {
        if !video.is_valid() {
            return Err(Error::InvalidInput(format!(
                "Video size {}x{} is not usable",
                video.width, video.height
            )));
        }
        if !display.is_valid() {
            return Err(Error::InvalidInput(format!(
                "Display size {}x{} is not usable",
                display.width, display.height
            )));
        }

        let scale = (display.width / video.width).max(display.height / video.height);
        let offset_x = (display.width - video.width * scale) / 2.0;
        let offset_y = (display.height - video.height * scale) / 2.0;

        Ok(Self {
            video,
            scale,
            offset_x,
            offset_y,
            mirror,
        })
    }

    /// Cover-fit scale factor
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Letterbox offsets; zero or negative under cover fitting
    #[must_use]
    pub const fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    /// Map a detected box to its display anchor
    #[must_use]
    pub fn map(&self, bbox: &BoundingBox) -> AnchorPosition {
        let center_x = bbox.center_x();
        let anchor_x = if self.mirror {
            self.video.width - center_x
        } else {
            center_x
        };

        AnchorPosition {
            x: anchor_x.mul_add(self.scale, self.offset_x),
            y: bbox.top().mul_add(self.scale, self.offset_y),
            width: bbox.width() * self.scale,
        }
    }

    /// Size of the scaled video before cropping
    #[must_use]
    pub fn scaled_video(&self) -> FrameSize {
        FrameSize::new(self.video.width * self.scale, self.video.height * self.scale)
    }

    /// Region of the scaled video that is visible in the display, as
    /// `(x, y, width, height)` in scaled-video pixels
    #[must_use]
    pub fn visible_region(&self) -> (f64, f64, f64, f64) {
        let scaled = self.scaled_video();
        (
            -self.offset_x,
            -self.offset_y,
            self.offset_x.mul_add(2.0, scaled.width),
            self.offset_y.mul_add(2.0, scaled.height),
        )
    }
}

/// Crown rectangle on screen derived from an anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrownPlacement {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Crown width
    pub width: f64,
    /// Crown height
    pub height: f64,
}

impl CrownPlacement {
    /// Place the crown centered on the anchor with most of it above the hairline
    #[must_use]
    pub fn from_anchor(anchor: &AnchorPosition) -> Self {
        let width = anchor.width * CROWN_WIDTH_SCALE;
        let height = width * CROWN_ASPECT;
        Self {
            left: anchor.x - width / 2.0,
            top: height.mul_add(-CROWN_LIFT, anchor.y),
            width,
            height,
        }
    }

    /// Closed crown outline (band plus three points), clockwise from the bottom-left
    #[must_use]
    pub fn outline(&self) -> Vec<(f64, f64)> {
        let (l, t, w, h) = (self.left, self.top, self.width, self.height);
        let band_top = t + h * 0.55;
        vec![
            (l, t + h),
            (l, t),
            (l + w * 0.25, band_top),
            (l + w * 0.5, t),
            (l + w * 0.75, band_top),
            (l + w, t),
            (l + w, t + h),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face_detection::Point;

    fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> BoundingBox {
        BoundingBox::from_corners(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn test_reference_example() {
        let mapper =
            CoordinateMapper::new(FrameSize::new(640.0, 480.0), FrameSize::new(320.0, 240.0), true).unwrap();
        assert_eq!(mapper.scale(), 0.5);
        assert_eq!(mapper.offset(), (0.0, 0.0));

        let anchor = mapper.map(&bbox(100.0, 100.0, 300.0, 300.0));
        assert_eq!(anchor, AnchorPosition { x: 220.0, y: 50.0, width: 100.0 });
    }

    #[test]
    fn test_cover_offsets_crop_overflow() {
        // 4:3 video in a 16:9 display: width fills, height overflows
        let mapper =
            CoordinateMapper::new(FrameSize::new(640.0, 480.0), FrameSize::new(1280.0, 720.0), true).unwrap();
        assert_eq!(mapper.scale(), 2.0);
        assert_eq!(mapper.offset(), (0.0, -120.0));
        assert_eq!(mapper.visible_region(), (0.0, 120.0, 1280.0, 720.0));
    }

    #[test]
    fn test_unmirrored() {
        let mapper =
            CoordinateMapper::new(FrameSize::new(640.0, 480.0), FrameSize::new(640.0, 480.0), false).unwrap();
        let anchor = mapper.map(&bbox(100.0, 40.0, 200.0, 140.0));
        assert_eq!(anchor.x, 150.0);
        assert_eq!(anchor.y, 40.0);
    }

    #[test]
    fn test_rejects_unready_video() {
        assert!(CoordinateMapper::new(FrameSize::new(0.0, 0.0), FrameSize::new(320.0, 240.0), true).is_err());
        assert!(CoordinateMapper::new(FrameSize::new(640.0, 480.0), FrameSize::new(f64::NAN, 240.0), true).is_err());
    }

    #[test]
    fn test_crown_sits_above_anchor() {
        let crown = CrownPlacement::from_anchor(&AnchorPosition { x: 200.0, y: 100.0, width: 100.0 });
        assert!((crown.width - 110.0).abs() < 1e-9);
        assert!((crown.left - 145.0).abs() < 1e-9);
        assert!((crown.top + crown.height * 0.8 - 100.0).abs() < 1e-9);
        assert_eq!(crown.outline().len(), 7);
    }
}
