//! Face detection adapter.
//!
//! Detectors report faces as corner pairs in frame-pixel coordinates, best
//! detection first. The tracker only ever looks at the first one.

/// BlazeFace anchor decoding and the ONNX Runtime backend
pub mod blazeface;

use crate::Result;

/// A 2D point in frame-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Face bounding box as produced by a detector for a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Top-left corner
    pub top_left: Point,
    /// Bottom-right corner
    pub bottom_right: Point,
    /// Detection confidence
    pub score: f32,
}

impl BoundingBox {
    /// Create a box from its corners with full confidence
    #[must_use]
    pub const fn from_corners(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            bottom_right,
            score: 1.0,
        }
    }

    /// Box width in pixels
    #[must_use]
    pub fn width(&self) -> f64 {
        self.bottom_right.x - self.top_left.x
    }

    /// Box height in pixels
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom_right.y - self.top_left.y
    }

    /// Horizontal center
    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.top_left.x + self.width() / 2.0
    }

    /// Top edge
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.top_left.y
    }

    /// Intersection over union with another box
    #[must_use]
    pub fn iou(&self, other: &Self) -> f64 {
        let x1 = self.top_left.x.max(other.top_left.x);
        let y1 = self.top_left.y.max(other.top_left.y);
        let x2 = self.bottom_right.x.min(other.bottom_right.x);
        let y2 = self.bottom_right.y.min(other.bottom_right.y);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.width() * self.height() + other.width() * other.height() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// Pluggable face detection backend.
///
/// `estimate_faces` is the inference call of the detection loop. It may block
/// for the duration of a model run; results are sorted by descending score.
pub trait FaceDetector {
    /// Frame type the detector consumes
    type Frame;

    /// Detect faces in a frame
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails
    fn estimate_faces(&mut self, frame: &Self::Frame) -> Result<Vec<BoundingBox>>;
}
