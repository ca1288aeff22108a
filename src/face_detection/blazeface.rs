//! BlazeFace short-range face detector.
//!
//! The model predicts one box per SSD anchor. Boxes are relative to the
//! anchor center and normalized to the input resolution; the frame is resized
//! to the square input without letterboxing, so normalized coordinates map back
//! to frame pixels by scaling each axis independently.

use super::{BoundingBox, Point};
use crate::constants::{
    BLAZEFACE_INPUT_SIZE, BLAZEFACE_REGRESSOR_VALUES, BLAZEFACE_SCORE_CLIP, BLAZEFACE_STRIDES,
    DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_FACES, DEFAULT_SCORE_THRESHOLD,
};
use crate::{Error, Result};

/// SSD anchor center, normalized to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Horizontal center
    pub x_center: f32,
    /// Vertical center
    pub y_center: f32,
}

/// Thresholds applied while decoding raw model output
#[derive(Debug, Clone, Copy)]
pub struct DecoderSettings {
    /// Minimum sigmoid score to keep a candidate
    pub score_threshold: f32,
    /// Candidates overlapping a better one above this IoU are dropped
    pub iou_threshold: f32,
    /// Upper bound on returned faces
    pub max_faces: usize,
    /// Square model input resolution in pixels
    pub input_size: usize,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_faces: DEFAULT_MAX_FACES,
            input_size: BLAZEFACE_INPUT_SIZE,
        }
    }
}

/// Generate anchors for the front model layout.
///
/// Consecutive layers sharing a stride are merged into one feature map with
/// two anchors per layer at every cell.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn generate_anchors(input_size: usize) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    let mut layer = 0;

    while layer < BLAZEFACE_STRIDES.len() {
        let stride = BLAZEFACE_STRIDES[layer];
        let mut per_cell = 0;
        while layer < BLAZEFACE_STRIDES.len() && BLAZEFACE_STRIDES[layer] == stride {
            per_cell += 2;
            layer += 1;
        }

        let grid = input_size.div_ceil(stride);
        for y in 0..grid {
            for x in 0..grid {
                let anchor = Anchor {
                    x_center: (x as f32 + 0.5) / grid as f32,
                    y_center: (y as f32 + 0.5) / grid as f32,
                };
                anchors.extend(std::iter::repeat(anchor).take(per_cell));
            }
        }
    }

    anchors
}

fn sigmoid(logit: f32) -> f32 {
    let clipped = logit.clamp(-BLAZEFACE_SCORE_CLIP, BLAZEFACE_SCORE_CLIP);
    1.0 / (1.0 + (-clipped).exp())
}

/// Decode raw regressor/classifier output into frame-pixel boxes.
///
/// # Errors
///
/// Returns an error if the tensor lengths do not match the anchor count
#[allow(clippy::cast_precision_loss)]
pub fn decode_detections(
    regressors: &[f32],
    logits: &[f32],
    anchors: &[Anchor],
    settings: &DecoderSettings,
    frame_width: f64,
    frame_height: f64,
) -> Result<Vec<BoundingBox>> {
    if logits.len() != anchors.len() {
        return Err(Error::ModelOutputError(format!(
            "Expected {} scores, got {}",
            anchors.len(),
            logits.len()
        )));
    }
    if regressors.len() != anchors.len() * BLAZEFACE_REGRESSOR_VALUES {
        return Err(Error::ModelOutputError(format!(
            "Expected {} regressor values, got {}",
            anchors.len() * BLAZEFACE_REGRESSOR_VALUES,
            regressors.len()
        )));
    }

    let input = settings.input_size as f32;
    let mut candidates: Vec<BoundingBox> = logits
        .iter()
        .zip(regressors.chunks_exact(BLAZEFACE_REGRESSOR_VALUES))
        .zip(anchors)
        .filter_map(|((&logit, raw), anchor)| {
            let score = sigmoid(logit);
            if score < settings.score_threshold {
                return None;
            }

            let cx = raw[0] / input + anchor.x_center;
            let cy = raw[1] / input + anchor.y_center;
            let half_w = raw[2] / input / 2.0;
            let half_h = raw[3] / input / 2.0;

            Some(BoundingBox {
                top_left: Point::new(
                    f64::from(cx - half_w) * frame_width,
                    f64::from(cy - half_h) * frame_height,
                ),
                bottom_right: Point::new(
                    f64::from(cx + half_w) * frame_width,
                    f64::from(cy + half_h) * frame_height,
                ),
                score,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    Ok(suppress(candidates, f64::from(settings.iou_threshold), settings.max_faces))
}

/// Greedy non-maximum suppression over score-sorted candidates
fn suppress(sorted: Vec<BoundingBox>, iou_threshold: f64, max_faces: usize) -> Vec<BoundingBox> {
    let mut keep: Vec<BoundingBox> = Vec::new();

    for candidate in sorted {
        if keep.len() >= max_faces {
            break;
        }
        if keep.iter().all(|kept| kept.iou(&candidate) <= iou_threshold) {
            keep.push(candidate);
        }
    }

    keep
}

#[cfg(feature = "vision")]
pub use backend::BlazeFaceDetector;

#[cfg(feature = "vision")]
mod backend {
    use super::{decode_detections, generate_anchors, Anchor, DecoderSettings};
    use crate::constants::{BLAZEFACE_INPUT_SIZE, BLAZEFACE_REGRESSOR_VALUES};
    use crate::face_detection::{BoundingBox, FaceDetector};
    use crate::utils::usize_to_i32;
    use crate::{Error, Result};
    use log::{debug, info};
    use ndarray::{Array4, CowArray};
    use opencv::core::{Mat, Size, Vec3f, CV_32F};
    use opencv::imgproc::{self, InterpolationFlags};
    use opencv::prelude::*;
    use ort::{Environment, Session, Value};
    use std::path::Path;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum InputLayout {
        Nchw,
        Nhwc,
    }

    /// BlazeFace detector running on ONNX Runtime
    pub struct BlazeFaceDetector {
        session: Session,
        layout: InputLayout,
        anchors: Vec<Anchor>,
        settings: DecoderSettings,
    }

    impl BlazeFaceDetector {
        /// Load a BlazeFace ONNX model
        ///
        /// # Errors
        ///
        /// Returns an error if the model cannot be loaded or has no inputs
        pub fn new<P: AsRef<Path>>(model_path: P, score_threshold: f32, iou_threshold: f32, max_faces: usize) -> Result<Self> {
            let model_path = model_path.as_ref();
            if !model_path.exists() {
                return Err(Error::ModelError(format!("Model file not found: {}", model_path.display())));
            }
            info!("Loading face model from {}", model_path.display());

            let environment = Arc::new(
                Environment::builder()
                    .with_name("blazeface")
                    .with_log_level(ort::LoggingLevel::Warning)
                    .build()?,
            );

            let session = ort::SessionBuilder::new(&environment)?
                .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
                .with_model_from_file(model_path)?;

            let input_meta = session
                .inputs
                .first()
                .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;

            let dims: Vec<Option<i64>> = input_meta
                .dimensions
                .iter()
                .map(|d| d.map(i64::from))
                .collect();

            let (layout, side) = match dims.as_slice() {
                [_, Some(3), h, _] => (InputLayout::Nchw, *h),
                [_, h, _, Some(3)] => (InputLayout::Nhwc, *h),
                _ => {
                    log::warn!("Unexpected input shape {:?}, assuming NHWC", dims);
                    (InputLayout::Nhwc, None)
                }
            };
            let input_size = side
                .and_then(|s| usize::try_from(s).ok())
                .unwrap_or(BLAZEFACE_INPUT_SIZE);

            info!("Face model loaded ({:?}, {}x{})", layout, input_size, input_size);

            Ok(Self {
                session,
                layout,
                anchors: generate_anchors(input_size),
                settings: DecoderSettings {
                    score_threshold,
                    iou_threshold,
                    max_faces,
                    input_size,
                },
            })
        }

        /// Resize, convert to RGB and normalize to `[-1, 1]`
        fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>> {
            let side = usize_to_i32(self.settings.input_size)?;

            let mut resized = Mat::default();
            imgproc::resize(
                frame,
                &mut resized,
                Size::new(side, side),
                0.0,
                0.0,
                InterpolationFlags::INTER_LINEAR as i32,
            )?;

            let mut rgb = Mat::default();
            imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

            let mut normalized = Mat::default();
            rgb.convert_to(&mut normalized, CV_32F, 1.0 / 127.5, -1.0)?;

            let data: Vec<f32> = normalized
                .data_typed::<Vec3f>()?
                .iter()
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();

            let n = self.settings.input_size;
            let array = Array4::from_shape_vec((1, n, n, 3), data)
                .map_err(|e| Error::ModelInputError(format!("Failed to create input array: {e}")))?;

            Ok(match self.layout {
                InputLayout::Nhwc => array,
                InputLayout::Nchw => array.permuted_axes([0, 3, 1, 2]).as_standard_layout().into_owned(),
            })
        }

        /// Run the model and return (regressors, logits) as flat vectors
        fn forward(&mut self, input: Array4<f32>) -> Result<(Vec<f32>, Vec<f32>)> {
            let cow_array = CowArray::from(input.into_dyn());
            let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
            let outputs = self.session.run(vec![input_tensor])?;

            let mut regressors = None;
            let mut logits = None;

            for output in &outputs {
                let tensor = output.try_extract::<f32>()?;
                let view = tensor.view();
                let last_dim = view.shape().last().copied().unwrap_or(0);
                let values: Vec<f32> = view.iter().copied().collect();

                match last_dim {
                    BLAZEFACE_REGRESSOR_VALUES => regressors = Some(values),
                    1 => logits = Some(values),
                    other => debug!("Ignoring model output with last dimension {}", other),
                }
            }

            match (regressors, logits) {
                (Some(r), Some(l)) => Ok((r, l)),
                _ => Err(Error::ModelOutputError(
                    "Model must produce regressor and classifier outputs".to_string(),
                )),
            }
        }
    }

    impl FaceDetector for BlazeFaceDetector {
        type Frame = Mat;

        fn estimate_faces(&mut self, frame: &Mat) -> Result<Vec<BoundingBox>> {
            if frame.empty() {
                return Ok(Vec::new());
            }

            let input = self.preprocess(frame)?;
            let (regressors, logits) = self.forward(input)?;

            decode_detections(
                &regressors,
                &logits,
                &self.anchors,
                &self.settings,
                f64::from(frame.cols()),
                f64::from(frame.rows()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BLAZEFACE_NUM_ANCHORS;

    #[test]
    fn test_anchor_count() {
        let anchors = generate_anchors(BLAZEFACE_INPUT_SIZE);
        assert_eq!(anchors.len(), BLAZEFACE_NUM_ANCHORS);

        // First stride-8 cell, two anchors
        assert_eq!(anchors[0], anchors[1]);
        assert!((anchors[0].x_center - 0.5 / 16.0).abs() < 1e-6);
        // First stride-16 cell starts after 16 * 16 * 2 anchors
        assert!((anchors[512].x_center - 0.5 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_clipping() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(1e6).is_finite());
        assert!(sigmoid(-1e6) >= 0.0);
    }

    #[test]
    fn test_suppress_keeps_best() {
        let a = BoundingBox {
            top_left: Point::new(0.0, 0.0),
            bottom_right: Point::new(10.0, 10.0),
            score: 0.9,
        };
        let b = BoundingBox { score: 0.8, ..a };
        let far = BoundingBox {
            top_left: Point::new(40.0, 40.0),
            bottom_right: Point::new(50.0, 50.0),
            score: 0.7,
        };

        let kept = suppress(vec![a, b, far], 0.3, 10);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.7);

        let limited = suppress(vec![a, far], 0.3, 1);
        assert_eq!(limited.len(), 1);
    }
}
