//! Tests for BlazeFace model loading and inference
#![cfg(feature = "vision")]

use opencv::core::{Mat, Scalar, CV_8UC3};
use royal_reading_quest::{
    config::Config,
    face_detection::{blazeface::BlazeFaceDetector, FaceDetector},
    Result,
};
use std::path::Path;

fn load_detector() -> Result<BlazeFaceDetector> {
    let config = Config::default().face_detection;
    assert!(config.model.exists(), "Face model not found at {}", config.model.display());
    BlazeFaceDetector::new(&config.model, config.score_threshold, config.iou_threshold, config.max_faces)
}

#[test]
#[ignore = "Requires ONNX model"]
fn test_load_face_model() -> Result<()> {
    let _detector = load_detector()?;
    Ok(())
}

#[test]
#[ignore = "Requires ONNX model"]
fn test_blank_frame_has_no_face() -> Result<()> {
    let mut detector = load_detector()?;

    let frame = Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::new(128.0, 128.0, 128.0, 0.0))?;
    let faces = detector.estimate_faces(&frame)?;
    assert!(faces.is_empty());

    Ok(())
}

#[test]
#[ignore = "Requires ONNX model"]
fn test_empty_frame_is_skipped() -> Result<()> {
    let mut detector = load_detector()?;
    assert!(detector.estimate_faces(&Mat::default())?.is_empty());
    Ok(())
}

#[test]
#[ignore = "Requires ONNX model and test image"]
fn test_detects_face_in_image() -> Result<()> {
    let image_path = "assets/face.jpg";
    assert!(Path::new(image_path).exists(), "Test image not found");

    let mut detector = load_detector()?;
    let image = opencv::imgcodecs::imread(image_path, opencv::imgcodecs::IMREAD_COLOR)?;
    let faces = detector.estimate_faces(&image)?;

    assert!(!faces.is_empty(), "No face detected");
    let face = faces[0];
    assert!(face.width() > 0.0 && face.height() > 0.0);
    assert!(face.score >= 0.75);

    Ok(())
}

#[test]
fn test_missing_model_is_an_error() {
    assert!(BlazeFaceDetector::new("assets/does_not_exist.onnx", 0.75, 0.3, 10).is_err());
}
