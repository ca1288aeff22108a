//! Tests for mapping face boxes onto the mirrored, cover-fitted display


use royal_reading_quest::overlay::{CoordinateMapper, CrownPlacement, FrameSize};
use test_helpers::{assert_close, face_box};

fn mapper(vw: f64, vh: f64, dw: f64, dh: f64) -> CoordinateMapper {
    CoordinateMapper::new(FrameSize::new(vw, vh), FrameSize::new(dw, dh), true).unwrap()
}

#[test]
fn test_reference_example() {
    let m = mapper(640.0, 480.0, 320.0, 240.0);
    let anchor = m.map(&face_box(100.0, 100.0, 300.0, 300.0));

    assert_eq!(m.scale(), 0.5);
    assert_eq!(m.offset(), (0.0, 0.0));
    assert_eq!(anchor.x, 220.0);
    assert_eq!(anchor.y, 50.0);
    assert_eq!(anchor.width, 100.0);
}

#[test]
fn test_width_scales_linearly() {
    let m = mapper(1280.0, 720.0, 800.0, 800.0);
    let scale = m.scale();

    for width in [10.0, 55.5, 200.0, 640.0] {
        let anchor = m.map(&face_box(100.0, 50.0, 100.0 + width, 250.0));
        assert_close(anchor.width, width * scale, 1e-9);
    }
}

#[test]
fn test_midline_box_stays_on_midline() {
    let video = FrameSize::new(640.0, 480.0);
    let m = mapper(video.width, video.height, 1000.0, 600.0);

    let centered = face_box(270.0, 100.0, 370.0, 200.0);
    let mirrored = m.map(&centered);
    let unmirrored = CoordinateMapper::new(video, FrameSize::new(1000.0, 600.0), false)
        .unwrap()
        .map(&centered);

    assert_close(mirrored.x, unmirrored.x, 1e-9);
    assert_close(mirrored.x, 500.0, 1e-9);
}

#[test]
fn test_cover_crops_wider_video() {
    // 16:9 video in a 4:3 display: height fills, sides are cropped
    let m = mapper(1920.0, 1080.0, 640.0, 480.0);
    assert_close(m.scale(), 480.0 / 1080.0, 1e-12);

    let (ox, oy) = m.offset();
    assert!(ox < 0.0);
    assert_close(oy, 0.0, 1e-12);

    let (_, _, w, h) = m.visible_region();
    assert_close(w, 640.0, 1e-9);
    assert_close(h, 480.0, 1e-9);
}

#[test]
fn test_cover_crops_taller_video() {
    let m = mapper(480.0, 640.0, 800.0, 600.0);
    let (ox, oy) = m.offset();
    assert_close(ox, 0.0, 1e-12);
    assert!(oy < 0.0);
    assert_close(m.scaled_video().width, 800.0, 1e-9);
}

#[test]
fn test_mirroring_flips_sides() {
    let m = mapper(640.0, 480.0, 640.0, 480.0);
    let left_in_frame = m.map(&face_box(0.0, 0.0, 100.0, 100.0));
    assert_close(left_in_frame.x, 590.0, 1e-9);
}

#[test]
fn test_unstarted_video_is_rejected() {
    assert!(CoordinateMapper::new(FrameSize::new(0.0, 0.0), FrameSize::new(320.0, 240.0), true).is_err());
    assert!(CoordinateMapper::new(FrameSize::new(640.0, 480.0), FrameSize::new(0.0, 240.0), true).is_err());
    assert!(CoordinateMapper::new(FrameSize::new(f64::NAN, 480.0), FrameSize::new(320.0, 240.0), true).is_err());
}

#[test]
fn test_crown_sits_above_anchor() {
    let anchor = mapper(640.0, 480.0, 320.0, 240.0).map(&face_box(100.0, 100.0, 300.0, 300.0));
    let crown = CrownPlacement::from_anchor(&anchor);

    assert_close(crown.width, 110.0, 1e-9);
    assert_close(crown.left + crown.width / 2.0, anchor.x, 1e-9);
    assert!(crown.top < anchor.y);
    assert!(crown.top + crown.height > anchor.y);
}
