//! Tests for crown anchor smoothing


use royal_reading_quest::{
    config::Config,
    filters::{
        create_filter,
        exponential::{smooth, ExponentialFilter},
        OverlayFilter,
    },
    overlay::AnchorPosition,
};
use test_helpers::assert_close;

fn anchor(x: f64, y: f64, width: f64) -> AnchorPosition {
    AnchorPosition { x, y, width }
}

#[test]
fn test_smoothing_is_idempotent() {
    for factor in [0.1, 0.25, 0.5, 1.0] {
        for value in [0.0, 1.0 / 3.0, 217.123_456, 1e6] {
            let a = anchor(value, value * 0.5, value + 1.0);
            assert_eq!(smooth(Some(a), a, factor), a);
        }
    }
}

#[test]
fn test_converges_geometrically() {
    let factor = 0.25;
    let target = anchor(300.0, 120.0, 90.0);
    let mut filter = ExponentialFilter::try_new(factor).unwrap();

    filter.apply(anchor(100.0, 20.0, 50.0));
    let mut error = 200.0;
    for _ in 0..20 {
        let next = filter.apply(target);
        let next_error = target.x - next.x;
        assert!(next_error >= 0.0, "overshoot");
        assert!(next_error < error);
        assert_close(next_error, error * (1.0 - factor), 1e-9);
        error = next_error;
    }
}

#[test]
fn test_default_factor_matches_config() {
    let filter = ExponentialFilter::default();
    assert_eq!(filter.factor(), Config::default().tracker.smoothing_factor);
}

#[test]
fn test_reset_passes_next_target_through() {
    let mut filter = ExponentialFilter::default();
    filter.apply(anchor(10.0, 10.0, 10.0));
    filter.apply(anchor(50.0, 50.0, 50.0));
    filter.reset();
    assert_eq!(filter.current(), None);

    let fresh = anchor(400.0, 30.0, 120.0);
    assert_eq!(filter.apply(fresh), fresh);
}

#[test]
fn test_factor_one_follows_target() {
    let mut filter = ExponentialFilter::try_new(1.0).unwrap();
    filter.apply(anchor(0.0, 0.0, 0.0));
    let target = anchor(42.0, 17.0, 99.0);
    assert_eq!(filter.apply(target), target);
}

#[test]
fn test_invalid_factors_rejected() {
    for factor in [0.0, -0.1, 1.01, f64::NAN] {
        assert!(ExponentialFilter::try_new(factor).is_err(), "factor {factor} accepted");
    }
}

#[test]
fn test_filter_registry() {
    assert_eq!(create_filter("exponential").unwrap().name(), "ExponentialFilter");
    assert_eq!(create_filter("Exponential:0.5").unwrap().name(), "ExponentialFilter");
    assert!(create_filter("lowpass:0.5").is_err());
    assert_eq!(create_filter("none").unwrap().name(), "NoFilter");
    assert!(create_filter("kalman").is_err());
}
