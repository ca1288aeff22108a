//! Numeric conversions between layout coordinates and pixel indices

use crate::{Error, Result};

/// Safely convert usize to i32 with overflow checking
///
/// # Errors
///
/// Returns an error if the value exceeds i32::MAX
pub fn usize_to_i32(value: usize) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Safely convert f64 to i32 with bounds checking
///
/// # Errors
///
/// Returns an error if the value is not finite or outside i32 range
#[allow(clippy::cast_possible_truncation)] // Truncation after bounds check is safe
pub fn f64_to_i32(value: f64) -> Result<i32> {
    if value.is_finite() && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        Ok(value.round() as i32)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be safely converted to i32"
        )))
    }
}

/// Round and clamp a layout coordinate to a pixel index in `min..=max`
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_px_clamp(value: f64, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.round().clamp(f64::from(min), f64::from(max));
    (clamped as i32).clamp(min, max)
}

/// Convert a percentage of `extent` to a pixel coordinate
#[must_use]
pub fn percent_to_px(percent: f64, extent: i32) -> i32 {
    f64_to_px_clamp(percent / 100.0 * f64::from(extent), i32::MIN, i32::MAX)
}

/// Convert a pixel coordinate to a percentage of `extent`
#[must_use]
pub fn px_to_percent(px: i32, extent: i32) -> f64 {
    if extent == 0 {
        return 0.0;
    }
    f64::from(px) / f64::from(extent) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usize_to_i32() {
        assert_eq!(usize_to_i32(128).unwrap(), 128);
        assert!(usize_to_i32(usize::MAX).is_err());
    }

    #[test]
    fn test_f64_to_i32() {
        assert_eq!(f64_to_i32(12.6).unwrap(), 13);
        assert!(f64_to_i32(f64::NAN).is_err());
        assert!(f64_to_i32(1e12).is_err());
    }

    #[test]
    fn test_px_clamp() {
        assert_eq!(f64_to_px_clamp(-5.0, 0, 100), 0);
        assert_eq!(f64_to_px_clamp(150.4, 0, 100), 100);
        assert_eq!(f64_to_px_clamp(f64::INFINITY, 0, 100), 0);
        assert_eq!(f64_to_px_clamp(42.4, 100, 0), 42);
    }

    #[test]
    fn test_percent_round_trip() {
        assert_eq!(percent_to_px(50.0, 960), 480);
        assert!((px_to_percent(480, 960) - 50.0).abs() < 1e-9);
        assert_eq!(px_to_percent(10, 0), 0.0);
    }
}
