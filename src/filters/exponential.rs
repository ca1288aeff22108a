use super::OverlayFilter;
use crate::constants::DEFAULT_SMOOTHING_FACTOR;
use crate::overlay::AnchorPosition;
use crate::{Error, Result};

/// Blend one field toward its target.
///
/// Written as `prev + k * (target - prev)` so a target equal to `prev` returns
/// `prev` exactly.
fn blend(prev: f64, target: f64, factor: f64) -> f64 {
    factor.mul_add(target - prev, prev)
}

/// One smoothing step: `prev * (1 - k) + target * k` per field, or the target
/// itself when there is no previous estimate
#[must_use]
pub fn smooth(prev: Option<AnchorPosition>, target: AnchorPosition, factor: f64) -> AnchorPosition {
    match prev {
        Some(prev) => AnchorPosition {
            x: blend(prev.x, target.x, factor),
            y: blend(prev.y, target.y, factor),
            width: blend(prev.width, target.width, factor),
        },
        None => target,
    }
}

/// Exponential smoothing filter over overlay anchors
pub struct ExponentialFilter {
    factor: f64,
    last: Option<AnchorPosition>,
}

impl ExponentialFilter {
    /// Create a filter with smoothing factor `factor` in `(0, 1]`
    ///
    /// # Errors
    ///
    /// Returns an error if the factor is outside `(0, 1]`
    pub fn try_new(factor: f64) -> Result<Self> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(Error::InvalidInput(format!(
                "Smoothing factor must be in (0, 1], got {factor}"
            )));
        }
        Ok(Self { factor, last: None })
    }

    /// Smoothing factor
    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for ExponentialFilter {
    fn default() -> Self {
        Self {
            factor: DEFAULT_SMOOTHING_FACTOR,
            last: None,
        }
    }
}

impl OverlayFilter for ExponentialFilter {
    fn apply(&mut self, target: AnchorPosition) -> AnchorPosition {
        let next = smooth(self.last, target, self.factor);
        self.last = Some(next);
        next
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn current(&self) -> Option<AnchorPosition> {
        self.last
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
