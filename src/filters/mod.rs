//! Temporal smoothing of overlay anchors.
//!
//! Detector boxes jitter by a few pixels from frame to frame; the filters here
//! damp that jitter before the crown is drawn.

/// Exponential (one-pole) smoothing filter
pub mod exponential;

use crate::overlay::AnchorPosition;
use crate::Result;

/// Trait for all overlay filters
pub trait OverlayFilter: Send + Sync {
    /// Feed a new target and return the smoothed anchor
    fn apply(&mut self, target: AnchorPosition) -> AnchorPosition;

    /// Forget the running estimate; the next target passes through unchanged
    fn reset(&mut self);

    /// Current running estimate, if any
    fn current(&self) -> Option<AnchorPosition>;

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes targets through unchanged
#[derive(Default)]
pub struct NoFilter {
    last: Option<AnchorPosition>,
}

impl OverlayFilter for NoFilter {
    fn apply(&mut self, target: AnchorPosition) -> AnchorPosition {
        self.last = Some(target);
        target
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn current(&self) -> Option<AnchorPosition> {
        self.last
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create an overlay filter by type name.
///
/// `exponential` accepts an optional factor suffix, e.g. `exponential:0.4`.
///
/// # Errors
///
/// Returns an error for unknown names or an out-of-range factor
pub fn create_filter(filter_type: &str) -> Result<Box<dyn OverlayFilter>> {
    let lowered = filter_type.to_lowercase();
    let (name, param) = match lowered.split_once(':') {
        Some((name, param)) => (name, Some(param)),
        None => (lowered.as_str(), None),
    };

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter::default())),
        "exponential" => {
            let factor = match param {
                Some(raw) => raw
                    .parse::<f64>()
                    .map_err(|_| crate::Error::InvalidInput(format!("Invalid smoothing factor: {raw}")))?,
                None => crate::constants::DEFAULT_SMOOTHING_FACTOR,
            };
            Ok(Box::new(exponential::ExponentialFilter::try_new(factor)?))
        }
        _ => Err(crate::Error::InvalidInput(format!("Unknown filter type: {filter_type}"))),
    }
}
