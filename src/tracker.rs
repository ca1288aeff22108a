//! Per-frame face tracking loop.
//!
//! Each call to [`DetectionLoop::step`] reads one frame, runs inference on it
//! and hands the smoothed crown anchor to an [`OverlaySink`]. The caller
//! schedules the next step only after the previous one returned, so at most one
//! inference is ever in flight and results arrive in frame order.
//!
//! Teardown goes through a [`CancelToken`]: once cancelled, a step never
//! touches the sink again, including a step whose inference was already
//! running when the token was set.

use crate::face_detection::FaceDetector;
use crate::filters::OverlayFilter;
use crate::overlay::{AnchorPosition, CoordinateMapper, FrameSize};
use crate::Result;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for a tracking session
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Source of video frames
pub trait FrameSource {
    /// Frame type produced by the source
    type Frame;

    /// Read the next frame; `Ok(None)` when no frame is available yet
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device fails
    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;

    /// Intrinsic size of the most recent frame (zero before the first one)
    fn frame_size(&self) -> FrameSize;
}

/// Consumer of tracking results, usually the view drawing the crown
pub trait OverlaySink {
    /// Current displayed size, or `None` once the view is gone
    fn display_size(&self) -> Option<FrameSize>;

    /// Receive this frame's anchor; `None` when no face is visible
    fn apply(&mut self, anchor: Option<AnchorPosition>);
}

/// Result of a single loop step
#[derive(Debug)]
pub enum LoopStep<F> {
    /// Schedule the next step; carries the frame that was processed, if any
    Continue(Option<F>),
    /// The loop was cancelled or its sink is gone; do not schedule again
    Stopped,
}

enum ModelSlot<D, L> {
    Pending(L),
    Ready(D),
    Unavailable,
}

/// Face tracking loop: frame source, lazily loaded detector, mapper and smoother
pub struct DetectionLoop<S, D, L> {
    source: S,
    model: ModelSlot<D, L>,
    filter: Box<dyn OverlayFilter>,
    mirror: bool,
    cancel: CancelToken,
    frames: u64,
}

impl<S, D, L> DetectionLoop<S, D, L>
where
    S: FrameSource,
    D: FaceDetector<Frame = S::Frame>,
    L: FnOnce() -> Result<D>,
{
    /// Create a loop. The detector is built by `load_model` once the first
    /// frame has arrived.
    pub fn new(source: S, load_model: L, filter: Box<dyn OverlayFilter>, mirror: bool, cancel: CancelToken) -> Self {
        debug!("Tracking with {} (mirror: {})", filter.name(), mirror);
        Self {
            source,
            model: ModelSlot::Pending(load_model),
            filter,
            mirror,
            cancel,
            frames: 0,
        }
    }

    /// Number of frames processed so far
    #[must_use]
    pub const fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Current smoothing estimate
    #[must_use]
    pub fn smoothed(&self) -> Option<AnchorPosition> {
        self.filter.current()
    }

    /// Whether the detector has been loaded successfully
    #[must_use]
    pub const fn model_ready(&self) -> bool {
        matches!(self.model, ModelSlot::Ready(_))
    }

    /// Consume the loop and return its frame source
    pub fn into_source(self) -> S {
        self.source
    }

    /// Run one frame of tracking
    pub fn step<K: OverlaySink>(&mut self, sink: &mut K) -> LoopStep<S::Frame> {
        if self.cancel.is_cancelled() || sink.display_size().is_none() {
            return LoopStep::Stopped;
        }

        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return LoopStep::Continue(None),
            Err(e) => {
                warn!("Failed to read frame: {}", e);
                return LoopStep::Continue(None);
            }
        };
        self.frames += 1;

        self.ensure_model();

        let detections = match &mut self.model {
            ModelSlot::Ready(detector) => match detector.estimate_faces(&frame) {
                Ok(faces) => faces,
                Err(e) => {
                    warn!("Face detection error: {}", e);
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        // The view may have been torn down while inference was running
        let Some(display) = sink.display_size() else {
            debug!("Overlay target gone, discarding detection result");
            return LoopStep::Stopped;
        };
        if self.cancel.is_cancelled() {
            debug!("Loop cancelled during inference, discarding detection result");
            return LoopStep::Stopped;
        }

        let Some(face) = detections.first() else {
            self.filter.reset();
            sink.apply(None);
            return LoopStep::Continue(Some(frame));
        };

        match CoordinateMapper::new(self.source.frame_size(), display, self.mirror) {
            Ok(mapper) => {
                let smoothed = self.filter.apply(mapper.map(face));
                sink.apply(Some(smoothed));
            }
            // Video or view not laid out yet
            Err(e) => debug!("Skipping frame: {}", e),
        }

        LoopStep::Continue(Some(frame))
    }

    fn ensure_model(&mut self) {
        if !matches!(self.model, ModelSlot::Pending(_)) {
            return;
        }

        let ModelSlot::Pending(load) = std::mem::replace(&mut self.model, ModelSlot::Unavailable) else {
            return;
        };

        info!("Loading face model...");
        match load() {
            Ok(detector) => {
                info!("Face model loaded");
                self.model = ModelSlot::Ready(detector);
            }
            Err(e) => {
                error!("Failed to load face model, crown tracking disabled: {}", e);
            }
        }
    }
}
