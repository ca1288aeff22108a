//! Camera and video file frame source backed by `OpenCV`.

use crate::overlay::FrameSize;
use crate::tracker::FrameSource;
use crate::{Error, Result};
use log::{debug, info, warn};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_POS_FRAMES},
};
use std::path::PathBuf;

/// Where frames come from
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path, replayed in a loop
    File(PathBuf),
}

/// An open capture device
pub struct CameraStream {
    capture: VideoCapture,
    source: VideoSource,
    size: FrameSize,
}

impl CameraStream {
    /// Open a camera or video file
    ///
    /// # Errors
    ///
    /// Returns [`Error::CameraPermission`] if the camera cannot be opened and
    /// [`Error::InvalidInput`] for an unreadable video file
    pub fn open(source: &VideoSource) -> Result<Self> {
        let capture = match source {
            VideoSource::Camera(index) => {
                info!("Opening camera {}", index);
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;
                if !cap.is_opened()? {
                    return Err(Error::CameraPermission(format!(
                        "camera {index} could not be opened"
                    )));
                }

                // Reduce buffer size for lower latency
                if let Err(e) = cap.set(CAP_PROP_BUFFERSIZE, 1.0) {
                    debug!("Could not set camera buffer size: {}", e);
                }
                cap
            }
            VideoSource::File(path) => {
                info!("Opening video file: {}", path.display());
                let path_str = path
                    .to_str()
                    .ok_or_else(|| Error::InvalidInput(format!("Invalid video path: {}", path.display())))?;
                let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)?;
                if !cap.is_opened()? {
                    return Err(Error::InvalidInput(format!(
                        "Cannot open video file: {}",
                        path.display()
                    )));
                }
                cap
            }
        };

        Ok(Self {
            capture,
            source: source.clone(),
            size: FrameSize::new(0.0, 0.0),
        })
    }
}

impl FrameSource for CameraStream {
    type Frame = Mat;

    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            if matches!(self.source, VideoSource::File(_)) {
                debug!("End of video file reached, rewinding");
                self.capture.set(CAP_PROP_POS_FRAMES, 0.0)?;
            }
            return Ok(None);
        }

        self.size = FrameSize::new(f64::from(frame.cols()), f64::from(frame.rows()));
        Ok(Some(frame))
    }

    fn frame_size(&self) -> FrameSize {
        self.size
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release capture device: {}", e);
        } else {
            debug!("Capture device released");
        }
    }
}
