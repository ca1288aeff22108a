//! Royal reading quest: a reading reward game for young readers.
//!
//! Each reading session the reader picks a mood and a castle, then catches a
//! butterfly in a webcam mini-game to earn a token on a five-step path. A crown
//! follows the reader's head in the mini-game:
//!
//! 1. Frames come from a camera (or a recorded video)
//! 2. A BlazeFace model running on ONNX Runtime finds the face
//! 3. The box is mapped from video pixels to the mirrored, cover-fitted display
//! 4. An exponential filter smooths the crown anchor between frames
//!
//! Tokens, badges, journal entries and the helper chat are kept in a JSON
//! state file. Encouraging messages come from a hosted text generation API.
//!
//! The `vision` feature (on by default) enables the `OpenCV` capture, the
//! ONNX detector and the mini-game window.
//!
//! # Examples
//!
//! ## Mapping a face box
//!
//! ```
//! use royal_reading_quest::face_detection::{BoundingBox, Point};
//! use royal_reading_quest::overlay::{CoordinateMapper, FrameSize};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mapper = CoordinateMapper::new(
//!     FrameSize::new(640.0, 480.0),
//!     FrameSize::new(320.0, 240.0),
//!     true,
//! )?;
//!
//! let face = BoundingBox::from_corners(Point::new(100.0, 100.0), Point::new(300.0, 300.0));
//! let anchor = mapper.map(&face);
//! assert_eq!((anchor.x, anchor.y, anchor.width), (220.0, 50.0, 100.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Smoothing the crown
//!
//! ```
//! use royal_reading_quest::filters::create_filter;
//! use royal_reading_quest::overlay::AnchorPosition;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("exponential")?;
//!
//! let first = filter.apply(AnchorPosition { x: 100.0, y: 50.0, width: 80.0 });
//! assert_eq!(first.x, 100.0);
//!
//! let second = filter.apply(AnchorPosition { x: 200.0, y: 50.0, width: 80.0 });
//! assert_eq!(second.x, 125.0);
//!
//! // No face this frame
//! filter.reset();
//! # Ok(())
//! # }
//! ```
//!
//! ## Earning a token
//!
//! ```no_run
//! use royal_reading_quest::quest::{CastleType, Mood};
//! use royal_reading_quest::state::StateStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = StateStore::open("royal_quest_state.json")?;
//! store.update(|s| s.complete_setup(Mood::Happy, CastleType::Crystal))?;
//!
//! let award = store.update(|s| s.award_token(chrono::Utc::now()))?;
//! println!("{} tokens, now at {}", award.tokens, store.state().current_step());
//! # Ok(())
//! # }
//! ```

/// Face detection adapter and BlazeFace decoding
pub mod face_detection;

/// Mapping from video pixels to display space and crown placement
pub mod overlay;

/// Temporal smoothing of the crown anchor
pub mod filters;

/// Per-frame face tracking loop
pub mod tracker;

/// Butterfly catching mini-game model
pub mod game;

/// Quest progression, badges and journal
pub mod quest;

/// Persistent quest state
pub mod state;

/// Generated encouragement and helper chat
pub mod gentext;

/// Numeric conversions for drawing
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

/// Camera and video capture
#[cfg(feature = "vision")]
pub mod capture;

/// Mini-game window
#[cfg(feature = "vision")]
pub mod app;

pub use error::{Error, Result};
