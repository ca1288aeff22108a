//! Configuration management for the royal reading quest

use crate::constants::{
    DEFAULT_CATCH_ANIMATION_MS, DEFAULT_INITIAL_BUTTERFLIES, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_BUTTERFLIES,
    DEFAULT_MAX_FACES, DEFAULT_MOVE_INTERVAL_MS, DEFAULT_SCORE_THRESHOLD, DEFAULT_SMOOTHING_FACTOR,
    DEFAULT_SPAWN_INTERVAL_MS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera configuration
    pub camera: CameraConfig,

    /// Mini-game window configuration
    pub display: DisplayConfig,

    /// Face detection configuration
    pub face_detection: FaceDetectionConfig,

    /// Crown tracking configuration
    pub tracker: TrackerConfig,

    /// Butterfly game configuration
    pub game: GameConfig,

    /// Text generation service configuration
    pub gentext: GenTextConfig,

    /// Quest state storage
    pub storage: StorageConfig,
}

/// Camera source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera index
    pub index: i32,

    /// Replay a video file instead of opening the camera
    pub video_file: Option<PathBuf>,
}

/// Mini-game window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Target framerate
    pub target_fps: u32,

    /// Window width
    pub window_width: i32,

    /// Window height
    pub window_height: i32,

    /// Show the video mirrored like a selfie camera
    pub mirror: bool,
}

/// Face detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionConfig {
    /// Path to the BlazeFace ONNX model
    pub model: PathBuf,

    /// Minimum detection score (0.0-1.0)
    pub score_threshold: f32,

    /// IOU threshold for non-maximum suppression (0.0-1.0)
    pub iou_threshold: f32,

    /// Maximum number of faces to report
    pub max_faces: usize,
}

/// Crown tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Filter name (`exponential` or `none`)
    pub filter: String,

    /// Smoothing factor in (0, 1]; lower is smoother but laggier
    pub smoothing_factor: f64,
}

/// Butterfly game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Butterflies at start
    pub initial_butterflies: usize,

    /// Maximum butterflies on screen
    pub max_butterflies: usize,

    /// Milliseconds between flight moves
    pub move_interval_ms: u64,

    /// Milliseconds between spawns
    pub spawn_interval_ms: u64,

    /// Milliseconds of catch animation before the success screen
    pub catch_animation_ms: u64,

    /// Tap radius around a butterfly, percent of the display width
    pub tap_radius: f64,
}

/// Text generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenTextConfig {
    /// API base URL
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Name used in prompts and fallback messages
    pub child_name: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Quest state storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding the quest record
    pub state_file: PathBuf,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            video_file: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            window_width: 960,
            window_height: 720,
            mirror: true,
        }
    }
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/blazeface.onnx"),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_faces: DEFAULT_MAX_FACES,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            filter: "exponential".to_string(),
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_butterflies: DEFAULT_INITIAL_BUTTERFLIES,
            max_butterflies: DEFAULT_MAX_BUTTERFLIES,
            move_interval_ms: DEFAULT_MOVE_INTERVAL_MS,
            spawn_interval_ms: DEFAULT_SPAWN_INTERVAL_MS,
            catch_animation_ms: DEFAULT_CATCH_ANIMATION_MS,
            tap_radius: 6.0,
        }
    }
}

impl Default for GenTextConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "API_KEY".to_string(),
            child_name: "Celine".to_string(),
            timeout_secs: 20,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("royal_quest_state.json"),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the crown smoothing filter from configuration
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown filter or invalid factor
    pub fn create_filter(&self) -> Result<Box<dyn crate::filters::OverlayFilter>> {
        use crate::filters::{create_filter, exponential::ExponentialFilter};

        let name = self.tracker.filter.trim().to_lowercase();
        match name.as_str() {
            "exponential" => Ok(Box::new(ExponentialFilter::try_new(self.tracker.smoothing_factor)?)),
            other => create_filter(other),
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.face_detection.score_threshold) {
            return Err(Error::ConfigError(
                "Score threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.face_detection.iou_threshold) {
            return Err(Error::ConfigError(
                "IOU threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.face_detection.max_faces == 0 {
            return Err(Error::ConfigError("Max faces must be greater than 0".to_string()));
        }

        if !(self.tracker.smoothing_factor > 0.0 && self.tracker.smoothing_factor <= 1.0) {
            return Err(Error::ConfigError(
                "Smoothing factor must be in (0.0, 1.0]".to_string(),
            ));
        }

        if self.display.target_fps == 0 {
            return Err(Error::ConfigError("Target FPS must be greater than 0".to_string()));
        }
        if self.display.window_width <= 0 || self.display.window_height <= 0 {
            return Err(Error::ConfigError("Window size must be positive".to_string()));
        }

        if self.game.max_butterflies < self.game.initial_butterflies {
            return Err(Error::ConfigError(
                "Max butterflies must be at least the initial count".to_string(),
            ));
        }
        if self.game.tap_radius <= 0.0 {
            return Err(Error::ConfigError("Tap radius must be positive".to_string()));
        }

        if self.gentext.model.trim().is_empty() {
            return Err(Error::ConfigError("Text generation model must be set".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Royal Reading Quest Configuration

# Camera source
camera:
  index: 0
  # video_file: "recording.mp4"

# Mini-game window
display:
  target_fps: 30
  window_width: 960
  window_height: 720
  mirror: true

# Face detection
face_detection:
  model: "assets/blazeface.onnx"
  score_threshold: 0.75
  iou_threshold: 0.3
  max_faces: 10

# Crown tracking
tracker:
  filter: "exponential"
  smoothing_factor: 0.25

# Butterfly game
game:
  initial_butterflies: 5
  max_butterflies: 12
  move_interval_ms: 2500
  spawn_interval_ms: 3000
  catch_animation_ms: 800
  tap_radius: 6.0

# Text generation
gentext:
  endpoint: "https://generativelanguage.googleapis.com"
  model: "gemini-2.5-flash"
  api_key_env: "API_KEY"
  child_name: "Celine"
  timeout_secs: 20

# Quest state
storage:
  state_file: "royal_quest_state.json"
"#;
