//! Constants used throughout the application

/// Tokens needed to reach the castle
pub const MAX_TOKENS: u32 = 5;

/// Stations on the path, one per token
pub const STEPS: [&str; 5] = [
    "Butterfly Garden",
    "Magic Forest",
    "Crystal Bridge",
    "Royal Gate",
    "The Royal Castle",
];

/// Default smoothing factor for the crown anchor (time constant of about 4 frames)
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.25;

/// Crown width relative to the detected face width
pub const CROWN_WIDTH_SCALE: f64 = 1.1;

/// Crown height relative to its width
pub const CROWN_ASPECT: f64 = 0.6;

/// Fraction of the crown height that sits above the anchor point
pub const CROWN_LIFT: f64 = 0.8;

/// BlazeFace front model input resolution
pub const BLAZEFACE_INPUT_SIZE: usize = 128;

/// Number of SSD anchors of the BlazeFace front model
pub const BLAZEFACE_NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output (box + 6 keypoints)
pub const BLAZEFACE_REGRESSOR_VALUES: usize = 16;

/// Feature map strides of the BlazeFace front model, one entry per layer
pub const BLAZEFACE_STRIDES: [usize; 4] = [8, 16, 16, 16];

/// Logits are clipped to this magnitude before the sigmoid
pub const BLAZEFACE_SCORE_CLIP: f32 = 100.0;

/// Default detector thresholds
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.75;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;
pub const DEFAULT_MAX_FACES: usize = 10;

/// Butterfly game defaults
pub const DEFAULT_INITIAL_BUTTERFLIES: usize = 5;
pub const DEFAULT_MAX_BUTTERFLIES: usize = 12;
pub const DEFAULT_MOVE_INTERVAL_MS: u64 = 2500;
pub const DEFAULT_SPAWN_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_CATCH_ANIMATION_MS: u64 = 800;

/// Total tokens for the bookworm badge
pub const BOOKWORM_TOKENS: u32 = 20;
