//! Butterfly catching mini-game model.
//!
//! Positions are percentages of the display so the model is independent of the
//! window size. Time is advanced explicitly by the caller.

use crate::config::GameConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Wing colour of a butterfly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButterflyVariant {
    /// Purple wings
    Purple,
    /// Blue wings
    Blue,
    /// Orange wings
    Orange,
    /// Green wings
    Green,
    /// Pink wings
    Pink,
    /// Gold wings
    Gold,
}

impl ButterflyVariant {
    /// All variants
    pub const ALL: [Self; 6] = [
        Self::Purple,
        Self::Blue,
        Self::Orange,
        Self::Green,
        Self::Pink,
        Self::Gold,
    ];

    fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for ButterflyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Purple => "purple",
            Self::Blue => "blue",
            Self::Orange => "orange",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Gold => "gold",
        };
        f.write_str(name)
    }
}

/// A butterfly on screen
#[derive(Debug, Clone, PartialEq)]
pub struct Butterfly {
    /// Unique id within a game
    pub id: u64,
    /// Horizontal position, percent of display width
    pub x: f64,
    /// Vertical position, percent of display height
    pub y: f64,
    /// Size multiplier
    pub scale: f64,
    /// Tilt in degrees
    pub rotation: f64,
    /// Seconds per wing flap
    pub flap_speed: f64,
    /// Set once tapped
    pub caught: bool,
    /// Wing colour
    pub variant: ButterflyVariant,
}

/// Timing and population settings
#[derive(Debug, Clone, Copy)]
pub struct GameSettings {
    /// Butterflies present when the game starts
    pub initial_butterflies: usize,
    /// Spawning stops at this many butterflies
    pub max_butterflies: usize,
    /// Interval between flight moves
    pub move_interval: Duration,
    /// Interval between spawns
    pub spawn_interval: Duration,
    /// Delay between the tap and the success screen
    pub catch_animation: Duration,
}

impl From<&GameConfig> for GameSettings {
    fn from(config: &GameConfig) -> Self {
        Self {
            initial_butterflies: config.initial_butterflies,
            max_butterflies: config.max_butterflies,
            move_interval: Duration::from_millis(config.move_interval_ms),
            spawn_interval: Duration::from_millis(config.spawn_interval_ms),
            catch_animation: Duration::from_millis(config.catch_animation_ms),
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::from(&GameConfig::default())
    }
}

/// State of one mini-game round
pub struct ButterflyGame {
    settings: GameSettings,
    butterflies: Vec<Butterfly>,
    next_id: u64,
    since_move: Duration,
    since_spawn: Duration,
    since_catch: Option<Duration>,
    ended: bool,
}

impl ButterflyGame {
    /// Start a round with the initial flock
    pub fn new<R: Rng>(settings: GameSettings, rng: &mut R) -> Self {
        let mut game = Self {
            settings,
            butterflies: Vec::with_capacity(settings.max_butterflies),
            next_id: 0,
            since_move: Duration::ZERO,
            since_spawn: Duration::ZERO,
            since_catch: None,
            ended: false,
        };

        for _ in 0..settings.initial_butterflies {
            let butterfly = Butterfly {
                id: game.take_id(),
                x: rng.gen_range(10.0..90.0),
                y: rng.gen_range(10.0..90.0),
                scale: rng.gen_range(0.6..1.0),
                rotation: rng.gen_range(-20.0..20.0),
                flap_speed: rng.gen_range(0.15..0.45),
                caught: false,
                variant: ButterflyVariant::random(rng),
            };
            game.butterflies.push(butterfly);
        }

        game
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Butterflies currently on screen
    #[must_use]
    pub fn butterflies(&self) -> &[Butterfly] {
        &self.butterflies
    }

    /// The butterfly that was caught, if any
    #[must_use]
    pub fn caught_butterfly(&self) -> Option<&Butterfly> {
        self.butterflies.iter().find(|b| b.caught)
    }

    /// Whether the catch animation has finished
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    /// Advance game time. Flight and spawning stop once the round has ended.
    pub fn advance<R: Rng>(&mut self, elapsed: Duration, rng: &mut R) {
        if self.ended {
            return;
        }

        if let Some(since_catch) = self.since_catch.as_mut() {
            *since_catch += elapsed;
            if *since_catch >= self.settings.catch_animation {
                self.ended = true;
                return;
            }
        }

        self.since_move += elapsed;
        while !self.settings.move_interval.is_zero() && self.since_move >= self.settings.move_interval {
            self.since_move -= self.settings.move_interval;
            self.fly(rng);
        }

        self.since_spawn += elapsed;
        while !self.settings.spawn_interval.is_zero() && self.since_spawn >= self.settings.spawn_interval {
            self.since_spawn -= self.settings.spawn_interval;
            self.spawn(rng);
        }
    }

    fn fly<R: Rng>(&mut self, rng: &mut R) {
        for butterfly in self.butterflies.iter_mut().filter(|b| !b.caught) {
            let dx = (rng.gen::<f64>() - 0.5) * 30.0;
            let dy = (rng.gen::<f64>() - 0.5) * 30.0;
            butterfly.x = (butterfly.x + dx).clamp(5.0, 90.0);
            butterfly.y = (butterfly.y + dy).clamp(5.0, 90.0);
            butterfly.rotation = rng.gen_range(-30.0..30.0);
        }
    }

    fn spawn<R: Rng>(&mut self, rng: &mut R) {
        if self.butterflies.len() >= self.settings.max_butterflies {
            return;
        }
        let butterfly = Butterfly {
            id: self.take_id(),
            x: rng.gen_range(5.0..95.0),
            // Enters from below the bottom edge
            y: 110.0,
            scale: rng.gen_range(0.6..1.0),
            rotation: 0.0,
            flap_speed: rng.gen_range(0.15..0.45),
            caught: false,
            variant: ButterflyVariant::random(rng),
        };
        self.butterflies.push(butterfly);
    }

    /// Nearest uncaught butterfly within `radius` percent of `(x, y)`, scaled by its size
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64, radius: f64) -> Option<u64> {
        self.butterflies
            .iter()
            .filter(|b| !b.caught)
            .map(|b| (b.id, (b.x - x).hypot(b.y - y), radius * b.scale))
            .filter(|(_, distance, reach)| distance <= reach)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _, _)| id)
    }

    /// Catch a butterfly by id. Only the first catch of a round counts.
    pub fn catch(&mut self, id: u64) -> bool {
        if self.ended || self.since_catch.is_some() {
            return false;
        }
        match self.butterflies.iter_mut().find(|b| b.id == id && !b.caught) {
            Some(butterfly) => {
                butterfly.caught = true;
                butterfly.x = 50.0;
                butterfly.y = 50.0;
                butterfly.rotation = 0.0;
                self.since_catch = Some(Duration::ZERO);
                true
            }
            None => false,
        }
    }

    /// Tap at a display position; returns the caught butterfly's id
    pub fn tap(&mut self, x: f64, y: f64, radius: f64) -> Option<u64> {
        let id = self.hit_test(x, y, radius)?;
        self.catch(id).then_some(id)
    }
}
