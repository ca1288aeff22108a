//! Reading quest progression: mood, castle, the token path, badges and the journal.

use crate::constants::{BOOKWORM_TOKENS, MAX_TOKENS, STEPS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How the reader feels today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    /// Happy
    Happy,
    /// Okay
    Okay,
    /// Tired
    Tired,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Happy => "Happy",
            Self::Okay => "Okay",
            Self::Tired => "Tired",
        };
        f.write_str(label)
    }
}

impl FromStr for Mood {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "okay" | "ok" => Ok(Self::Okay),
            "tired" => Ok(Self::Tired),
            _ => Err(crate::Error::InvalidInput(format!("Unknown mood: {s}"))),
        }
    }
}

/// Castle at the end of the path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastleType {
    /// Pink classic castle
    Classic,
    /// Night-sky fairytale castle
    Fairytale,
    /// Crystal castle
    Crystal,
    /// Forest castle
    Forest,
}

impl CastleType {
    /// Night themes get a starry sky
    #[must_use]
    pub const fn is_night_theme(self) -> bool {
        matches!(self, Self::Fairytale | Self::Crystal)
    }
}

impl fmt::Display for CastleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Classic => "Classic",
            Self::Fairytale => "Fairytale",
            Self::Crystal => "Crystal",
            Self::Forest => "Forest",
        };
        f.write_str(label)
    }
}

impl FromStr for CastleType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "fairytale" => Ok(Self::Fairytale),
            "crystal" => Ok(Self::Crystal),
            "forest" => Ok(Self::Forest),
            _ => Err(crate::Error::InvalidInput(format!("Unknown castle: {s}"))),
        }
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The reader
    User,
    /// The Fairy Godmother chat helper
    Helper,
    /// Generated motivational messages
    System,
}

/// A chat or journal message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id
    pub id: Uuid,
    /// Message text
    pub text: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Author
    pub sender: Sender,
}

impl Message {
    /// Create a message stamped with `now`
    #[must_use]
    pub fn new(text: impl Into<String>, sender: Sender, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp: now,
            sender,
        }
    }
}

/// A badge in the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Stable id
    pub id: String,
    /// Display name
    pub name: String,
    /// What it is awarded for
    pub description: String,
    /// Emoji icon
    pub icon: String,
    /// Unlock time, `None` while locked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    fn new(id: &str, name: &str, description: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            unlocked_at: None,
        }
    }

    /// Whether the badge has been earned
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// Badges available from the start
#[must_use]
pub fn initial_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new("first_flutter", "First Flutter", "Caught your first butterfly", "🦋"),
        Achievement::new("halfway", "Halfway Hero", "Reached the Crystal Bridge", "🌉"),
        Achievement::new("quest_champ", "Quest Champion", "Completed a full journey", "👑"),
        Achievement::new("bookworm", "Royal Bookworm", "Earned 20 total tokens", "📚"),
    ]
}

/// Index of a named station on the path
fn step_index(name: &str) -> u32 {
    STEPS
        .iter()
        .position(|s| *s == name)
        .and_then(|i| u32::try_from(i).ok())
        .unwrap_or(MAX_TOKENS)
}

/// Whether a badge's condition holds for the given journey and lifetime counts
fn achievement_earned(id: &str, tokens: u32, total: u32) -> bool {
    match id {
        "first_flutter" => total >= 1,
        "halfway" => tokens >= step_index("Crystal Bridge"),
        "quest_champ" => tokens >= MAX_TOKENS,
        "bookworm" => total >= BOOKWORM_TOKENS,
        _ => false,
    }
}

/// Outcome of earning a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAward {
    /// Tokens on the current journey
    pub tokens: u32,
    /// Lifetime tokens
    pub total_tokens_earned: u32,
    /// Ids of badges unlocked by this token
    pub unlocked: Vec<String>,
}

/// The persisted quest record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestState {
    /// Mood and castle have been chosen
    pub is_setup: bool,
    /// Today's mood
    pub mood: Option<Mood>,
    /// Chosen castle
    pub castle: Option<CastleType>,
    /// Tokens on the current journey, `0..=MAX_TOKENS`
    pub tokens: u32,
    /// Lifetime tokens
    pub total_tokens_earned: u32,
    /// Helper chat history
    pub messages: Vec<Message>,
    /// Motivational messages, oldest first
    pub journal_entries: Vec<Message>,
    /// Badges
    pub achievements: Vec<Achievement>,
}

impl Default for QuestState {
    fn default() -> Self {
        Self {
            is_setup: false,
            mood: None,
            castle: None,
            tokens: 0,
            total_tokens_earned: 0,
            messages: Vec::new(),
            journal_entries: Vec::new(),
            achievements: initial_achievements(),
        }
    }
}

impl QuestState {
    /// Choose mood and castle and start a fresh journey
    pub fn complete_setup(&mut self, mood: Mood, castle: CastleType) {
        self.is_setup = true;
        self.mood = Some(mood);
        self.castle = Some(castle);
        self.tokens = 0;
    }

    /// Earn one token for a caught butterfly and unlock any badges it earns
    pub fn award_token(&mut self, now: DateTime<Utc>) -> TokenAward {
        self.tokens = (self.tokens + 1).min(MAX_TOKENS);
        self.total_tokens_earned = self.total_tokens_earned.saturating_add(1);

        let (tokens, total) = (self.tokens, self.total_tokens_earned);
        let mut unlocked = Vec::new();
        for achievement in &mut self.achievements {
            if !achievement.is_unlocked() && achievement_earned(&achievement.id, tokens, total) {
                achievement.unlocked_at = Some(now);
                unlocked.push(achievement.id.clone());
            }
        }

        TokenAward {
            tokens,
            total_tokens_earned: total,
            unlocked,
        }
    }

    /// Append a motivational message to the journal
    pub fn record_journal_entry(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.journal_entries.push(Message::new(text, Sender::System, now));
    }

    /// Append a chat message
    pub fn record_chat_message(&mut self, text: impl Into<String>, sender: Sender, now: DateTime<Utc>) {
        self.messages.push(Message::new(text, sender, now));
    }

    /// Back to setup with an empty path; lifetime progress is kept
    pub fn reset_journey(&mut self) {
        self.tokens = 0;
        self.is_setup = false;
    }

    /// Station where the avatar stands
    #[must_use]
    pub fn current_step_index(&self) -> usize {
        let last = STEPS.len() - 1;
        usize::try_from(self.tokens).map_or(last, |t| t.min(last))
    }

    /// Name of the avatar's station
    #[must_use]
    pub fn current_step(&self) -> &'static str {
        STEPS[self.current_step_index()]
    }

    /// Castle reached
    #[must_use]
    pub const fn is_finale(&self) -> bool {
        self.tokens >= MAX_TOKENS
    }

    /// Most recent journal entry
    #[must_use]
    pub fn latest_journal_entry(&self) -> Option<&Message> {
        self.journal_entries.last()
    }

    /// Mood used for generated messages, `Happy` when unset
    #[must_use]
    pub fn mood_or_default(&self) -> Mood {
        self.mood.unwrap_or(Mood::Happy)
    }

    /// Castle shown on the board, `Classic` when unset
    #[must_use]
    pub fn castle_or_default(&self) -> CastleType {
        self.castle.unwrap_or(CastleType::Classic)
    }
}
