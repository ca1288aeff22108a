//! Tests for quest progression and the persisted state file


use chrono::{Duration, TimeZone, Utc};
use royal_reading_quest::{
    constants::{MAX_TOKENS, STEPS},
    quest::{CastleType, Mood, QuestState, Sender},
    state::StateStore,
};
use test_helpers::scratch_state_path;

fn unlocked(state: &QuestState) -> Vec<&str> {
    state
        .achievements
        .iter()
        .filter(|a| a.is_unlocked())
        .map(|a| a.id.as_str())
        .collect()
}

#[test]
fn test_tokens_cap_at_castle() {
    let mut state = QuestState::default();
    state.complete_setup(Mood::Happy, CastleType::Classic);
    let now = Utc::now();

    for expected in 1..=MAX_TOKENS {
        assert_eq!(state.award_token(now).tokens, expected);
    }
    let award = state.award_token(now);
    assert_eq!(award.tokens, MAX_TOKENS);
    assert_eq!(award.total_tokens_earned, MAX_TOKENS + 1);
    assert!(state.is_finale());
    assert_eq!(state.current_step(), STEPS[STEPS.len() - 1]);
}

#[test]
fn test_achievements_unlock_once() {
    let mut state = QuestState::default();
    let first = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();

    assert_eq!(state.award_token(first).unlocked, vec!["first_flutter"]);
    assert_eq!(state.award_token(first).unlocked, vec!["halfway"]);
    assert!(state.award_token(first).unlocked.is_empty());
    assert!(state.award_token(first).unlocked.is_empty());
    assert_eq!(state.award_token(first).unlocked, vec!["quest_champ"]);

    // Later tokens do not move the unlock time
    state.award_token(first + Duration::days(1));
    let badge = state.achievements.iter().find(|a| a.id == "first_flutter").unwrap();
    assert_eq!(badge.unlocked_at, Some(first));
}

#[test]
fn test_bookworm_counts_lifetime_tokens() {
    let mut state = QuestState::default();
    let now = Utc::now();

    for _ in 0..4 {
        for _ in 0..MAX_TOKENS {
            state.award_token(now);
        }
        state.reset_journey();
        state.complete_setup(Mood::Okay, CastleType::Forest);
    }

    assert_eq!(state.total_tokens_earned, 20);
    assert_eq!(state.tokens, 0);
    assert!(unlocked(&state).contains(&"bookworm"));
}

#[test]
fn test_reset_returns_to_setup() {
    let mut state = QuestState::default();
    state.complete_setup(Mood::Tired, CastleType::Fairytale);
    let now = Utc::now();
    for _ in 0..MAX_TOKENS {
        state.award_token(now);
    }
    state.record_journal_entry("You are a star!", now);

    state.reset_journey();
    assert!(!state.is_setup);
    assert_eq!(state.tokens, 0);
    assert_eq!(state.current_step(), STEPS[0]);
    // Lifetime progress survives
    assert_eq!(state.total_tokens_earned, MAX_TOKENS);
    assert_eq!(state.journal_entries.len(), 1);
    assert_eq!(unlocked(&state).len(), 3);
}

#[test]
fn test_journal_latest_entry() {
    let mut state = QuestState::default();
    let now = Utc::now();
    assert!(state.latest_journal_entry().is_none());

    state.record_journal_entry("First", now);
    state.record_journal_entry("Second", now + Duration::minutes(5));
    let latest = state.latest_journal_entry().unwrap();
    assert_eq!(latest.text, "Second");
    assert_eq!(latest.sender, Sender::System);
}

#[test]
fn test_defaults_when_unset() {
    let state = QuestState::default();
    assert_eq!(state.mood_or_default(), Mood::Happy);
    assert_eq!(state.castle_or_default(), CastleType::Classic);
    assert_eq!(state.achievements.len(), 4);
}

#[test]
fn test_state_file_round_trip() {
    let path = scratch_state_path();
    let now = Utc::now();

    {
        let mut store = StateStore::open(&path).unwrap();
        store.update(|s| s.complete_setup(Mood::Happy, CastleType::Crystal)).unwrap();
        store.update(|s| s.award_token(now)).unwrap();
        store.update(|s| s.record_journal_entry("Keep shining!", now)).unwrap();
        store
            .update(|s| s.record_chat_message("Hi Fairy Godmother", Sender::User, now))
            .unwrap();
    }

    let store = StateStore::open(&path).unwrap();
    let state = store.state();
    assert!(state.is_setup);
    assert_eq!(state.castle, Some(CastleType::Crystal));
    assert_eq!(state.tokens, 1);
    assert_eq!(state.journal_entries[0].text, "Keep shining!");
    assert_eq!(state.journal_entries[0].timestamp, now);
    assert_eq!(state.messages[0].sender, Sender::User);
    assert_eq!(unlocked(state), vec!["first_flutter"]);
}

#[test]
fn test_partial_state_file_fills_defaults() {
    let path = scratch_state_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{ "is_setup": true, "tokens": 3 }"#).unwrap();

    let store = StateStore::open(&path).unwrap();
    assert!(store.state().is_setup);
    assert_eq!(store.state().tokens, 3);
    assert_eq!(store.state().achievements.len(), 4);
    assert!(store.state().journal_entries.is_empty());
}
