mod common;

use common::{TestHome, at, sample_messages};
use daily_start::message::MessageId;
use daily_start::personal::{GoalPeriod, Goals, Journal, Mood};
use daily_start::state::ReactionKind;
use daily_start::storage::Storage;

#[tokio::test]
async fn test_state_survives_reopen() {
    let home = TestHome::new(sample_messages());
    let now = at(2025, 4, 9, 10);

    {
        let mut state = home.open_state(now.date()).await;
        let shown = state.display_random_message(now).message;
        assert!(state.favorites.add(&shown));
        assert!(state.reactions.add(&shown.id, ReactionKind::Fire));
        state.settings.selected_category = "rest".into();
        assert!(state.settings.save(&state.storage));
    }

    let state = home.open_state(now.date()).await;
    assert_eq!(state.favorites.len(), 1);
    assert_eq!(state.history.entries().len(), 1);
    let fav_id = state.favorites.list()[0].message.id.clone();
    assert_eq!(state.reactions.counts(&fav_id).fire, 1);
    assert_eq!(state.settings.selected_category, "rest");
    assert_eq!(state.streak.data().current, 1);
}

#[tokio::test]
async fn test_duplicate_favorite_rejected() {
    let home = TestHome::new(sample_messages());
    let mut state = home.open_state(at(2025, 4, 9, 10).date()).await;
    let message = state.messages[0].clone();
    assert!(state.favorites.add(&message));
    assert!(!state.favorites.add(&message));
    assert!(state.favorites.remove(&message.id));
    assert!(!state.favorites.remove(&MessageId::from(999)));
}

#[tokio::test]
async fn test_history_capped() {
    let home = TestHome::new(sample_messages());
    let mut config = home.config();
    config.storage.history_limit = 3;
    let mut state = daily_start::state::AppState::open(config).unwrap();
    state.load_pool(at(2025, 4, 9, 10).date()).await;

    for message in state.messages.clone() {
        state.history.record(&message);
    }
    assert_eq!(state.history.entries().len(), 3);
    assert_eq!(
        state.history.entries().last().map(|e| e.message.id.clone()),
        state.messages.last().map(|m| m.id.clone())
    );
}

#[test]
fn test_personal_features_share_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let day = at(2025, 4, 9, 10).date();
    {
        let storage = Storage::open_dir(dir.path(), 5 * 1024 * 1024).unwrap();
        Journal::load(storage.clone())
            .save(day, "Good walk", Some(Mood::Good))
            .unwrap();
        Goals::load(storage)
            .add(GoalPeriod::Monthly, "Read two books")
            .unwrap();
    }

    let storage = Storage::open_dir(dir.path(), 5 * 1024 * 1024).unwrap();
    assert_eq!(Journal::load(storage.clone()).get(day).unwrap().text, "Good walk");
    assert_eq!(Goals::load(storage).list(GoalPeriod::Monthly).len(), 1);
    assert!(dir.path().join("storage.json").exists());
}

#[test]
fn test_quota_exceeded_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::open_dir(dir.path(), 1024).unwrap();
    assert!(!storage.set("big", &"x".repeat(4096)));
    assert_eq!(storage.get("big", String::from("default")), "default");
    assert!(storage.set("small", &"ok"));
}

#[tokio::test]
async fn test_corrupt_storage_file_still_shows_a_message() {
    let home = TestHome::new(sample_messages());
    std::fs::write(home.path().join("storage.json"), "{ not json").unwrap();
    let now = at(2025, 4, 9, 10);

    let mut state = home.open_state(now.date()).await;
    assert!(state.favorites.is_empty());
    let shown = state.display_random_message(now).message;
    assert!(!shown.text.is_empty());
    assert!(home.path().join("storage.json.corrupt").exists());

    let reopened = home.open_state(now.date()).await;
    assert_eq!(reopened.history.entries().len(), 1);
}
