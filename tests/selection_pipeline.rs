mod common;

use common::{TestHome, at, sample_messages};
use daily_start::message::MessageId;
use daily_start::selection::SelectionOrigin;
use serde_json::json;

#[tokio::test]
async fn test_special_day_overrides_category() {
    let home = TestHome::new(sample_messages());
    let mut state = home.open_state(at(2025, 1, 1, 9).date()).await;
    state.settings.selected_category = "courage".into();

    let selection = state.display_random_message(at(2025, 1, 1, 9));
    assert_eq!(selection.origin, SelectionOrigin::SpecialDay);
    assert_eq!(selection.message.id, MessageId::from(4));
}

#[tokio::test]
async fn test_category_filter_respected_on_plain_day() {
    let home = TestHome::new(sample_messages());
    // Wednesday 2025-04-09, 10:00: no special day, no event
    let now = at(2025, 4, 9, 10);
    let mut state = home.open_state(now.date()).await;
    state.settings.selected_category = "courage".into();

    for _ in 0..10 {
        let selection = state.display_random_message(now);
        assert_eq!(selection.message.category, "courage");
    }
}

#[tokio::test]
async fn test_unknown_category_falls_back_to_everything() {
    let home = TestHome::new(sample_messages());
    let now = at(2025, 4, 9, 10);
    let mut state = home.open_state(now.date()).await;
    state.settings.selected_category = "no-such-category".into();

    let selection = state.display_random_message(now);
    assert_eq!(selection.origin, SelectionOrigin::Unfiltered);
    assert_eq!(selection.pool_size, 5);
}

#[tokio::test]
async fn test_no_immediate_repeat_across_runs() {
    let home = TestHome::new(json!([
        {"id": 1, "text": "One", "category": "a"},
        {"id": 2, "text": "Two", "category": "a"}
    ]));
    let now = at(2025, 4, 9, 10);

    let mut previous = None;
    for _ in 0..6 {
        // a fresh state each time, like separate CLI invocations
        let mut state = home.open_state(now.date()).await;
        let shown = state.display_random_message(now).message.id;
        if let Some(prev) = previous {
            assert_ne!(shown, prev);
        }
        previous = Some(shown);
    }
}

#[tokio::test]
async fn test_broken_resource_yields_fallback_messages() {
    let home = TestHome::new(json!([]));
    std::fs::write(home.path().join("messages.json"), "{not json").unwrap();
    let now = at(2025, 4, 9, 10);
    let mut state = home.open_state(now.date()).await;
    assert!(state.used_fallback);
    assert_eq!(state.messages.len(), 3);

    let selection = state.display_random_message(now);
    assert_ne!(selection.origin, SelectionOrigin::Placeholder);
}
