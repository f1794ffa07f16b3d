use super::*;
use crate::message::MessageId;
use chrono::NaiveDate;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// A Tuesday in mid-October with no special day, weekday or month tag.
fn quiet_day() -> NaiveDateTime {
    at(2026, 10, 13, 9)
}

fn always() -> SelectionConfig {
    SelectionConfig {
        seasonal_probability: 1.0,
        event_probability: 1.0,
        time_of_day_probability: 1.0,
    }
}

fn never() -> SelectionConfig {
    SelectionConfig {
        seasonal_probability: 0.0,
        event_probability: 0.0,
        time_of_day_probability: 0.0,
    }
}

fn msg(id: i64, category: &str) -> Message {
    Message::new(id, format!("message {}", id), "Tester", category)
}

fn sample() -> Vec<Message> {
    vec![
        msg(1, "hope").with_season(Season::Autumn),
        msg(2, "hope").with_season(Season::Spring),
        msg(3, "courage").with_season(Season::All),
        msg(4, "courage"),
    ]
}

#[test]
fn test_empty_set_yields_placeholder() {
    let settings = Settings::default();
    let selector = Selector::new(&settings, always());
    let mut rng = fastrand::Rng::with_seed(1);
    let selection = selector.select(&[], quiet_day(), None, &mut rng);
    assert_eq!(selection.origin, SelectionOrigin::Placeholder);
    assert_eq!(selection.message, Message::placeholder());
    assert_eq!(selection.pool_size, 0);
}

#[test]
fn test_category_filter_exact_match() {
    let mut settings = Settings::default();
    settings.selected_category = "courage".into();
    settings.seasonal_messages = false;
    let selector = Selector::new(&settings, always());
    let mut rng = fastrand::Rng::with_seed(2);
    let messages = sample();
    for _ in 0..20 {
        let s = selector.select(&messages, quiet_day(), None, &mut rng);
        assert_eq!(s.message.category, "courage");
        assert_eq!(s.origin, SelectionOrigin::Filtered);
        assert_eq!(s.pool_size, 2);
    }
}

#[test]
fn test_unknown_category_falls_back_to_full_set() {
    let mut settings = Settings::default();
    settings.selected_category = "nonexistent".into();
    let selector = Selector::new(&settings, always());
    let mut rng = fastrand::Rng::with_seed(3);
    let messages = sample();
    let s = selector.select(&messages, quiet_day(), None, &mut rng);
    assert_eq!(s.origin, SelectionOrigin::Unfiltered);
    assert_eq!(s.pool_size, messages.len());
}

#[test]
fn test_seasonal_preference_applied() {
    let settings = Settings::default();
    let selector = Selector::new(&settings, always());
    let mut rng = fastrand::Rng::with_seed(4);
    let messages = sample();
    let (pool, origin) = selector.candidates(&messages, quiet_day(), &mut rng);
    assert_eq!(origin, SelectionOrigin::Filtered);
    let ids: Vec<String> = pool.iter().map(|m| m.id.to_string()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn test_seasonal_preference_skipped_when_draw_fails() {
    let settings = Settings::default();
    let selector = Selector::new(&settings, never());
    let mut rng = fastrand::Rng::with_seed(5);
    let messages = sample();
    let (pool, _) = selector.candidates(&messages, quiet_day(), &mut rng);
    assert_eq!(pool.len(), 4);
}

#[test]
fn test_seasonal_disabled() {
    let mut settings = Settings::default();
    settings.seasonal_messages = false;
    let selector = Selector::new(&settings, always());
    let mut rng = fastrand::Rng::with_seed(6);
    let messages = sample();
    let (pool, _) = selector.candidates(&messages, quiet_day(), &mut rng);
    assert_eq!(pool.len(), 4);
}

#[test]
fn test_special_day_overrides_category() {
    let mut settings = Settings::default();
    settings.selected_category = "hope".into();
    let selector = Selector::new(&settings, never());
    let mut rng = fastrand::Rng::with_seed(7);
    let mut messages = sample();
    messages.push(msg(10, "holiday").with_special_day("christmas"));

    let s = selector.select(&messages, at(2026, 12, 25, 10), None, &mut rng);
    assert_eq!(s.origin, SelectionOrigin::SpecialDay);
    assert_eq!(s.message.id, MessageId::from(10));
    assert_eq!(s.pool_size, 1);
}

#[test]
fn test_special_day_disabled() {
    let mut settings = Settings::default();
    settings.special_day_messages = false;
    settings.event_messages = false;
    let selector = Selector::new(&settings, never());
    let mut rng = fastrand::Rng::with_seed(8);
    let messages = vec![msg(1, "a"), msg(2, "b").with_special_day("christmas")];
    let (pool, origin) = selector.candidates(&messages, at(2026, 12, 25, 10), &mut rng);
    assert_eq!(origin, SelectionOrigin::Filtered);
    assert_eq!(pool.len(), 2);
}

#[test]
fn test_special_day_not_today_is_ignored() {
    let settings = Settings::default();
    let selector = Selector::new(&settings, never());
    let mut rng = fastrand::Rng::with_seed(9);
    let messages = vec![msg(1, "a"), msg(2, "b").with_special_day("new-year")];
    let (_, origin) = selector.candidates(&messages, quiet_day(), &mut rng);
    assert_eq!(origin, SelectionOrigin::Filtered);
}

#[test]
fn test_event_subset_returned_when_draw_passes() {
    let settings = Settings::default();
    let selector = Selector::new(&settings, always());
    let mut rng = fastrand::Rng::with_seed(10);
    let messages = vec![
        msg(1, "a"),
        msg(2, "b").with_event("monday"),
        msg(3, "c").with_event("friday"),
    ];
    let (pool, origin) = selector.candidates(&messages, at(2026, 10, 12, 9), &mut rng);
    assert_eq!(origin, SelectionOrigin::Event);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].event.as_deref(), Some("monday"));
}

#[test]
fn test_event_skipped_when_draw_fails() {
    let settings = Settings::default();
    let selector = Selector::new(&settings, never());
    let mut rng = fastrand::Rng::with_seed(11);
    let messages = vec![msg(1, "a"), msg(2, "b").with_event("monday")];
    let (pool, origin) = selector.candidates(&messages, at(2026, 10, 12, 9), &mut rng);
    assert_eq!(origin, SelectionOrigin::Filtered);
    assert_eq!(pool.len(), 2);
}

#[test]
fn test_event_ignores_category_filter() {
    let mut settings = Settings::default();
    settings.selected_category = "a".into();
    let selector = Selector::new(&settings, always());
    let mut rng = fastrand::Rng::with_seed(12);
    let messages = vec![msg(1, "a"), msg(2, "b").with_event("lunch")];
    let (pool, origin) = selector.candidates(&messages, at(2026, 10, 13, 12), &mut rng);
    assert_eq!(origin, SelectionOrigin::Event);
    assert_eq!(pool[0].category, "b");
}

#[test]
fn test_time_of_day_preference_opt_in() {
    let mut settings = Settings::default();
    settings.seasonal_messages = false;
    let messages = vec![
        msg(1, "a").with_time_of_day(TimeOfDay::Morning),
        msg(2, "a").with_time_of_day(TimeOfDay::Evening),
        msg(3, "a"),
    ];
    let mut rng = fastrand::Rng::with_seed(13);

    let (pool, _) = Selector::new(&settings, always()).candidates(&messages, quiet_day(), &mut rng);
    assert_eq!(pool.len(), 3);

    settings.time_of_day_messages = true;
    let (pool, _) = Selector::new(&settings, always()).candidates(&messages, quiet_day(), &mut rng);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].time_of_day, Some(TimeOfDay::Morning));
}

#[test]
fn test_no_immediate_repeat() {
    let mut settings = Settings::default();
    settings.seasonal_messages = false;
    let selector = Selector::new(&settings, never());
    let messages = vec![msg(1, "a"), msg(2, "a")];
    let mut rng = fastrand::Rng::with_seed(14);
    let mut previous = selector.select(&messages, quiet_day(), None, &mut rng).message;
    for _ in 0..50 {
        let next = selector
            .select(&messages, quiet_day(), Some(&previous), &mut rng)
            .message;
        assert!(!next.same_as(&previous));
        previous = next;
    }
}

#[test]
fn test_single_candidate_may_repeat() {
    let settings = Settings::default();
    let selector = Selector::new(&settings, never());
    let messages = vec![msg(1, "a")];
    let mut rng = fastrand::Rng::with_seed(15);
    let s = selector.select(&messages, quiet_day(), Some(&messages[0]), &mut rng);
    assert!(s.message.same_as(&messages[0]));
}

#[test]
fn test_duplicate_only_pool_terminates() {
    let settings = Settings::default();
    let selector = Selector::new(&settings, never());
    let messages = vec![msg(1, "a"), msg(1, "a")];
    let mut rng = fastrand::Rng::with_seed(16);
    let s = selector.select(&messages, quiet_day(), Some(&messages[0]), &mut rng);
    assert_eq!(s.pool_size, 2);
}

#[test]
fn test_selection_is_roughly_uniform() {
    let mut settings = Settings::default();
    settings.seasonal_messages = false;
    let selector = Selector::new(&settings, never());
    let messages: Vec<Message> = (1..=4).map(|i| msg(i, "a")).collect();
    let mut rng = fastrand::Rng::with_seed(17);
    let mut counts = [0usize; 4];
    for _ in 0..4000 {
        let s = selector.select(&messages, quiet_day(), None, &mut rng);
        let MessageId::Numeric(n) = s.message.id else {
            panic!("expected numeric id");
        };
        counts[(n - 1) as usize] += 1;
    }
    for c in counts {
        assert!((800..1200).contains(&c), "counts were {:?}", counts);
    }
}
