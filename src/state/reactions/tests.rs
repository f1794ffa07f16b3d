use super::*;

#[test]
fn test_parse_kind() {
    assert_eq!("like".parse::<ReactionKind>(), Ok(ReactionKind::Like));
    assert_eq!("Love".parse::<ReactionKind>(), Ok(ReactionKind::Heart));
    assert_eq!(" fire ".parse::<ReactionKind>(), Ok(ReactionKind::Fire));
    assert!("meh".parse::<ReactionKind>().is_err());
}

#[test]
fn test_serde_alias() {
    let kind: ReactionKind = serde_json::from_str("\"love\"").unwrap();
    assert_eq!(kind, ReactionKind::Heart);
    assert_eq!(serde_json::to_string(&kind).unwrap(), "\"heart\"");
}

#[test]
fn test_add_is_idempotent() {
    let mut reactions = Reactions::load(Storage::in_memory());
    let id = MessageId::from(1);
    assert!(reactions.add(&id, ReactionKind::Like));
    assert!(!reactions.add(&id, ReactionKind::Like));
    assert_eq!(reactions.counts(&id).like, 1);
    assert!(reactions.has_reacted(&id, ReactionKind::Like));
    assert!(!reactions.has_reacted(&id, ReactionKind::Fire));
}

#[test]
fn test_kinds_counted_separately() {
    let mut reactions = Reactions::load(Storage::in_memory());
    let id = MessageId::from("quote_3");
    reactions.add(&id, ReactionKind::Like);
    reactions.add(&id, ReactionKind::Fire);
    let counts = reactions.counts(&id);
    assert_eq!((counts.like, counts.heart, counts.fire), (1, 0, 1));
    assert_eq!(counts.total(), 2);
}

#[test]
fn test_remove_decrements() {
    let mut reactions = Reactions::load(Storage::in_memory());
    let id = MessageId::from(1);
    reactions.add(&id, ReactionKind::Heart);
    assert!(reactions.remove(&id, ReactionKind::Heart));
    assert_eq!(reactions.counts(&id).heart, 0);
    assert!(!reactions.remove(&id, ReactionKind::Heart));
}

#[test]
fn test_desynced_counter_saturates_at_zero() {
    let storage = Storage::in_memory();
    let mut reacted = BTreeMap::new();
    reacted.insert("7_like".to_string(), 0i64);
    storage.set(keys::USER_REACTIONS, &reacted);

    let mut reactions = Reactions::load(storage);
    let id = MessageId::from(7);
    assert!(reactions.remove(&id, ReactionKind::Like));
    assert_eq!(reactions.counts(&id).like, 0);
}

#[test]
fn test_toggle() {
    let mut reactions = Reactions::load(Storage::in_memory());
    let id = MessageId::from(2);
    assert!(reactions.toggle(&id, ReactionKind::Fire));
    assert!(!reactions.toggle(&id, ReactionKind::Fire));
    assert_eq!(reactions.counts(&id).fire, 0);
}

#[test]
fn test_persisted_layout() {
    let storage = Storage::in_memory();
    let mut reactions = Reactions::load(storage.clone());
    reactions.add(&MessageId::from(3), ReactionKind::Like);

    let stats: serde_json::Value = storage.get(keys::MESSAGE_STATS, serde_json::Value::Null);
    assert_eq!(stats["3"]["like"], 1);
    let reacted: serde_json::Value = storage.get(keys::USER_REACTIONS, serde_json::Value::Null);
    assert!(reacted["3_like"].is_i64());

    let reloaded = Reactions::load(storage);
    assert!(reloaded.has_reacted(&MessageId::from(3), ReactionKind::Like));
}

#[test]
fn test_top() {
    let mut reactions = Reactions::load(Storage::in_memory());
    reactions.add(&MessageId::from(1), ReactionKind::Like);
    reactions.add(&MessageId::from(2), ReactionKind::Like);
    reactions.add(&MessageId::from(2), ReactionKind::Fire);
    let top = reactions.top(1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].0, "2");
}
