use super::*;

#[test]
fn test_submit_validates() {
    let mut subs = Submissions::load(Storage::in_memory());
    assert!(subs.submit("", None, "hope").unwrap_err().is_user_facing());
    assert!(subs.submit("text", None, "  ").unwrap_err().is_user_facing());
    assert!(subs.submitted().is_empty());
}

#[test]
fn test_submit_stores_pending() {
    let storage = Storage::in_memory();
    let mut subs = Submissions::load(storage.clone());
    let m = subs
        .submit("  <script>x</script>Keep going", Some(""), "hope")
        .unwrap();
    assert_eq!(m.text, "Keep going");
    assert_eq!(m.author, "Anonymous");
    assert_eq!(m.status, Some(MessageStatus::Pending));
    assert!(m.id.to_string().starts_with("user_"));
    assert_eq!(subs.pending().count(), 1);

    let raw: serde_json::Value = storage.get(keys::USER_MESSAGES, serde_json::Value::Null);
    assert_eq!(raw[0]["status"], "pending");
}

#[test]
fn test_approve_joins_community() {
    let storage = Storage::in_memory();
    let mut subs = Submissions::load(storage.clone());
    let m = subs.submit("Be kind", Some("Me"), "kindness").unwrap();

    let approved = subs.approve(&m.id).unwrap();
    assert_eq!(approved.status, Some(MessageStatus::Approved));
    assert_eq!(subs.pending().count(), 0);
    assert_eq!(subs.community().len(), 1);
    assert_eq!(subs.community()[0].source.as_deref(), Some("community"));

    let reloaded = Submissions::load(storage);
    assert_eq!(reloaded.community().len(), 1);
    assert_eq!(reloaded.submitted()[0].status, Some(MessageStatus::Approved));
}

#[test]
fn test_reject_does_not_join_community() {
    let mut subs = Submissions::load(Storage::in_memory());
    let m = subs.submit("Meh", None, "misc").unwrap();
    subs.reject(&m.id).unwrap();
    assert!(subs.community().is_empty());
    assert_eq!(subs.submitted()[0].status, Some(MessageStatus::Rejected));
}

#[test]
fn test_review_requires_pending() {
    let mut subs = Submissions::load(Storage::in_memory());
    let m = subs.submit("Once", None, "misc").unwrap();
    subs.approve(&m.id).unwrap();
    assert!(subs.approve(&m.id).is_err());
    assert!(subs.reject(&m.id).is_err());
    assert!(subs.approve(&MessageId::from("user_missing")).is_err());
}

fn import_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

#[test]
fn test_import_merges_into_community() {
    let storage = Storage::in_memory();
    let mut subs = Submissions::load(storage.clone());
    let doc = serde_json::json!({
        "messages": [
            {"id": 7, "text": "Keep going.", "author": "A", "category": "hope"},
            {"text": "<script>x()</script>Small steps.", "category": "growth"},
            {"text": "   "},
            "not an object"
        ]
    });

    let report = subs
        .import_document(doc.to_string().as_bytes(), import_day())
        .unwrap();
    assert_eq!(
        report,
        ImportReport {
            imported: 2,
            invalid: 2,
            duplicates: 0
        }
    );

    let community = subs.community();
    assert_eq!(community[0].id, MessageId::Numeric(7));
    assert_eq!(community[0].created_at.as_deref(), Some("2026-10-16"));
    assert_eq!(community[0].source.as_deref(), Some("file"));
    assert_eq!(community[1].text, "Small steps.");
    assert!(community[1].id.to_string().starts_with("import_"));
    assert_eq!(community[1].author, DEFAULT_AUTHOR);

    let reloaded = Submissions::load(storage);
    assert_eq!(reloaded.community().len(), 2);
}

#[test]
fn test_import_accepts_bare_array_and_skips_duplicates() {
    let mut subs = Submissions::load(Storage::in_memory());
    let first = serde_json::json!([{"id": "a", "text": "One.", "category": "hope"}]);
    subs.import_document(first.to_string().as_bytes(), import_day()).unwrap();

    let second = serde_json::json!([
        {"id": "a", "text": "Different text.", "category": "hope"},
        {"id": "b", "text": "One.", "category": "hope"},
        {"id": "c", "text": "Two.", "category": "hope"},
        {"id": "d", "text": "Two.", "category": "hope"}
    ]);
    let report = subs
        .import_document(second.to_string().as_bytes(), import_day())
        .unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.duplicates, 3);
    assert_eq!(subs.community().len(), 2);
}

#[test]
fn test_import_rejects_wrong_shape() {
    let mut subs = Submissions::load(Storage::in_memory());
    for bad in ["not json", "{\"items\": []}", "42"] {
        let err = subs.import_document(bad.as_bytes(), import_day()).unwrap_err();
        assert!(err.is_user_facing(), "{bad}");
    }
    assert!(subs.community().is_empty());
}
