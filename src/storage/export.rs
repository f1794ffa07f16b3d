//! Snapshot of the persisted user data as one JSON document.

use super::{Storage, keys};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

/// Keys included in an export. Cache envelopes are left out.
pub const EXPORTED_KEYS: [&str; 12] = [
    keys::SETTINGS,
    keys::FAVORITES,
    keys::HISTORY,
    keys::MESSAGE_STATS,
    keys::USER_REACTIONS,
    keys::JOURNAL,
    keys::HABITS,
    keys::GOALS,
    keys::USER_MESSAGES,
    keys::COMMUNITY_MESSAGES,
    keys::RECENT_MESSAGES,
    keys::STREAK,
];

/// `{version, exportedAt, stats, data}` where `data` maps every stored key
/// to its decoded value. Absent keys are omitted, unreadable ones are null.
pub fn export_snapshot(storage: &Storage, exported_at: DateTime<Utc>) -> Value {
    let mut data = Map::new();
    for key in EXPORTED_KEYS {
        if let Some(raw) = storage.get_raw(key) {
            let value = serde_json::from_str(&raw).unwrap_or(Value::Null);
            data.insert(key.to_string(), value);
        }
    }

    let count = |key: &str| data.get(key).and_then(Value::as_array).map_or(0, Vec::len);
    let stats = json!({
        "favorites": count(keys::FAVORITES),
        "totalViewed": count(keys::HISTORY),
        "journalEntries": data.get(keys::JOURNAL).and_then(Value::as_object).map_or(0, Map::len),
    });

    json!({
        "version": crate::VERSION,
        "exportedAt": exported_at.to_rfc3339(),
        "stats": stats,
        "data": data,
    })
}
