use crate::message::Message;
use crate::storage::{Storage, keys};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub message: Message,
    pub viewed_at: DateTime<Utc>,
    pub session_id: String,
}

/// Viewed messages, oldest first, capped at `limit` entries.
pub struct History {
    storage: Storage,
    entries: Vec<HistoryEntry>,
    limit: usize,
    session_id: String,
}

impl History {
    pub fn load(storage: Storage, limit: usize, session_id: impl Into<String>) -> Self {
        let limit = limit.max(1);
        let mut entries: Vec<HistoryEntry> = storage.get(keys::HISTORY, Vec::new());
        if entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
        Self {
            storage,
            entries,
            limit,
            session_id: session_id.into(),
        }
    }

    pub fn record(&mut self, message: &Message) -> bool {
        self.record_at(message, Utc::now())
    }

    /// Append a snapshot. A repeat of the last entry's id is ignored and
    /// returns false; the oldest entries are evicted past the limit.
    pub fn record_at(&mut self, message: &Message, viewed_at: DateTime<Utc>) -> bool {
        if self
            .entries
            .last()
            .is_some_and(|last| last.message.id == message.id)
        {
            return false;
        }
        self.entries.push(HistoryEntry {
            message: message.clone(),
            viewed_at,
            session_id: self.session_id.clone(),
        });
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.storage.set(keys::HISTORY, &self.entries);
        true
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev().take(n)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.storage.remove(keys::HISTORY);
    }

    /// The `n` most recent entries grouped by calendar day in `tz`, days
    /// newest first and entries within a day newest first.
    pub fn grouped_by_date<Tz: TimeZone>(
        &self,
        tz: &Tz,
        n: usize,
    ) -> Vec<(NaiveDate, Vec<&HistoryEntry>)> {
        let mut groups: BTreeMap<NaiveDate, Vec<&HistoryEntry>> = BTreeMap::new();
        for entry in self.recent(n) {
            let day = entry.viewed_at.with_timezone(tz).date_naive();
            groups.entry(day).or_default().push(entry);
        }
        groups.into_iter().rev().collect()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
