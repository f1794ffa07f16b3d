use crate::errors::{DailyStartError, DailyStartResult};
use crate::storage::{Storage, keys};
use crate::utils::regex::RegexPatterns;
use crate::utils::sanitize::{MAX_JOURNAL_CHARS, sanitize_input};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const RECENT_ENTRIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Bad,
    Terrible,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Great => "great",
            Self::Good => "good",
            Self::Okay => "okay",
            Self::Bad => "bad",
            Self::Terrible => "terrible",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "great" => Ok(Self::Great),
            "good" => Ok(Self::Good),
            "okay" | "ok" => Ok(Self::Okay),
            "bad" => Ok(Self::Bad),
            "terrible" => Ok(Self::Terrible),
            other => Err(format!(
                "unknown mood '{}' (expected great, good, okay, bad or terrible)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mood: Option<Mood>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry per day, stored under `dailyJournal` keyed by `YYYY-MM-DD`.
pub struct Journal {
    storage: Storage,
    entries: BTreeMap<String, JournalEntry>,
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl Journal {
    pub fn load(storage: Storage) -> Self {
        let mut entries: BTreeMap<String, JournalEntry> = storage.get(keys::JOURNAL, BTreeMap::new());
        entries.retain(|key, _| {
            let valid = RegexPatterns::date_key().is_match(key);
            if !valid {
                debug!("ignoring journal entry with key '{}'", key);
            }
            valid
        });
        Self { storage, entries }
    }

    /// Write the entry for `date`, replacing any earlier one from that day.
    /// Either text or a mood is required.
    pub fn save(
        &mut self,
        date: NaiveDate,
        text: &str,
        mood: Option<Mood>,
    ) -> DailyStartResult<&JournalEntry> {
        let text = sanitize_input(text, MAX_JOURNAL_CHARS);
        if text.is_empty() && mood.is_none() {
            return Err(DailyStartError::Validation(
                "journal entry needs text or a mood".into(),
            ));
        }

        let key = date_key(date);
        let now = Utc::now();
        let created_at = self.entries.get(&key).map_or(now, |e| e.created_at);
        self.entries.insert(
            key.clone(),
            JournalEntry {
                text,
                mood,
                created_at,
                updated_at: now,
            },
        );
        if !self.storage.set(keys::JOURNAL, &self.entries) {
            return Err(DailyStartError::Storage(
                "journal entry could not be saved".into(),
            ));
        }
        self.entries
            .get(&key)
            .ok_or_else(|| DailyStartError::Internal(anyhow::anyhow!("journal entry vanished")))
    }

    pub fn get(&self, date: NaiveDate) -> Option<&JournalEntry> {
        self.entries.get(&date_key(date))
    }

    pub fn remove(&mut self, date: NaiveDate) -> bool {
        if self.entries.remove(&date_key(date)).is_none() {
            return false;
        }
        self.storage.set(keys::JOURNAL, &self.entries);
        true
    }

    /// Up to `n` entries, newest date first.
    pub fn recent(&self, n: usize) -> Vec<(&str, &JournalEntry)> {
        self.entries
            .iter()
            .rev()
            .take(n)
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
