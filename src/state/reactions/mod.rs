use crate::message::MessageId;
use crate::storage::{Storage, keys};
use crate::utils::now_millis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    #[serde(alias = "love")]
    Heart,
    Fire,
}

impl ReactionKind {
    pub const ALL: [Self; 3] = [Self::Like, Self::Heart, Self::Fire];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Heart => "heart",
            Self::Fire => "fire",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(Self::Like),
            "heart" | "love" => Ok(Self::Heart),
            "fire" => Ok(Self::Fire),
            other => Err(format!(
                "unknown reaction '{}' (expected like, heart or fire)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    #[serde(default)]
    pub like: u64,
    #[serde(default)]
    pub heart: u64,
    #[serde(default)]
    pub fire: u64,
}

impl ReactionCounts {
    pub fn get(&self, kind: ReactionKind) -> u64 {
        match kind {
            ReactionKind::Like => self.like,
            ReactionKind::Heart => self.heart,
            ReactionKind::Fire => self.fire,
        }
    }

    fn slot(&mut self, kind: ReactionKind) -> &mut u64 {
        match kind {
            ReactionKind::Like => &mut self.like,
            ReactionKind::Heart => &mut self.heart,
            ReactionKind::Fire => &mut self.fire,
        }
    }

    pub fn total(&self) -> u64 {
        self.like + self.heart + self.fire
    }
}

/// Per-message reaction counters (`messageStats`) plus the set of reactions
/// this user has already given (`userReactions`).
///
/// Counters are derived from the reacted set but stored separately, so the
/// two can drift apart; decrements saturate at zero.
pub struct Reactions {
    storage: Storage,
    stats: BTreeMap<String, ReactionCounts>,
    reacted: BTreeMap<String, i64>,
}

fn reaction_key(id: &MessageId, kind: ReactionKind) -> String {
    format!("{}_{}", id, kind)
}

impl Reactions {
    pub fn load(storage: Storage) -> Self {
        let stats = storage.get(keys::MESSAGE_STATS, BTreeMap::new());
        let reacted = storage.get(keys::USER_REACTIONS, BTreeMap::new());
        Self {
            storage,
            stats,
            reacted,
        }
    }

    pub fn has_reacted(&self, id: &MessageId, kind: ReactionKind) -> bool {
        self.reacted.contains_key(&reaction_key(id, kind))
    }

    /// Returns false when this reaction was already given.
    pub fn add(&mut self, id: &MessageId, kind: ReactionKind) -> bool {
        let key = reaction_key(id, kind);
        if self.reacted.contains_key(&key) {
            return false;
        }
        self.reacted.insert(key, now_millis());
        let slot = self.stats.entry(id.to_string()).or_default().slot(kind);
        *slot = slot.saturating_add(1);
        self.persist();
        true
    }

    /// Returns false when this reaction was not given.
    pub fn remove(&mut self, id: &MessageId, kind: ReactionKind) -> bool {
        if self.reacted.remove(&reaction_key(id, kind)).is_none() {
            return false;
        }
        if let Some(counts) = self.stats.get_mut(&id.to_string()) {
            let slot = counts.slot(kind);
            *slot = slot.saturating_sub(1);
        }
        self.persist();
        true
    }

    /// Add or remove. Returns whether the reaction is now present.
    pub fn toggle(&mut self, id: &MessageId, kind: ReactionKind) -> bool {
        if self.remove(id, kind) {
            false
        } else {
            self.add(id, kind)
        }
    }

    pub fn counts(&self, id: &MessageId) -> ReactionCounts {
        self.stats.get(&id.to_string()).copied().unwrap_or_default()
    }

    /// Message ids with the most reactions, highest first.
    pub fn top(&self, n: usize) -> Vec<(&str, ReactionCounts)> {
        let mut all: Vec<(&str, ReactionCounts)> = self
            .stats
            .iter()
            .filter(|(_, c)| c.total() > 0)
            .map(|(id, c)| (id.as_str(), *c))
            .collect();
        all.sort_by(|a, b| b.1.total().cmp(&a.1.total()).then_with(|| a.0.cmp(b.0)));
        all.truncate(n);
        all
    }

    fn persist(&self) {
        self.storage.set(keys::MESSAGE_STATS, &self.stats);
        self.storage.set(keys::USER_REACTIONS, &self.reacted);
    }
}

#[cfg(test)]
mod tests;
