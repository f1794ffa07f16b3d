use crate::message::{Message, MessageId};
use crate::storage::{Storage, keys};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Snapshot taken when favorited; later edits to the message do not propagate.
    pub message: Message,
    pub added_at: DateTime<Utc>,
}

/// Favorited messages, unique by message id, mirrored to `favorites` on every change.
pub struct Favorites {
    storage: Storage,
    items: Vec<Favorite>,
}

impl Favorites {
    pub fn load(storage: Storage) -> Self {
        let mut items: Vec<Favorite> = storage.get(keys::FAVORITES, Vec::new());
        // Stored data may predate the uniqueness check
        let mut seen = std::collections::HashSet::new();
        items.retain(|f| seen.insert(f.message.id.clone()));
        Self { storage, items }
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.items.iter().any(|f| &f.message.id == id)
    }

    /// Returns false when a favorite with the same id already exists.
    pub fn add(&mut self, message: &Message) -> bool {
        if self.contains(&message.id) {
            return false;
        }
        self.items.push(Favorite {
            message: message.clone(),
            added_at: Utc::now(),
        });
        self.persist();
        true
    }

    /// Returns false when no favorite has `id`.
    pub fn remove(&mut self, id: &MessageId) -> bool {
        let before = self.items.len();
        self.items.retain(|f| &f.message.id != id);
        if self.items.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Add if absent, remove if present. Returns whether the message is now a favorite.
    pub fn toggle(&mut self, message: &Message) -> bool {
        if self.remove(&message.id) {
            false
        } else {
            self.add(message)
        }
    }

    pub fn list(&self) -> &[Favorite] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn persist(&self) {
        if !self.storage.set(keys::FAVORITES, &self.items) {
            debug!("favorites kept in memory only");
        }
    }
}
