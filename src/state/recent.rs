use crate::message::{Message, MessageId};
use crate::storage::{Storage, keys};

/// Ids of recently shown messages, newest last. Lets separate CLI runs
/// avoid showing the same message twice in a row.
pub struct RecentMessages {
    storage: Storage,
    ids: Vec<MessageId>,
    limit: usize,
}

impl RecentMessages {
    pub fn load(storage: Storage, limit: usize) -> Self {
        let limit = limit.max(1);
        let mut ids: Vec<MessageId> = storage.get(keys::RECENT_MESSAGES, Vec::new());
        if ids.len() > limit {
            ids.drain(..ids.len() - limit);
        }
        Self {
            storage,
            ids,
            limit,
        }
    }

    pub fn push(&mut self, id: &MessageId) {
        self.ids.push(id.clone());
        if self.ids.len() > self.limit {
            self.ids.remove(0);
        }
        self.storage.set(keys::RECENT_MESSAGES, &self.ids);
    }

    pub fn last(&self) -> Option<&MessageId> {
        self.ids.last()
    }

    /// The most recently shown message, looked up in `pool`.
    pub fn last_in<'m>(&self, pool: &'m [Message]) -> Option<&'m Message> {
        let last = self.last()?;
        pool.iter().find(|m| &m.id == last)
    }

    pub fn ids(&self) -> &[MessageId] {
        &self.ids
    }
}
