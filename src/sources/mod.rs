//! Message data sources and the fallback chain over them.
//!
//! Every source yields normalized [`Message`]s for a [`MessageQuery`]. The
//! chain tries sources in order and keeps the first non-empty answer; a
//! failing source is recorded and skipped, never surfaced.

pub mod backend;
pub mod chain;
pub mod hybrid;
pub mod local;
pub mod quotes;

use crate::errors::DailyStartResult;
use crate::message::{Message, TimeOfDay};
use async_trait::async_trait;

pub use backend::BackendClient;
pub use chain::{ChainOutcome, SourceChain, SourceFailure};
pub use hybrid::HybridMessageManager;
pub use local::{BundledSource, StaticSource};
pub use quotes::QuoteApis;

/// Filter passed to sources. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageQuery {
    pub category: Option<String>,
    pub time_of_day: Option<TimeOfDay>,
    pub limit: Option<usize>,
}

impl MessageQuery {
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != crate::settings::ALL_CATEGORIES)
    }

    /// Category must match exactly; a message without a time of day suits any period.
    pub fn matches(&self, message: &Message) -> bool {
        if let Some(category) = self.category()
            && message.category != category
        {
            return false;
        }
        match (self.time_of_day, message.time_of_day) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }

    /// Apply [`Self::matches`] and the limit to a local list.
    pub fn apply(&self, messages: Vec<Message>) -> Vec<Message> {
        let filtered = messages.into_iter().filter(|m| self.matches(m));
        match self.limit {
            Some(limit) => filtered.take(limit).collect(),
            None => filtered.collect(),
        }
    }
}

#[async_trait]
pub trait MessageSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, query: &MessageQuery) -> DailyStartResult<Vec<Message>>;
}
