use super::{MessageQuery, MessageSource};
use crate::message::Message;
use std::sync::Arc;
use tracing::{debug, warn};

/// A source that failed or came back empty during [`SourceChain::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source_name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ChainOutcome {
    /// First non-empty answer, or `None` when every source failed.
    pub messages: Option<Vec<Message>>,
    /// Name of the source that answered.
    pub served_by: Option<String>,
    pub failures: Vec<SourceFailure>,
}

impl ChainOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Ordered data sources. Each is tried in turn until one returns messages.
pub struct SourceChain {
    sources: Vec<Arc<dyn MessageSource>>,
}

impl SourceChain {
    pub fn new(sources: Vec<Arc<dyn MessageSource>>) -> Self {
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn load(&self, query: &MessageQuery) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();
        for source in &self.sources {
            let name = source.name().to_string();
            match source.fetch(query).await {
                Ok(messages) if !messages.is_empty() => {
                    debug!("source {} served {} messages", name, messages.len());
                    outcome.messages = Some(messages);
                    outcome.served_by = Some(name);
                    return outcome;
                }
                Ok(_) => {
                    debug!("source {} returned nothing, trying next", name);
                    outcome.failures.push(SourceFailure {
                        source_name: name,
                        reason: "no messages".to_string(),
                    });
                }
                Err(e) => {
                    warn!("source {} failed: {}, falling back", name, e);
                    outcome.failures.push(SourceFailure {
                        source_name: name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        warn!("every message source failed ({} tried)", self.sources.len());
        outcome
    }
}
