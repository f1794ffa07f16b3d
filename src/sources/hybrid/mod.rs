//! Backend-first message access with local fallback.
//!
//! The backend is probed once per manager. After the first failure it is
//! abandoned for the rest of the session and every call goes to the bundled
//! file, then the hardcoded messages.

use super::backend::{BackendStats, CategoryCount};
use super::{BackendClient, BundledSource, MessageQuery, MessageSource, SourceChain, StaticSource};
use crate::errors::DailyStartError;
use crate::message::{Message, MessageId, TimeOfDay};
use crate::state::{ReactionKind, Reactions};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// A message plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub message: Message,
    pub source: String,
    /// Size of the pool the message was drawn from, when known.
    pub selected_from: Option<usize>,
}

/// Result of [`HybridMessageManager::add_reaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionReceipt {
    pub sent_to_backend: bool,
    pub recorded_locally: bool,
}

pub struct HybridMessageManager {
    backend: Option<BackendClient>,
    local: SourceChain,
    healthy: OnceCell<bool>,
    use_backend: AtomicBool,
}

impl HybridMessageManager {
    pub fn new(backend: Option<BackendClient>, bundled: BundledSource) -> Self {
        Self::with_fallback(backend, bundled, StaticSource::default())
    }

    pub fn with_fallback(
        backend: Option<BackendClient>,
        bundled: BundledSource,
        fallback: StaticSource,
    ) -> Self {
        let use_backend = backend.is_some();
        Self {
            backend,
            local: SourceChain::new(vec![Arc::new(bundled), Arc::new(fallback)]),
            healthy: OnceCell::new(),
            use_backend: AtomicBool::new(use_backend),
        }
    }

    /// The backend, if it passed its health check and has not failed since.
    async fn backend(&self) -> Option<&BackendClient> {
        let backend = self.backend.as_ref()?;
        if !self.use_backend.load(Ordering::Acquire) {
            return None;
        }
        let healthy = *self
            .healthy
            .get_or_init(|| async {
                let ok = backend.health().await;
                info!(
                    "backend {} {}",
                    backend.base_url(),
                    if ok { "connected" } else { "unavailable, using local data" }
                );
                ok
            })
            .await;
        if !healthy {
            self.use_backend.store(false, Ordering::Release);
            return None;
        }
        self.use_backend.load(Ordering::Acquire).then_some(backend)
    }

    fn abandon_backend(&self, what: &str, err: &DailyStartError) {
        if self.use_backend.swap(false, Ordering::AcqRel) {
            warn!("backend {} failed, using local data from now on: {}", what, err);
        }
    }

    pub fn is_using_backend(&self) -> bool {
        self.use_backend.load(Ordering::Acquire) && self.healthy.get().copied().unwrap_or(true)
    }

    /// Whether the backend was probed and found healthy.
    pub fn health_checked(&self) -> Option<bool> {
        self.healthy.get().copied()
    }

    pub async fn random_message(
        &self,
        category: Option<&str>,
        time_of_day: Option<TimeOfDay>,
        rng: &mut fastrand::Rng,
    ) -> Pick {
        if let Some(backend) = self.backend().await {
            match backend.random_message(category, time_of_day).await {
                Ok(message) => {
                    return Pick {
                        message,
                        source: backend.name().to_string(),
                        selected_from: None,
                    };
                }
                Err(e) => self.abandon_backend("random message", &e),
            }
        }

        let query = MessageQuery {
            category: category.map(str::to_string),
            time_of_day,
            limit: None,
        };
        let outcome = self.local.load(&query).await;
        if outcome.is_degraded() {
            for failure in &outcome.failures {
                debug!("local source {} skipped: {}", failure.source_name, failure.reason);
            }
        }
        let source = outcome.served_by.unwrap_or_else(|| "placeholder".to_string());
        match outcome.messages {
            Some(pool) if !pool.is_empty() => {
                let selected_from = pool.len();
                let message = pool[rng.usize(..selected_from)].clone();
                Pick {
                    message,
                    source,
                    selected_from: Some(selected_from),
                }
            }
            _ => Pick {
                message: Message::placeholder(),
                source,
                selected_from: None,
            },
        }
    }

    pub async fn messages(&self, query: &MessageQuery) -> Vec<Message> {
        if let Some(backend) = self.backend().await {
            match backend.messages(query).await {
                Ok(messages) => return messages,
                Err(e) => self.abandon_backend("message list", &e),
            }
        }
        self.local.load(query).await.messages.unwrap_or_default()
    }

    /// Category names with message counts, most populated first.
    pub async fn categories(&self) -> Vec<CategoryCount> {
        if let Some(backend) = self.backend().await {
            match backend.categories().await {
                Ok(categories) => return categories,
                Err(e) => self.abandon_backend("category list", &e),
            }
        }
        let messages = self
            .local
            .load(&MessageQuery::default())
            .await
            .messages
            .unwrap_or_default();
        count_categories(&messages)
    }

    /// Send the reaction to the backend when it is in use, and always record
    /// it locally.
    pub async fn add_reaction(
        &self,
        id: &MessageId,
        kind: ReactionKind,
        reactions: &mut Reactions,
    ) -> ReactionReceipt {
        let mut sent_to_backend = false;
        if let Some(backend) = self.backend().await {
            match backend.add_reaction(id, kind).await {
                Ok(resp) => {
                    debug!("backend accepted reaction: {}", resp.message);
                    sent_to_backend = true;
                }
                Err(e) => self.abandon_backend("reaction", &e),
            }
        }
        ReactionReceipt {
            sent_to_backend,
            recorded_locally: reactions.add(id, kind),
        }
    }

    /// Aggregate stats; only the backend has them.
    pub async fn stats(&self) -> Option<BackendStats> {
        let backend = self.backend().await?;
        match backend.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                self.abandon_backend("stats", &e);
                None
            }
        }
    }
}

pub fn count_categories(messages: &[Message]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for m in messages {
        *counts.entry(m.category.as_str()).or_default() += 1;
    }
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}
