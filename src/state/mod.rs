//! Application state: the loaded message pool, the current message and the
//! persisted collections built around it.

pub mod favorites;
pub mod history;
pub mod reactions;
pub mod recent;

pub use favorites::{Favorite, Favorites};
pub use history::{History, HistoryEntry};
pub use reactions::{ReactionCounts, ReactionKind, Reactions};
pub use recent::RecentMessages;

use crate::config::Config;
use crate::loader::{self, LoadOutcome};
use crate::message::{Message, MessageId};
use crate::personal::{Streak, Submissions};
use crate::selection::{Selection, Selector};
use crate::settings::Settings;
use crate::sources::{BackendClient, BundledSource, HybridMessageManager, QuoteApis};
use crate::storage::{CacheIndex, MessageCache, Storage};
use crate::utils::ensure_dir;
use crate::utils::http::http_client;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cache key for quotes fetched from the third-party APIs.
pub const QUOTES_CACHE_KEY: &str = "quotes";

const CACHE_DB_FILE: &str = "cache.db";

pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub cache: MessageCache,
    pub client: Client,
    pub messages: Vec<Message>,
    /// True when the pool is the hardcoded fallback list.
    pub used_fallback: bool,
    pub current: Option<Message>,
    pub settings: Settings,
    pub favorites: Favorites,
    pub history: History,
    pub reactions: Reactions,
    pub recent: RecentMessages,
    pub submissions: Submissions,
    pub streak: Streak,
    session_id: String,
    rng: fastrand::Rng,
}

impl AppState {
    pub fn new(config: Config, storage: Storage, cache: MessageCache) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let client = http_client(Duration::from_secs(config.sources.backend.timeout_secs));
        Self {
            settings: Settings::load(&storage),
            favorites: Favorites::load(storage.clone()),
            history: History::load(
                storage.clone(),
                config.storage.history_limit,
                session_id.clone(),
            ),
            reactions: Reactions::load(storage.clone()),
            recent: RecentMessages::load(storage.clone(), config.storage.recent_limit),
            submissions: Submissions::load(storage.clone()),
            streak: Streak::load(storage.clone()),
            messages: Vec::new(),
            used_fallback: false,
            current: None,
            session_id,
            rng: fastrand::Rng::new(),
            client,
            cache,
            storage,
            config,
        }
    }

    /// Open the on-disk storage and cache index under the configured directory.
    ///
    /// A cache index that cannot be opened is skipped; the key-value copy
    /// still works on its own. Unusable storage falls back to memory.
    pub fn open(config: Config) -> Result<Self> {
        let dir = ensure_dir(config.storage_dir()?)?;
        let storage = match Storage::open_dir(&dir, config.storage.quota_bytes) {
            Ok(storage) => storage,
            Err(e) => {
                warn!("storage unavailable, nothing will be saved this run: {:#}", e);
                Storage::in_memory()
            }
        };
        let index = match CacheIndex::open(dir.join(CACHE_DB_FILE)) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("cache index unavailable: {:#}", e);
                None
            }
        };
        let cache = MessageCache::new(storage.clone(), index)
            .with_ttl(Duration::from_secs(config.storage.cache_ttl_secs));
        Ok(Self::new(config, storage, cache))
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn rng(&mut self) -> &mut fastrand::Rng {
        &mut self.rng
    }

    /// Fill the pool: bundled and secondary resources, approved community
    /// messages, and quote API messages when enabled.
    pub async fn load_pool(&mut self, today: NaiveDate) -> LoadOutcome {
        let sources = &self.config.sources;
        let mut outcome = loader::load_messages(
            &self.client,
            &sources.messages_path,
            sources.quotes_path.as_deref(),
            today,
        )
        .await;

        let mut pool = outcome.messages.clone();
        pool.extend(self.submissions.community().iter().cloned());
        if sources.quote_apis.enabled {
            pool.extend(self.quote_api_messages().await);
        }
        self.messages = loader::dedupe(pool);
        self.used_fallback = outcome.used_fallback;
        outcome.messages.clone_from(&self.messages);
        outcome
    }

    async fn quote_api_messages(&self) -> Vec<Message> {
        let apis = &self.config.sources.quote_apis;
        if apis.use_cache
            && let Some(cached) = self.cache.get_cache::<Vec<Message>>(QUOTES_CACHE_KEY)
        {
            debug!("using {} cached API quotes", cached.len());
            return cached;
        }
        let quotes = QuoteApis::new(apis).collect().await;
        if apis.use_cache && !quotes.is_empty() {
            self.cache.set_cache(QUOTES_CACHE_KEY, &quotes);
        }
        info!("fetched {} quotes from quote APIs", quotes.len());
        quotes
    }

    /// Backend-first access for remote-only operations (categories, stats,
    /// reactions). `None` when the backend is disabled.
    pub fn hybrid_manager(&self) -> HybridMessageManager {
        let backend = self
            .config
            .sources
            .backend
            .enabled
            .then(|| BackendClient::new(&self.config.sources.backend));
        HybridMessageManager::new(
            backend,
            BundledSource::new(self.client.clone(), self.config.sources.messages_path.clone()),
        )
    }

    /// Select the next message, make it current and record the view.
    pub fn display_random_message(&mut self, now: NaiveDateTime) -> Selection {
        let previous = self
            .current
            .clone()
            .or_else(|| self.recent.last_in(&self.messages).cloned());
        let selection = Selector::new(&self.settings, self.config.selection).select(
            &self.messages,
            now,
            previous.as_ref(),
            &mut self.rng,
        );
        self.record_view(&selection.message, now.date());
        selection
    }

    /// Make `message` current and record the view in history, the recent
    /// list and the visit streak.
    pub fn record_view(&mut self, message: &Message, today: NaiveDate) {
        self.history.record(message);
        self.recent.push(&message.id);
        self.streak.visit(today);
        self.current = Some(message.clone());
    }

    /// Look a message up in the pool, then in favorites and history.
    pub fn find_message(&self, id: &MessageId) -> Option<Message> {
        self.messages
            .iter()
            .find(|m| &m.id == id)
            .or_else(|| {
                self.favorites
                    .list()
                    .iter()
                    .map(|f| &f.message)
                    .find(|m| &m.id == id)
            })
            .or_else(|| {
                self.history
                    .entries()
                    .iter()
                    .rev()
                    .map(|e| &e.message)
                    .find(|m| &m.id == id)
            })
            .cloned()
    }

    /// The message the user is looking at: the current one, else the last shown.
    pub fn current_or_last(&self) -> Option<Message> {
        if let Some(current) = &self.current {
            return Some(current.clone());
        }
        let last = self.recent.last()?;
        self.find_message(last)
    }

    /// Distinct categories in the pool, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.messages.iter().map(|m| m.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }
}
