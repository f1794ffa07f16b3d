use crate::errors::DailyStartError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

fn default_quota_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_history_limit() -> usize {
    100
}

fn default_recent_limit() -> usize {
    10
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for `storage.json` and `cache.db`. Defaults to the daily-start home.
    #[serde(default)]
    pub dir: Option<String>,
    /// Byte quota for the key-value store, mirroring a browser origin's limit.
    #[serde(default = "default_quota_bytes", rename = "quotaBytes")]
    pub quota_bytes: usize,
    #[serde(default = "default_history_limit", rename = "historyLimit")]
    pub history_limit: usize,
    /// How many recently shown message ids are remembered across runs.
    #[serde(default = "default_recent_limit", rename = "recentLimit")]
    pub recent_limit: usize,
    #[serde(default = "default_cache_ttl_secs", rename = "cacheTtlSecs")]
    pub cache_ttl_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            quota_bytes: default_quota_bytes(),
            history_limit: default_history_limit(),
            recent_limit: default_recent_limit(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

fn default_messages_path() -> String {
    "messages.json".to_string()
}

fn default_quotes_path() -> Option<String> {
    Some("quotes.json".to_string())
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_quotable_url() -> String {
    "https://api.quotable.io".to_string()
}

fn default_zenquotes_url() -> String {
    "https://zenquotes.io/api".to_string()
}

fn default_quotable_limit() -> usize {
    5
}

fn default_zenquotes_limit() -> usize {
    10
}

/// Optional REST backend. Used only when enabled and its health check passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_backend_url", rename = "baseUrl")]
    pub base_url: String,
    /// Per-attempt request timeout.
    #[serde(default = "default_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries", rename = "maxRetries")]
    pub max_retries: u32,
    /// Backoff before retry `n` is `2^n * backoffBaseMs`.
    #[serde(default = "default_backoff_base_ms", rename = "backoffBaseMs")]
    pub backoff_base_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteApisConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_quotable_url", rename = "quotableUrl")]
    pub quotable_url: String,
    #[serde(default = "default_zenquotes_url", rename = "zenQuotesUrl")]
    pub zenquotes_url: String,
    #[serde(default = "default_quotable_limit", rename = "quotableLimit")]
    pub quotable_limit: usize,
    #[serde(default = "default_zenquotes_limit", rename = "zenQuotesLimit")]
    pub zenquotes_limit: usize,
    #[serde(default = "default_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
    /// Cache fetched quotes for the storage cache TTL instead of refetching every run.
    #[serde(default = "default_true", rename = "useCache")]
    pub use_cache: bool,
}

impl Default for QuoteApisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            quotable_url: default_quotable_url(),
            zenquotes_url: default_zenquotes_url(),
            quotable_limit: default_quotable_limit(),
            zenquotes_limit: default_zenquotes_limit(),
            timeout_secs: default_timeout_secs(),
            use_cache: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Bundled message resource: a local path or an http(s) URL.
    #[serde(default = "default_messages_path", rename = "messagesPath")]
    pub messages_path: String,
    /// Optional secondary resource merged into the bundled messages.
    #[serde(default = "default_quotes_path", rename = "quotesPath")]
    pub quotes_path: Option<String>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default, rename = "quoteApis")]
    pub quote_apis: QuoteApisConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            messages_path: default_messages_path(),
            quotes_path: default_quotes_path(),
            backend: BackendConfig::default(),
            quote_apis: QuoteApisConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

fn default_seasonal_probability() -> f64 {
    0.7
}

fn default_event_probability() -> f64 {
    0.6
}

fn default_time_of_day_probability() -> f64 {
    0.7
}

/// Probabilities of the soft selection preferences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(
        default = "default_seasonal_probability",
        rename = "seasonalProbability"
    )]
    pub seasonal_probability: f64,
    #[serde(default = "default_event_probability", rename = "eventProbability")]
    pub event_probability: f64,
    #[serde(
        default = "default_time_of_day_probability",
        rename = "timeOfDayProbability"
    )]
    pub time_of_day_probability: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            seasonal_probability: default_seasonal_probability(),
            event_probability: default_event_probability(),
            time_of_day_probability: default_time_of_day_probability(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

impl Config {
    /// Directory holding persisted state.
    pub fn storage_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.storage.dir {
            Some(dir) if !dir.trim().is_empty() => Ok(crate::utils::expand_home(dir)),
            _ => crate::utils::get_daily_start_home(),
        }
    }

    pub fn validate(&self) -> Result<(), DailyStartError> {
        self.validate_storage()?;
        self.validate_sources()?;
        self.validate_selection()?;
        Ok(())
    }

    fn validate_storage(&self) -> Result<(), DailyStartError> {
        let s = &self.storage;
        if s.quota_bytes < 1024 {
            return Err(DailyStartError::Config(
                "storage.quotaBytes must be at least 1024".into(),
            ));
        }
        if s.history_limit == 0 {
            return Err(DailyStartError::Config(
                "storage.historyLimit must be > 0".into(),
            ));
        }
        if s.history_limit > 10_000 {
            return Err(DailyStartError::Config(
                "storage.historyLimit is unreasonably large (> 10,000)".into(),
            ));
        }
        if s.recent_limit == 0 {
            return Err(DailyStartError::Config(
                "storage.recentLimit must be > 0".into(),
            ));
        }
        Ok(())
    }

    fn validate_sources(&self) -> Result<(), DailyStartError> {
        let src = &self.sources;
        if src.messages_path.trim().is_empty() {
            return Err(DailyStartError::Config(
                "sources.messagesPath must not be empty".into(),
            ));
        }

        let backend = &src.backend;
        if backend.enabled {
            validate_http_url("sources.backend.baseUrl", &backend.base_url)?;
        }
        if backend.timeout_secs == 0 {
            return Err(DailyStartError::Config(
                "sources.backend.timeoutSecs must be > 0".into(),
            ));
        }
        if backend.max_retries == 0 || backend.max_retries > 10 {
            return Err(DailyStartError::Config(
                "sources.backend.maxRetries must be between 1 and 10".into(),
            ));
        }

        let apis = &src.quote_apis;
        if apis.enabled {
            validate_http_url("sources.quoteApis.quotableUrl", &apis.quotable_url)?;
            validate_http_url("sources.quoteApis.zenQuotesUrl", &apis.zenquotes_url)?;
        }
        if apis.timeout_secs == 0 {
            return Err(DailyStartError::Config(
                "sources.quoteApis.timeoutSecs must be > 0".into(),
            ));
        }
        Ok(())
    }

    fn validate_selection(&self) -> Result<(), DailyStartError> {
        let sel = &self.selection;
        for (name, p) in [
            ("seasonalProbability", sel.seasonal_probability),
            ("eventProbability", sel.event_probability),
            ("timeOfDayProbability", sel.time_of_day_probability),
        ] {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(DailyStartError::Config(format!(
                    "selection.{} must be a finite number between 0.0 and 1.0",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), DailyStartError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| DailyStartError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(DailyStartError::Config(format!(
            "{} must use http or https",
            field
        )));
    }
    Ok(())
}
