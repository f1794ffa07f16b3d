//! Client for the optional REST backend.

use super::{MessageQuery, MessageSource};
use crate::config::BackendConfig;
use crate::errors::{DailyStartError, DailyStartResult};
use crate::message::{Message, MessageId, RawMessage, TimeOfDay};
use crate::state::ReactionKind;
use crate::utils::http::http_client;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "backend";

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RandomMessageResponse {
    message: RawMessage,
    #[serde(default)]
    metadata: Option<RandomMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RandomMetadata {
    #[serde(default)]
    selected_from: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactionResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reaction: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularCategory {
    pub category: String,
    #[serde(default)]
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStats {
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub today_views: u64,
    #[serde(default)]
    pub popular_categories: Vec<PopularCategory>,
}

/// Reaction names on the wire. The backend calls a heart "love".
fn wire_reaction(kind: ReactionKind) -> &'static str {
    match kind {
        ReactionKind::Like => "like",
        ReactionKind::Heart => "love",
        ReactionKind::Fire => "fire",
    }
}

/// Whether a failed status is worth another attempt.
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

pub struct BackendClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
    backoff_base: Duration,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: http_client(Duration::from_secs(config.timeout_secs)),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_retries.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Delay after failed attempt `attempt` (1-based): `2^attempt * base`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once<T: DeserializeOwned>(&self, request: RequestBuilder) -> DailyStartResult<T> {
        let resp = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DailyStartError::source_failure(SOURCE_NAME, e.to_string(), true))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DailyStartError::source_failure(
                SOURCE_NAME,
                format!("HTTP {}", status),
                is_retryable_status(status),
            ));
        }
        resp.json::<T>().await.map_err(|e| {
            DailyStartError::source_failure(SOURCE_NAME, format!("invalid response: {}", e), false)
        })
    }

    /// Send with retries. `build` is called once per attempt.
    async fn request<T, F>(&self, build: F) -> DailyStartResult<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            match self.send_once(build(&self.client)).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        "backend request attempt {}/{} failed: {}",
                        attempt, self.max_attempts, e
                    );
                    if attempt >= self.max_attempts || !e.is_retryable() {
                        return Err(e);
                    }
                    let delay = self.backoff_delay(attempt);
                    debug!("waiting {}ms before retry", delay.as_millis());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Single-attempt health probe. Any failure reads as unhealthy.
    pub async fn health(&self) -> bool {
        let url = self.url("/health");
        match self
            .send_once::<HealthResponse>(self.client.get(&url))
            .await
        {
            Ok(health) => health.status == "healthy",
            Err(e) => {
                debug!("backend health check failed: {}", e);
                false
            }
        }
    }

    fn filter_params(
        category: Option<&str>,
        time_of_day: Option<TimeOfDay>,
    ) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category) = category.filter(|c| *c != crate::settings::ALL_CATEGORIES) {
            params.push(("category", category.to_string()));
        }
        if let Some(tod) = time_of_day {
            params.push(("time_of_day", tod.as_str().to_string()));
        }
        params
    }

    pub async fn random_message(
        &self,
        category: Option<&str>,
        time_of_day: Option<TimeOfDay>,
    ) -> DailyStartResult<Message> {
        let url = self.url("/api/messages/random");
        let params = Self::filter_params(category, time_of_day);
        let resp: RandomMessageResponse = self
            .request(|c| c.get(&url).query(&params))
            .await?;
        if let Some(selected_from) = resp.metadata.and_then(|m| m.selected_from) {
            debug!("backend picked from {} messages", selected_from);
        }
        resp.message
            .normalize(|| MessageId::Text("backend_0".into()))
            .map(|m| m.with_source(SOURCE_NAME))
            .ok_or_else(|| {
                DailyStartError::source_failure(SOURCE_NAME, "message without text", false)
            })
    }

    pub async fn messages(&self, query: &MessageQuery) -> DailyStartResult<Vec<Message>> {
        let url = self.url("/api/messages");
        let mut params = Self::filter_params(query.category(), query.time_of_day);
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        params.push(("random_order", "true".to_string()));
        let resp: MessagesResponse = self.request(|c| c.get(&url).query(&params)).await?;
        Ok(resp
            .messages
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| raw.normalize(|| MessageId::Text(format!("backend_{}", i))))
            .map(|m| m.with_source(SOURCE_NAME))
            .collect())
    }

    pub async fn categories(&self) -> DailyStartResult<Vec<CategoryCount>> {
        let url = self.url("/api/categories");
        let resp: CategoriesResponse = self.request(|c| c.get(&url)).await?;
        Ok(resp.categories)
    }

    pub async fn add_reaction(
        &self,
        id: &MessageId,
        kind: ReactionKind,
    ) -> DailyStartResult<ReactionResponse> {
        let url = self.url(&format!("/api/messages/{}/reaction", id));
        let reaction = wire_reaction(kind);
        let body = serde_json::json!({ "reaction": reaction });
        self.request(|c| {
            c.request(Method::POST, &url)
                .query(&[("reaction", reaction)])
                .json(&body)
        })
        .await
    }

    pub async fn stats(&self) -> DailyStartResult<BackendStats> {
        let url = self.url("/api/stats");
        self.request(|c| c.get(&url)).await
    }
}

#[async_trait]
impl MessageSource for BackendClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &MessageQuery) -> DailyStartResult<Vec<Message>> {
        self.messages(query).await
    }
}
