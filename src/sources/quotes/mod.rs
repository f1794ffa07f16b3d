//! Third-party quote APIs (Quotable and ZenQuotes), fetched concurrently.
//!
//! Either API may be down; whatever the other returns is still used. No
//! retries on this path.

use super::{MessageQuery, MessageSource};
use crate::config::QuoteApisConfig;
use crate::errors::{DailyStartError, DailyStartResult};
use crate::message::{Message, MessageId, RawMessage, Season, TimeOfDay};
use crate::utils::http::{MAX_RESOURCE_BYTES, capped_body, http_client};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "quote-apis";

/// Category for quotes whose tags map to nothing.
pub const DEFAULT_QUOTE_CATEGORY: &str = "quote";
/// Category for every ZenQuotes quote, which carry no tags.
pub const ZEN_CATEGORY: &str = "inspiration";

const TAG_CATEGORIES: &[(&str, &str)] = &[
    ("inspirational", "inspiration"),
    ("motivational", "motivation"),
    ("success", "success"),
    ("wisdom", "wisdom"),
    ("happiness", "happiness"),
    ("life", "life"),
    ("love", "love"),
    ("courage", "courage"),
];

const MORNING_KEYWORDS: &[&str] = &["morning", "start", "begin", "dawn"];
const EVENING_KEYWORDS: &[&str] = &["evening", "end", "reflect", "sunset"];

#[derive(Debug, Deserialize)]
struct QuotableResponse {
    #[serde(default)]
    results: Vec<QuotableQuote>,
}

#[derive(Debug, Deserialize)]
struct QuotableQuote {
    #[serde(default, rename = "_id")]
    id: Option<String>,
    content: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ZenQuote {
    q: String,
    #[serde(default)]
    a: Option<String>,
}

/// Map Quotable tags to a category: the first tag, translated when known.
pub fn category_for_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim().to_ascii_lowercase())
        .find(|t| !t.is_empty())
        .map_or_else(
            || DEFAULT_QUOTE_CATEGORY.to_string(),
            |tag| {
                TAG_CATEGORIES
                    .iter()
                    .find(|(from, _)| *from == tag)
                    .map_or(tag.clone(), |(_, to)| (*to).to_string())
            },
        )
}

/// Keyword guess at a fitting time of day. Morning keywords win.
pub fn suggest_time_of_day(text: &str) -> Option<TimeOfDay> {
    let lower = text.to_lowercase();
    if MORNING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Some(TimeOfDay::Morning)
    } else if EVENING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Some(TimeOfDay::Evening)
    } else {
        None
    }
}

/// Build a message through the normal sanitizing path.
fn quote_message(
    id: String,
    text: &str,
    author: Option<&str>,
    category: &str,
    source: &str,
) -> Option<Message> {
    let raw = RawMessage {
        id: Some(Value::String(id)),
        text: Some(Value::String(text.to_string())),
        author: author.map(|a| Value::String(a.to_string())),
        category: Some(Value::String(category.to_string())),
        created_at: Some(Value::String(Local::now().format("%Y-%m-%d").to_string())),
        source: Some(Value::String(source.to_string())),
        ..RawMessage::default()
    };
    let mut message = raw.normalize(|| MessageId::Text(DEFAULT_QUOTE_CATEGORY.into()))?;
    message.time_of_day = suggest_time_of_day(&message.text);
    message.season = Some(Season::All);
    Some(message)
}

pub struct QuoteApis {
    client: Client,
    quotable_url: String,
    zenquotes_url: String,
    quotable_limit: usize,
    zenquotes_limit: usize,
}

impl QuoteApis {
    pub fn new(config: &QuoteApisConfig) -> Self {
        Self {
            client: http_client(Duration::from_secs(config.timeout_secs)),
            quotable_url: config.quotable_url.trim_end_matches('/').to_string(),
            zenquotes_url: config.zenquotes_url.trim_end_matches('/').to_string(),
            quotable_limit: config.quotable_limit,
            zenquotes_limit: config.zenquotes_limit,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()?;
        let body = capped_body(resp, MAX_RESOURCE_BYTES).await?;
        serde_json::from_slice(&body).with_context(|| format!("Invalid JSON from {}", url))
    }

    pub async fn fetch_quotable(&self) -> Result<Vec<Message>> {
        let url = format!("{}/quotes", self.quotable_url);
        let query = [
            ("limit", self.quotable_limit.to_string()),
            ("tags", "inspirational,motivational".to_string()),
        ];
        let resp: QuotableResponse = self.get_json(&url, &query).await?;
        Ok(resp
            .results
            .iter()
            .enumerate()
            .filter_map(|(i, q)| {
                let id = q
                    .id
                    .as_deref()
                    .filter(|id| !id.is_empty())
                    .map_or_else(|| format!("quotable_{}", i), |id| format!("quotable_{}", id));
                quote_message(
                    id,
                    &q.content,
                    q.author.as_deref(),
                    &category_for_tags(&q.tags),
                    "quotable",
                )
            })
            .collect())
    }

    pub async fn fetch_zenquotes(&self) -> Result<Vec<Message>> {
        let url = format!("{}/quotes", self.zenquotes_url);
        let resp: Vec<ZenQuote> = self.get_json(&url, &[]).await?;
        Ok(resp
            .iter()
            .take(self.zenquotes_limit)
            .enumerate()
            .filter_map(|(i, q)| {
                quote_message(
                    format!("zen_{}", i),
                    &q.q,
                    q.a.as_deref(),
                    ZEN_CATEGORY,
                    "zenquotes",
                )
            })
            .collect())
    }

    /// Quotes from both APIs. A failing API contributes nothing.
    pub async fn collect(&self) -> Vec<Message> {
        let (quotable, zen) = tokio::join!(self.fetch_quotable(), self.fetch_zenquotes());
        let mut all = Vec::new();
        for (name, result) in [("quotable", quotable), ("zenquotes", zen)] {
            match result {
                Ok(quotes) => {
                    debug!("{} returned {} quotes", name, quotes.len());
                    all.extend(quotes);
                }
                Err(e) => warn!("{} unavailable: {:#}", name, e),
            }
        }
        all
    }
}

#[async_trait]
impl MessageSource for QuoteApis {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &MessageQuery) -> DailyStartResult<Vec<Message>> {
        let all = self.collect().await;
        if all.is_empty() {
            return Err(DailyStartError::source_failure(
                SOURCE_NAME,
                "no quote API returned anything",
                true,
            ));
        }
        Ok(query.apply(all))
    }
}
