use super::{MessageQuery, MessageSource};
use crate::errors::{DailyStartError, DailyStartResult};
use crate::loader::{normalize_primary, read_resource};
use crate::message::{Message, fallback_messages, parse_message_document};
use async_trait::async_trait;
use reqwest::Client;

/// The bundled `messages.json`, read from a path or URL on every fetch.
pub struct BundledSource {
    client: Client,
    location: String,
}

impl BundledSource {
    pub fn new(client: Client, location: impl Into<String>) -> Self {
        Self {
            client,
            location: location.into(),
        }
    }
}

#[async_trait]
impl MessageSource for BundledSource {
    fn name(&self) -> &str {
        "bundled"
    }

    async fn fetch(&self, query: &MessageQuery) -> DailyStartResult<Vec<Message>> {
        let bytes = read_resource(&self.client, &self.location)
            .await
            .map_err(|e| DailyStartError::source_failure("bundled", format!("{:#}", e), false))?;
        let raws = parse_message_document(&bytes)
            .map_err(|e| DailyStartError::source_failure("bundled", format!("{:#}", e), false))?;
        Ok(query.apply(normalize_primary(&raws)))
    }
}

/// Hardcoded messages; the last link of every chain.
pub struct StaticSource {
    messages: Vec<Message>,
}

impl StaticSource {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl Default for StaticSource {
    fn default() -> Self {
        Self::new(fallback_messages())
    }
}

#[async_trait]
impl MessageSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    /// Filters like any other source, but never comes back empty while it
    /// holds messages.
    async fn fetch(&self, query: &MessageQuery) -> DailyStartResult<Vec<Message>> {
        let filtered = query.apply(self.messages.clone());
        if filtered.is_empty() {
            Ok(self.messages.clone())
        } else {
            Ok(filtered)
        }
    }
}
