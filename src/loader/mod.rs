//! Loads the message pool from the bundled resource and an optional
//! secondary quotes resource.
//!
//! Failure never reaches the caller: a primary resource that is missing,
//! malformed or empty yields [`fallback_messages`] with `used_fallback` set.

use crate::message::{
    Message, MessageId, RawMessage, Season, fallback_messages, parse_message_document,
};
use crate::utils::expand_home;
use crate::utils::http::{MAX_RESOURCE_BYTES, capped_body};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Category given to secondary-source quotes that carry none.
pub const QUOTE_CATEGORY: &str = "quote";

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub messages: Vec<Message>,
    /// True when the hardcoded fallback list was returned.
    pub used_fallback: bool,
    /// Records contributed by the secondary resource after deduplication.
    pub secondary_count: usize,
}

fn is_remote(location: &str) -> bool {
    url::Url::parse(location).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Bytes of a resource given as a local path or an `http(s)` URL.
pub async fn read_resource(client: &Client, location: &str) -> Result<Vec<u8>> {
    if is_remote(location) {
        let resp = client
            .get(location)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", location))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", location))?;
        return capped_body(resp, MAX_RESOURCE_BYTES).await;
    }

    let path = expand_home(location);
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.len() > MAX_RESOURCE_BYTES {
        anyhow::bail!(
            "{} is larger than the {} byte limit",
            path.display(),
            MAX_RESOURCE_BYTES
        );
    }
    Ok(bytes)
}

/// Normalize primary records; records without an id get `msg_{index}`.
pub fn normalize_primary(raws: &[RawMessage]) -> Vec<Message> {
    raws.iter()
        .enumerate()
        .filter_map(|(index, raw)| raw.normalize(|| MessageId::Text(format!("msg_{}", index))))
        .collect()
}

/// Convert secondary-source records into messages. Ids are always
/// `quote_{index}`; the record's own id, time of day and season are discarded.
pub fn convert_quotes(raws: &[RawMessage], today: NaiveDate) -> Vec<Message> {
    let created = today.format("%Y-%m-%d").to_string();
    raws.iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let mut message = raw.normalize(|| MessageId::Numeric(0))?;
            message.id = MessageId::Text(format!("quote_{}", index));
            let has_category = raw
                .category
                .as_ref()
                .and_then(|v| v.as_str())
                .is_some_and(|c| !c.trim().is_empty());
            if !has_category {
                message.category = QUOTE_CATEGORY.to_string();
            }
            message.time_of_day = None;
            message.season = Some(Season::All);
            message.created_at = Some(created.clone());
            Some(message)
        })
        .collect()
}

/// Drop later duplicates: first by id, then by identical text.
pub fn dedupe(messages: Vec<Message>) -> Vec<Message> {
    let mut seen_ids = HashSet::new();
    let mut seen_texts = HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen_ids.insert(m.id.clone()))
        .filter(|m| seen_texts.insert(m.text.clone()))
        .collect()
}

async fn load_primary(client: &Client, location: &str) -> Result<Vec<Message>> {
    let bytes = read_resource(client, location).await?;
    let raws = parse_message_document(&bytes)
        .with_context(|| format!("Failed to parse {}", location))?;
    let messages = normalize_primary(&raws);
    if messages.is_empty() {
        anyhow::bail!("{} contains no usable messages", location);
    }
    Ok(messages)
}

async fn load_secondary(client: &Client, location: &str, today: NaiveDate) -> Result<Vec<Message>> {
    let bytes = read_resource(client, location).await?;
    let raws = parse_message_document(&bytes)
        .with_context(|| format!("Failed to parse {}", location))?;
    Ok(convert_quotes(&raws, today))
}

pub async fn load_messages(
    client: &Client,
    primary: &str,
    secondary: Option<&str>,
    today: NaiveDate,
) -> LoadOutcome {
    let secondary_fut = async {
        match secondary {
            Some(location) => Some(load_secondary(client, location, today).await),
            None => None,
        }
    };
    let (primary_result, secondary_result) =
        tokio::join!(load_primary(client, primary), secondary_fut);

    let mut messages = match primary_result {
        Ok(messages) => dedupe(messages),
        Err(e) => {
            warn!("using default messages: {:#}", e);
            return LoadOutcome {
                messages: fallback_messages(),
                used_fallback: true,
                secondary_count: 0,
            };
        }
    };
    let primary_count = messages.len();

    match secondary_result {
        Some(Ok(quotes)) => {
            debug!("secondary source provided {} quotes", quotes.len());
            messages.extend(quotes);
        }
        Some(Err(e)) => warn!("skipping secondary source: {:#}", e),
        None => {}
    }

    let before = messages.len();
    let messages = dedupe(messages);
    let secondary_count = messages.len().saturating_sub(primary_count);
    if messages.len() < before {
        debug!("dropped {} duplicate messages", before - messages.len());
    }
    info!("loaded {} messages", messages.len());
    LoadOutcome {
        messages,
        used_fallback: false,
        secondary_count,
    }
}
