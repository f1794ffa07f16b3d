use crate::errors::{DailyStartError, DailyStartResult};
use crate::message::{DEFAULT_AUTHOR, Message, MessageId, MessageStatus, RawMessage, Season};
use crate::storage::{Storage, keys};
use crate::utils::sanitize::{MAX_AUTHOR_CHARS, MAX_CATEGORY_CHARS, MAX_TEXT_CHARS, sanitize_input};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

/// Outcome of [`Submissions::import_document`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Records without usable text.
    pub invalid: usize,
    /// Records whose id or text is already in the community pool.
    pub duplicates: usize,
}

/// User-submitted messages (`userMessages`) and the reviewed ones that joined
/// the pool (`communityMessages`).
pub struct Submissions {
    storage: Storage,
    submitted: Vec<Message>,
    community: Vec<Message>,
}

impl Submissions {
    pub fn load(storage: Storage) -> Self {
        let submitted = storage.get(keys::USER_MESSAGES, Vec::new());
        let community = storage.get(keys::COMMUNITY_MESSAGES, Vec::new());
        Self {
            storage,
            submitted,
            community,
        }
    }

    /// Store a new pending submission. Text and category are required.
    pub fn submit(
        &mut self,
        text: &str,
        author: Option<&str>,
        category: &str,
    ) -> DailyStartResult<Message> {
        let text = sanitize_input(text, MAX_TEXT_CHARS);
        if text.is_empty() {
            return Err(DailyStartError::Validation("message text is empty".into()));
        }
        let category = sanitize_input(category, MAX_CATEGORY_CHARS);
        if category.is_empty() {
            return Err(DailyStartError::Validation(
                "message category is empty".into(),
            ));
        }
        let author = author
            .map(|a| sanitize_input(a, MAX_AUTHOR_CHARS))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        let mut message = Message::new(
            format!("user_{}", uuid::Uuid::new_v4().simple()),
            text,
            author,
            category,
        )
        .with_season(Season::All)
        .with_source("user");
        message.created_at = Some(Utc::now().to_rfc3339());
        message.status = Some(MessageStatus::Pending);

        self.submitted.push(message.clone());
        self.storage.set(keys::USER_MESSAGES, &self.submitted);
        Ok(message)
    }

    fn review(&mut self, id: &MessageId, status: MessageStatus) -> DailyStartResult<Message> {
        let message = self
            .submitted
            .iter_mut()
            .find(|m| &m.id == id && m.status == Some(MessageStatus::Pending))
            .ok_or_else(|| {
                DailyStartError::Validation(format!("no pending submission with id '{}'", id))
            })?;
        message.status = Some(status);
        let reviewed = message.clone();
        self.storage.set(keys::USER_MESSAGES, &self.submitted);
        info!("submission {} marked {:?}", id, status);
        Ok(reviewed)
    }

    /// Approve a pending submission and add it to the community pool.
    pub fn approve(&mut self, id: &MessageId) -> DailyStartResult<Message> {
        let approved = self.review(id, MessageStatus::Approved)?;
        let community = approved.clone().with_source("community");
        self.community.push(community);
        self.storage.set(keys::COMMUNITY_MESSAGES, &self.community);
        Ok(approved)
    }

    /// Merge a message file into the community pool without review.
    ///
    /// The document is either a bare array of messages or `{"messages": [...]}`.
    /// Each record goes through [`RawMessage::normalize`]; records without an id
    /// get `import_{millis}_{index}`.
    pub fn import_document(
        &mut self,
        bytes: &[u8],
        today: NaiveDate,
    ) -> DailyStartResult<ImportReport> {
        let doc: Value = serde_json::from_slice(bytes)
            .map_err(|e| DailyStartError::Validation(format!("import file is not JSON: {}", e)))?;
        let items = match doc {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("messages") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(DailyStartError::Validation(
                        "import file has no \"messages\" array".into(),
                    ));
                }
            },
            _ => {
                return Err(DailyStartError::Validation(
                    "import file must be an array or an object with \"messages\"".into(),
                ));
            }
        };

        let mut seen_ids: HashSet<MessageId> =
            self.community.iter().map(|m| m.id.clone()).collect();
        let mut seen_texts: HashSet<String> =
            self.community.iter().map(|m| m.text.clone()).collect();
        let mut report = ImportReport::default();
        let stamp = Utc::now().timestamp_millis();

        for (i, item) in items.into_iter().enumerate() {
            let fallback_id = || MessageId::Text(format!("import_{}_{}", stamp, i));
            let normalized = serde_json::from_value::<RawMessage>(item)
                .ok()
                .and_then(|raw| raw.normalize(fallback_id));
            let Some(mut message) = normalized else {
                report.invalid += 1;
                continue;
            };
            if seen_ids.contains(&message.id) || seen_texts.contains(&message.text) {
                report.duplicates += 1;
                continue;
            }
            seen_ids.insert(message.id.clone());
            seen_texts.insert(message.text.clone());
            if message.created_at.is_none() {
                message.created_at = Some(today.format("%Y-%m-%d").to_string());
            }
            if message.source.is_none() {
                message.source = Some("file".into());
            }
            self.community.push(message);
            report.imported += 1;
        }

        if report.imported > 0 && !self.storage.set(keys::COMMUNITY_MESSAGES, &self.community) {
            warn!("imported messages could not be saved");
        }
        info!(
            "import: {} added, {} duplicates, {} invalid",
            report.imported, report.duplicates, report.invalid
        );
        Ok(report)
    }

    pub fn reject(&mut self, id: &MessageId) -> DailyStartResult<Message> {
        self.review(id, MessageStatus::Rejected)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Message> {
        self.submitted
            .iter()
            .filter(|m| m.status == Some(MessageStatus::Pending))
    }

    pub fn submitted(&self) -> &[Message] {
        &self.submitted
    }

    /// Approved messages that join the selection pool.
    pub fn community(&self) -> &[Message] {
        &self.community
    }
}

#[cfg(test)]
mod tests;
