//! Message records and the load-time normalization boundary.
//!
//! Messages arrive from several uncoordinated sources (bundled JSON, the REST
//! backend, third-party quote APIs, user submissions), each with its own id
//! scheme and optional fields. Everything is read through [`RawMessage`] and
//! turned into a strict [`Message`] by [`RawMessage::normalize`].

use crate::utils::sanitize::{
    MAX_AUTHOR_CHARS, MAX_CATEGORY_CHARS, MAX_TEXT_CHARS, sanitize_input,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_AUTHOR: &str = "Anonymous";
pub const DEFAULT_CATEGORY: &str = "etc";

/// Message identifier. Numeric ids come from the bundled data and the
/// backend; prefixed string ids (`quote_3`, `zen_…`, `user_…`) from everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Numeric(i64),
    Text(String),
}

impl MessageId {
    /// Parse user input: digits become a numeric id, anything else a text id.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Text(trimmed.to_string()), Self::Numeric)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for MessageId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

impl From<i32> for MessageId {
    fn from(n: i32) -> Self {
        Self::Numeric(i64::from(n))
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Enum values that are read leniently from loosely-typed JSON: an empty or
/// unknown string maps to `None` instead of failing the whole record.
pub trait LenientParse: Sized {
    fn parse_lenient(value: &str) -> Option<Self>;
}

fn lenient_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: LenientParse,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(T::parse_lenient))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

impl LenientParse for TimeOfDay {
    fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            "night" => Some(Self::Night),
            _ => None,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    All,
}

impl Season {
    /// Season for a 1-based month number.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Autumn,
            _ => Self::Winter,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
            Self::All => "all",
        }
    }
}

impl LenientParse for Season {
    fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "spring" => Some(Self::Spring),
            "summer" => Some(Self::Summer),
            "autumn" | "fall" => Some(Self::Autumn),
            "winter" => Some(Self::Winter),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a message. Bundled and remote messages are `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Active,
    Pending,
    Approved,
    Rejected,
}

impl LenientParse for MessageStatus {
    fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub author: String,
    pub category: String,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub season: Option<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<MessageStatus>,
}

impl Message {
    pub fn new(
        id: impl Into<MessageId>,
        text: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: author.into(),
            category: category.into(),
            time_of_day: None,
            season: None,
            special_day: None,
            event: None,
            created_at: None,
            source: None,
            status: None,
        }
    }

    #[must_use]
    pub fn with_time_of_day(mut self, time_of_day: TimeOfDay) -> Self {
        self.time_of_day = Some(time_of_day);
        self
    }

    #[must_use]
    pub fn with_season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    #[must_use]
    pub fn with_special_day(mut self, special_day: impl Into<String>) -> Self {
        self.special_day = Some(special_day.into());
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Two records describe the same message when both id and text agree.
    pub fn same_as(&self, other: &Message) -> bool {
        self.id == other.id && self.text == other.text
    }

    /// The message shown when no other message is available at all.
    pub fn placeholder() -> Self {
        Self::new(
            1,
            "A new morning begins. Have a good day today!",
            "Morning",
            "new-beginnings",
        )
        .with_time_of_day(TimeOfDay::Morning)
        .with_season(Season::All)
    }
}

/// Hardcoded messages used when no data source yields anything.
pub fn fallback_messages() -> Vec<Message> {
    vec![
        Message::new(
            "fallback_1",
            "A new day is starting. Believe in the things you can do today.",
            "Start of the Day",
            "new-beginnings",
        )
        .with_time_of_day(TimeOfDay::Morning)
        .with_season(Season::All)
        .with_source("fallback"),
        Message::new(
            "fallback_2",
            "Small progress is still progress. Encourage yourself.",
            "Start of the Day",
            "motivation",
        )
        .with_season(Season::All)
        .with_source("fallback"),
        Message::new(
            "fallback_3",
            "Begin today with a grateful heart.",
            "Start of the Day",
            "gratitude",
        )
        .with_time_of_day(TimeOfDay::Morning)
        .with_season(Season::All)
        .with_source("fallback"),
    ]
}

/// Loosely-typed message record as found in JSON resources.
///
/// Every field is optional and of any JSON type; [`RawMessage::normalize`]
/// decides what survives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub time_of_day: Option<Value>,
    #[serde(default)]
    pub season: Option<Value>,
    #[serde(default)]
    pub special_day: Option<Value>,
    #[serde(default)]
    pub event: Option<Value>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
}

fn text_field(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl RawMessage {
    /// Convert to a strict [`Message`]. Returns `None` when `text` is missing
    /// or blank. Missing fields receive defaults; `fallback_id` is used only
    /// when the record has no usable id.
    pub fn normalize(&self, fallback_id: impl FnOnce() -> MessageId) -> Option<Message> {
        let text = text_field(self.text.as_ref())?;
        let text = sanitize_input(text, MAX_TEXT_CHARS);
        if text.trim().is_empty() {
            return None;
        }

        let id = match &self.id {
            Some(Value::Number(n)) => n.as_i64().map(MessageId::Numeric),
            Some(Value::String(s)) if !s.trim().is_empty() => {
                Some(MessageId::Text(s.trim().to_string()))
            }
            _ => None,
        }
        .unwrap_or_else(fallback_id);

        let author = sanitize_input(
            text_field(self.author.as_ref()).unwrap_or(DEFAULT_AUTHOR),
            MAX_AUTHOR_CHARS,
        );
        let category = sanitize_input(
            text_field(self.category.as_ref()).unwrap_or(DEFAULT_CATEGORY),
            MAX_CATEGORY_CHARS,
        );

        Some(Message {
            id,
            text,
            author,
            category,
            time_of_day: text_field(self.time_of_day.as_ref()).and_then(TimeOfDay::parse_lenient),
            season: text_field(self.season.as_ref()).and_then(Season::parse_lenient),
            special_day: text_field(self.special_day.as_ref()).map(str::to_ascii_lowercase),
            event: text_field(self.event.as_ref()).map(str::to_ascii_lowercase),
            created_at: text_field(self.created_at.as_ref()).map(str::to_string),
            source: text_field(self.source.as_ref()).map(str::to_string),
            status: text_field(self.status.as_ref()).and_then(MessageStatus::parse_lenient),
        })
    }
}

/// Parse a `{"messages": [...]}` document into raw records.
///
/// Elements that are not JSON objects are skipped. A document without a
/// `messages` array is an error.
pub fn parse_message_document(bytes: &[u8]) -> anyhow::Result<Vec<RawMessage>> {
    let doc: Value = serde_json::from_slice(bytes)?;
    let items = doc
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("document has no \"messages\" array"))?;
    Ok(items
        .iter()
        .filter(|v| v.is_object())
        .filter_map(|v| serde_json::from_value::<RawMessage>(v.clone()).ok())
        .collect())
}
