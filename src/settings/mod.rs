//! User preferences persisted under the `settings` key.
//!
//! Loading merges the stored object over the defaults one key at a time, so
//! keys added in later versions are filled in and a stored value of the
//! wrong type only resets that key.

use crate::storage::{Storage, keys};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub selected_category: String,
    pub seasonal_messages: bool,
    pub special_day_messages: bool,
    pub event_messages: bool,
    pub time_of_day_messages: bool,
    pub dark_mode: bool,
    pub font_size: f64,
    pub notifications: bool,
    pub notification_time: String,
    pub user_name: String,
    pub theme: String,
    pub display_mode: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selected_category: ALL_CATEGORIES.to_string(),
            seasonal_messages: true,
            special_day_messages: true,
            event_messages: true,
            time_of_day_messages: false,
            dark_mode: false,
            font_size: 1.0,
            notifications: false,
            notification_time: "08:00".to_string(),
            user_name: String::new(),
            theme: "default".to_string(),
            display_mode: "card".to_string(),
        }
    }
}

impl Settings {
    /// Defaults overlaid with whatever `stored` provides. Unknown keys are
    /// ignored; a value of the wrong type keeps the default for that key.
    pub fn merged(stored: &Value) -> Self {
        let defaults = Self::default();
        let Some(stored) = stored.as_object() else {
            return defaults;
        };
        let Ok(Value::Object(mut merged)) = serde_json::to_value(&defaults) else {
            return defaults;
        };

        for (key, default_value) in &mut merged {
            let Some(candidate) = stored.get(key) else {
                continue;
            };
            if same_json_kind(default_value, candidate) {
                *default_value = candidate.clone();
            } else {
                debug!("ignoring stored setting '{}' of unexpected type", key);
            }
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or(defaults)
    }

    pub fn load(storage: &Storage) -> Self {
        let stored: Value = storage.get(keys::SETTINGS, Value::Object(Map::new()));
        Self::merged(&stored)
    }

    pub fn save(&self, storage: &Storage) -> bool {
        storage.set(keys::SETTINGS, self)
    }

    /// Set one key from a CLI-style string. The string is read as JSON first
    /// (`true`, `1.2`) and as a plain string otherwise.
    pub fn set_field(&mut self, key: &str, raw: &str) -> Result<(), crate::errors::DailyStartError> {
        use crate::errors::DailyStartError;

        let Ok(Value::Object(mut current)) = serde_json::to_value(&*self) else {
            return Err(DailyStartError::Internal(anyhow::anyhow!(
                "settings did not serialize to an object"
            )));
        };
        let Some(existing) = current.get(key) else {
            return Err(DailyStartError::Validation(format!(
                "unknown setting '{}'",
                key
            )));
        };
        let parsed = serde_json::from_str::<Value>(raw)
            .ok()
            .filter(|v| same_json_kind(existing, v))
            .unwrap_or_else(|| Value::String(raw.to_string()));
        if !same_json_kind(existing, &parsed) {
            return Err(DailyStartError::Validation(format!(
                "setting '{}' expects a {} value",
                key,
                kind_name(existing)
            )));
        }
        current.insert(key.to_string(), parsed);
        *self = serde_json::from_value(Value::Object(current))
            .map_err(|e| DailyStartError::Validation(format!("invalid value for '{}': {}", key, e)))?;
        Ok(())
    }

    pub fn category_filter(&self) -> Option<&str> {
        let category = self.selected_category.trim();
        (!category.is_empty() && category != ALL_CATEGORIES).then_some(category)
    }
}

fn same_json_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
    )
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Number(_) => "numeric",
        Value::String(_) => "string",
        _ => "structured",
    }
}
