use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::describe;

pub const NATURAL_DESCRIPTION: &str = "naturalDescription";

/// Discriminates the payload shape of an [`EventRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "navigation")]
    Navigation,
    #[serde(rename = "click")]
    Click,
    #[serde(rename = "form_submit")]
    FormSubmit,
    #[serde(rename = "input_edit")]
    InputEdit,
    #[serde(rename = "network")]
    Network,
    #[serde(rename = "internalNav")]
    InternalNav,
    #[serde(rename = "tracking")]
    Tracking,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Navigation => "navigation",
            EventType::Click => "click",
            EventType::FormSubmit => "form_submit",
            EventType::InputEdit => "input_edit",
            EventType::Network => "network",
            EventType::InternalNav => "internalNav",
            EventType::Tracking => "tracking",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event-specific fields. Always carries `naturalDescription` once it is
/// part of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventContext(Map<String, Value>);

impl EventContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn described(description: impl Into<String>) -> Self {
        Self::new().with(NATURAL_DESCRIPTION, description.into())
    }

    /// Add a string or numeric field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn natural_description(&self) -> Option<&str> {
        self.get_str(NATURAL_DESCRIPTION)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The unit of the persisted log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub url: String,
    pub event_type: EventType,
    pub context: EventContext,
    pub timestamp: DateTime<Utc>,
    pub title: String,
}

impl EventRecord {
    /// Build a record stamped with the current instant. An empty or missing
    /// description is replaced by the generic phrase for `event_type`.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        event_type: EventType,
        context: EventContext,
    ) -> Self {
        Self::at(Utc::now(), url, title, event_type, context)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        url: impl Into<String>,
        title: impl Into<String>,
        event_type: EventType,
        mut context: EventContext,
    ) -> Self {
        let described = context
            .natural_description()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false);
        if !described {
            context = context.with(NATURAL_DESCRIPTION, describe::fallback(event_type));
        }
        Self {
            url: url.into(),
            event_type,
            context,
            timestamp,
            title: title.into(),
        }
    }

    pub fn natural_description(&self) -> &str {
        self.context.natural_description().unwrap_or_default()
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.to_rfc3339(),
            self.event_type,
            self.natural_description()
        )
    }
}
