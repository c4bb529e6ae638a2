//! Wire-model types for captured events.
//!
//! These are the serde-serializable structures a transport ships to the
//! ingestion endpoint. The dispatch core never inspects them; it moves opaque
//! tasks, and the client wraps events into tasks.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorKind, OutpostError};

/// Unique identifier of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Generates a fresh random event id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil id, returned by capture operations when the SDK is disabled.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.simple().fmt(f)
    }
}

impl FromStr for EventId {
    type Err = OutpostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s).map_err(|err| {
            OutpostError::new(ErrorKind::DeserializationError, "Event id parsing failed")
                .with_detail(err.to_string())
        })?;

        Ok(Self(uuid))
    }
}

/// Severity of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Description of the mechanism that produced an exception.
///
/// Annotates how an error reached the SDK: the integration that caught it,
/// whether the application handled it, and arbitrary metadata attached by
/// the capturing layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
    /// Identifier of the capturing mechanism, e.g. a panic hook or
    /// middleware name.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mechanism_type: Option<String>,
    /// Human-readable description of the mechanism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Link to documentation about the mechanism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_link: Option<String>,
    /// Whether the application handled the error itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled: Option<bool>,
    /// Mechanism-specific metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, serde_json::Value>>,
    /// Arbitrary extra data attached by the capturing layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, serde_json::Value>>,
}

/// A single captured exception.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionValue {
    /// The rendered error message.
    pub value: String,
    /// The error's type name, when known.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    /// How the error reached the SDK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<Mechanism>,
}

/// A captured application event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id of the event; assigned at capture time when nil.
    pub event_id: EventId,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Severity of the event.
    pub level: Level,
    /// Free-form message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Name of the logger that recorded the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    /// The captured exception, for error events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionValue>,
    /// Key-value tags for search and aggregation.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl Event {
    /// Creates an empty event with a fresh id, the current timestamp, and
    /// info severity.
    pub fn new() -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: Utc::now(),
            level: Level::Info,
            message: None,
            logger: None,
            exception: None,
            tags: HashMap::new(),
        }
    }

    /// Creates a message event at the given severity.
    pub fn from_message(message: impl Into<String>, level: Level) -> Self {
        Self {
            level,
            message: Some(message.into()),
            ..Self::new()
        }
    }

    /// Creates an error event from any standard error.
    ///
    /// The error is rendered into an exception value annotated as handled,
    /// since it reached the SDK through an explicit capture call.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self {
            level: Level::Error,
            exception: Some(ExceptionValue {
                value: error.to_string(),
                exception_type: None,
                mechanism: Some(Mechanism {
                    mechanism_type: Some("generic".to_owned()),
                    handled: Some(true),
                    ..Mechanism::default()
                }),
            }),
            ..Self::new()
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_display_is_simple_uuid() {
        let id = EventId::new();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 32);
        assert!(!rendered.contains('-'));
    }

    #[test]
    fn event_id_round_trips_through_str() {
        let id = EventId::new();
        let parsed: EventId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn nil_event_id_is_default() {
        assert!(EventId::default().is_nil());
        assert!(!EventId::new().is_nil());
    }

    #[test]
    fn level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Level::Warning).unwrap(), "\"warning\"");
        assert_eq!(
            serde_json::from_str::<Level>("\"fatal\"").unwrap(),
            Level::Fatal
        );
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn mechanism_type_uses_wire_name() {
        let mechanism = Mechanism {
            mechanism_type: Some("panic".to_owned()),
            handled: Some(false),
            ..Mechanism::default()
        };

        let json = serde_json::to_value(&mechanism).unwrap();
        assert_eq!(json["type"], "panic");
        assert_eq!(json["handled"], false);
        assert!(json.get("description").is_none());
    }

    #[test]
    fn message_event_carries_message_and_level() {
        let event = Event::from_message("deploy finished", Level::Info);
        assert_eq!(event.message.as_deref(), Some("deploy finished"));
        assert_eq!(event.level, Level::Info);
        assert!(!event.event_id.is_nil());
    }

    #[test]
    fn error_event_renders_the_error() {
        let error = std::io::Error::other("disk gone");
        let event = Event::from_error(&error);

        let exception = event.exception.unwrap();
        assert!(exception.value.contains("disk gone"));
        assert_eq!(exception.mechanism.unwrap().handled, Some(true));
        assert_eq!(event.level, Level::Error);
    }

    #[test]
    fn event_round_trips_through_json() {
        let mut event = Event::from_message("checkout failed", Level::Error);
        event.logger = Some("checkout".to_owned());
        event.tags.insert("region".to_owned(), "eu-west".to_owned());

        let json = serde_json::to_string(&event).unwrap();
        let decoded: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, decoded);
    }
}
