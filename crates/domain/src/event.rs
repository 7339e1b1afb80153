//! Event: an immutable record of a state write.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::{Timestamp, now};

/// Kind of event carried on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    StateChanged,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StateChanged => f.write_str("state_changed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub entity_id: Option<String>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(event_type: EventType, entity_id: Option<String>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            entity_id,
            data,
            timestamp: now(),
        }
    }

    /// A `state_changed` record for `entity_id`.
    #[must_use]
    pub fn state_changed(entity_id: &str, old_state: Option<&str>, new_state: &str) -> Self {
        Self::new(
            EventType::StateChanged,
            Some(entity_id.to_string()),
            serde_json::json!({
                "entity_id": entity_id,
                "old_state": old_state,
                "new_state": new_state,
            }),
        )
    }

    /// The entity this event is about, if any.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// New state string of a `state_changed` event.
    #[must_use]
    pub fn new_state(&self) -> Option<&str> {
        self.data.get("new_state").and_then(serde_json::Value::as_str)
    }
}
