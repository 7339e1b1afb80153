//! State registry: last known state of every entity, plus change events.
//!
//! Plays the role of the host's observable state store: switches publish
//! into it through [`StatePublisher`], integrations write their device
//! states into it, and template sources read from it and follow its bus.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use stateswitch_domain::error::StateSwitchError;
use stateswitch_domain::event::Event;
use stateswitch_domain::switch::SwitchState;
use stateswitch_domain::time::{Timestamp, now};

use crate::event_bus::InProcessEventBus;
use crate::ports::StatePublisher;

/// Stored state of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    pub state: String,
    /// Last time the state string actually changed.
    pub last_changed: Timestamp,
    /// Last time the state was written, changed or not.
    pub last_updated: Timestamp,
}

/// In-memory state store that announces every write on an event bus.
pub struct StateRegistry {
    states: RwLock<HashMap<String, StateRecord>>,
    names: RwLock<HashMap<String, String>>,
    bus: InProcessEventBus,
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new(InProcessEventBus::default())
    }
}

impl StateRegistry {
    #[must_use]
    pub fn new(bus: InProcessEventBus) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Write the state of `entity_id` and publish a `state_changed` event.
    ///
    /// The event is published on every write so observers see each
    /// transition, even one that lands on the same value.
    pub fn set(&self, entity_id: &str, state: impl Into<String>) {
        let state = state.into();
        let ts = now();
        let old_state = {
            let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
            let previous = states.get(entity_id).cloned();
            let last_changed = match &previous {
                Some(record) if record.state == state => record.last_changed,
                _ => ts,
            };
            states.insert(
                entity_id.to_string(),
                StateRecord {
                    state: state.clone(),
                    last_changed,
                    last_updated: ts,
                },
            );
            previous.map(|record| record.state)
        };
        tracing::debug!(entity_id, old_state = ?old_state, new_state = %state, "state written");
        self.bus
            .publish(Event::state_changed(entity_id, old_state.as_deref(), &state));
    }

    /// Current state string of `entity_id`.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<String> {
        self.record(entity_id).map(|record| record.state)
    }

    #[must_use]
    pub fn record(&self, entity_id: &str) -> Option<StateRecord> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .cloned()
    }

    /// Whether `entity_id` is currently in `state`.
    #[must_use]
    pub fn is_state(&self, entity_id: &str, state: &str) -> bool {
        self.get(entity_id).is_some_and(|current| current == state)
    }

    /// Sorted list of every known entity id.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Record the display name of `entity_id`, replacing any previous one.
    pub fn set_friendly_name(&self, entity_id: &str, name: impl Into<String>) {
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_id.to_string(), name.into());
    }

    #[must_use]
    pub fn friendly_name(&self, entity_id: &str) -> Option<String> {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .cloned()
    }

    /// Follow every state write made after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}

impl StatePublisher for StateRegistry {
    async fn describe(&self, entity_id: &str, friendly_name: &str) -> Result<(), StateSwitchError> {
        self.set_friendly_name(entity_id, friendly_name);
        Ok(())
    }

    async fn notify(&self, entity_id: &str, state: SwitchState) -> Result<(), StateSwitchError> {
        self.set(entity_id, state.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_none_for_unknown_entity() {
        let registry = StateRegistry::default();
        assert!(registry.get("light.porch").is_none());
        assert!(!registry.is_state("light.porch", "on"));
    }

    #[test]
    fn should_store_latest_state() {
        let registry = StateRegistry::default();
        registry.set("light.porch", "off");
        registry.set("light.porch", "on");
        assert_eq!(registry.get("light.porch").as_deref(), Some("on"));
        assert!(registry.is_state("light.porch", "on"));
    }

    #[test]
    fn should_keep_last_changed_when_state_is_rewritten() {
        let registry = StateRegistry::default();
        registry.set("light.porch", "on");
        let first = registry.record("light.porch").unwrap();
        registry.set("light.porch", "on");
        let second = registry.record("light.porch").unwrap();
        assert_eq!(first.last_changed, second.last_changed);
        assert!(second.last_updated >= first.last_updated);
    }

    #[tokio::test]
    async fn should_publish_state_changed_with_old_state() {
        let registry = StateRegistry::default();
        registry.set("light.porch", "off");
        let mut rx = registry.subscribe();

        registry.set("light.porch", "on");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.entity_id(), Some("light.porch"));
        assert_eq!(event.new_state(), Some("on"));
        assert_eq!(event.data["old_state"], "off");
    }

    #[tokio::test]
    async fn should_publish_switch_state_through_port() {
        let registry = StateRegistry::default();
        let mut rx = registry.subscribe();

        registry
            .notify("switch.porch", SwitchState::Unknown)
            .await
            .unwrap();

        assert_eq!(registry.get("switch.porch").as_deref(), Some("unknown"));
        assert_eq!(rx.recv().await.unwrap().new_state(), Some("unknown"));
    }

    #[tokio::test]
    async fn should_store_friendly_name_without_touching_state() {
        let registry = StateRegistry::default();

        registry
            .describe("switch.porch", "Porch light")
            .await
            .unwrap();

        assert_eq!(
            registry.friendly_name("switch.porch").as_deref(),
            Some("Porch light")
        );
        assert!(registry.get("switch.porch").is_none());
    }

    #[test]
    fn should_list_entity_ids_sorted() {
        let registry = StateRegistry::default();
        registry.set("switch.b", "on");
        registry.set("light.a", "off");
        assert_eq!(registry.entity_ids(), vec!["light.a", "switch.b"]);
    }
}
