//! Scripts: the side effects a switch runs when it is turned on or off.

use serde::{Deserialize, Serialize};

use crate::id::ContextId;

/// A single script step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Invoke a service on a target entity (e.g. `"turn_on"`, `"toggle"`).
    CallService {
        /// Target entity, e.g. `"light.porch"`.
        entity_id: String,
        /// Service name, e.g. `"turn_on"`, `"turn_off"`, `"toggle"`.
        service: String,
        /// Additional parameters for the service call.
        #[serde(default)]
        data: serde_json::Value,
    },
    /// Wait before running the next step.
    Delay { milliseconds: u64 },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CallService {
                entity_id, service, ..
            } => write!(f, "call_service({service}, {entity_id})"),
            Self::Delay { milliseconds } => write!(f, "delay({milliseconds}ms)"),
        }
    }
}

/// An ordered list of steps, run one after the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script(Vec<Action>);

impl Script {
    #[must_use]
    pub fn new(steps: Vec<Action>) -> Self {
        Self(steps)
    }

    #[must_use]
    pub fn steps(&self) -> &[Action] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Action>> for Script {
    fn from(steps: Vec<Action>) -> Self {
        Self(steps)
    }
}

/// Who asked for a script run, passed along to the action runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    pub id: ContextId,
    /// The switch whose trigger started the run.
    pub entity_id: String,
    /// `"turn_on"` or `"turn_off"`.
    pub service: &'static str,
}

impl ActionContext {
    #[must_use]
    pub fn new(entity_id: impl Into<String>, service: &'static str) -> Self {
        Self {
            id: ContextId::new(),
            entity_id: entity_id.into(),
            service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_call_service_action() {
        let action = Action::CallService {
            entity_id: "light.porch".to_string(),
            service: "turn_on".to_string(),
            data: serde_json::json!({}),
        };
        assert_eq!(action.to_string(), "call_service(turn_on, light.porch)");
    }

    #[test]
    fn should_display_delay_action() {
        let action = Action::Delay { milliseconds: 250 };
        assert_eq!(action.to_string(), "delay(250ms)");
    }

    #[test]
    fn should_deserialize_call_service_with_default_data() {
        let json = serde_json::json!({
            "type": "call_service",
            "entity_id": "light.porch",
            "service": "turn_off"
        });
        let action: Action = serde_json::from_value(json).unwrap();
        match action {
            Action::CallService { data, service, .. } => {
                assert!(data.is_null());
                assert_eq!(service, "turn_off");
            }
            Action::Delay { .. } => panic!("expected CallService"),
        }
    }

    #[test]
    fn should_deserialize_script_from_plain_list() {
        let json = serde_json::json!([
            {"type": "call_service", "entity_id": "light.porch", "service": "turn_on"},
            {"type": "delay", "milliseconds": 10}
        ]);
        let script: Script = serde_json::from_value(json).unwrap();
        assert_eq!(script.steps().len(), 2);
        assert!(matches!(script.steps()[1], Action::Delay { milliseconds: 10 }));
    }

    #[test]
    fn should_give_each_context_a_fresh_id() {
        let a = ActionContext::new("switch.porch", "turn_on");
        let b = ActionContext::new("switch.porch", "turn_on");
        assert_ne!(a.id, b.id);
    }
}
