//! # stateswitch-adapter-virtual
//!
//! Virtual/demo integration that simulates the devices switch scripts act
//! on, for testing and demonstration purposes.
//!
//! ## Provided devices
//!
//! | Domain | Behaviour |
//! |--------|-----------|
//! | `light.*` | Responds to `turn_on` / `turn_off` / `toggle` |
//! | `switch.*` | Responds to `turn_on` / `turn_off` / `toggle` |
//! | `input_boolean.*` | Responds to `turn_on` / `turn_off` / `toggle` |
//!
//! Every state change is written into the shared [`StateRegistry`], so value
//! templates referencing these devices get re-evaluated.
//!
//! ## Dependency rule
//!
//! Depends on `stateswitch-app` (port traits) and `stateswitch-domain` only.

mod device;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use stateswitch_app::ports::ActionRunner;
use stateswitch_app::state_registry::StateRegistry;
use stateswitch_domain::action::{Action, ActionContext, Script};
use stateswitch_domain::error::{ActionError, StateSwitchError};
use stateswitch_domain::switch::SwitchState;

pub use device::{SUPPORTED_DOMAINS, VirtualDevice};

/// Virtual integration holding simulated devices.
pub struct VirtualIntegration {
    devices: BTreeMap<String, VirtualDevice>,
    registry: Arc<StateRegistry>,
}

impl VirtualIntegration {
    /// Create a device for every entity id.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed or unsupported entity ids.
    pub fn new<I, S>(registry: Arc<StateRegistry>, entity_ids: I) -> Result<Self, StateSwitchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut devices = BTreeMap::new();
        for entity_id in entity_ids {
            let device = VirtualDevice::new(entity_id.as_ref())?;
            devices.insert(device.entity_id().to_string(), device);
        }
        Ok(Self { devices, registry })
    }

    /// Unique name identifying this integration.
    #[must_use]
    pub fn name(&self) -> &'static str {
        "virtual"
    }

    /// Publish the initial state of every device.
    #[tracing::instrument(skip(self), fields(integration = self.name()))]
    pub fn setup(&self) {
        for device in self.devices.values() {
            self.registry.set(device.entity_id(), device.state().to_string());
        }
        tracing::info!(devices = self.devices.len(), "virtual devices registered");
    }

    /// Check whether this integration owns the given entity.
    #[must_use]
    pub fn owns_entity(&self, entity_id: &str) -> bool {
        self.devices.contains_key(entity_id)
    }

    /// Current state of a device.
    #[must_use]
    pub fn device_state(&self, entity_id: &str) -> Option<SwitchState> {
        self.devices.get(entity_id).map(VirtualDevice::state)
    }

    /// Apply a service call to a device and publish its new state.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnknownTarget`] when no device has that id, or
    /// [`ActionError::UnsupportedService`] for unknown services.
    pub fn handle_service_call(
        &self,
        entity_id: &str,
        service: &str,
    ) -> Result<SwitchState, ActionError> {
        let device = self
            .devices
            .get(entity_id)
            .ok_or_else(|| ActionError::UnknownTarget(entity_id.to_string()))?;
        let state = device.handle_service(service)?;
        self.registry.set(entity_id, state.to_string());
        Ok(state)
    }
}

impl ActionRunner for VirtualIntegration {
    async fn run(&self, script: &Script, context: &ActionContext) -> Result<(), StateSwitchError> {
        for (index, step) in script.steps().iter().enumerate() {
            tracing::debug!(
                context = %context.id,
                caller = %context.entity_id,
                step = index,
                action = %step,
                "running step"
            );
            match step {
                Action::CallService {
                    entity_id, service, ..
                } => {
                    self.handle_service_call(entity_id, service)?;
                }
                Action::Delay { milliseconds } => {
                    tokio::time::sleep(Duration::from_millis(*milliseconds)).await;
                }
            }
        }
        Ok(())
    }
}
