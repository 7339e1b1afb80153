//! Virtual on/off device: responds to `turn_on`, `turn_off`, `toggle`.

use std::sync::Mutex;

use stateswitch_domain::error::{ActionError, ValidationError};
use stateswitch_domain::switch::{SwitchState, split_entity_id};

/// Entity domains the virtual integration can simulate.
pub const SUPPORTED_DOMAINS: [&str; 3] = ["light", "switch", "input_boolean"];

/// A simulated device that can be turned on and off.
pub struct VirtualDevice {
    entity_id: String,
    state: Mutex<SwitchState>,
}

impl VirtualDevice {
    /// Create an `Off` device for `entity_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEntityId`] when the id is malformed
    /// or its domain is not one of [`SUPPORTED_DOMAINS`].
    pub fn new(entity_id: &str) -> Result<Self, ValidationError> {
        let (domain, _) = split_entity_id(entity_id)?;
        if !SUPPORTED_DOMAINS.contains(&domain) {
            return Err(ValidationError::InvalidEntityId(entity_id.to_string()));
        }
        Ok(Self {
            entity_id: entity_id.to_string(),
            state: Mutex::new(SwitchState::Off),
        })
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    #[must_use]
    pub fn state(&self) -> SwitchState {
        *self.lock_state()
    }

    /// Apply a service call, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnsupportedService`] for anything but
    /// `turn_on`, `turn_off` and `toggle`.
    pub fn handle_service(&self, service: &str) -> Result<SwitchState, ActionError> {
        let mut state = self.lock_state();
        *state = match service {
            "turn_on" => SwitchState::On,
            "turn_off" => SwitchState::Off,
            "toggle" => match *state {
                SwitchState::On => SwitchState::Off,
                _ => SwitchState::On,
            },
            _ => {
                return Err(ActionError::UnsupportedService {
                    entity_id: self.entity_id.clone(),
                    service: service.to_string(),
                });
            }
        };
        Ok(*state)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SwitchState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_off() {
        let device = VirtualDevice::new("light.porch").unwrap();
        assert_eq!(device.state(), SwitchState::Off);
    }

    #[test]
    fn should_turn_on_when_service_called() {
        let device = VirtualDevice::new("light.porch").unwrap();
        assert_eq!(device.handle_service("turn_on").unwrap(), SwitchState::On);
    }

    #[test]
    fn should_turn_off_when_service_called() {
        let device = VirtualDevice::new("switch.fountain").unwrap();
        device.handle_service("turn_on").unwrap();
        assert_eq!(device.handle_service("turn_off").unwrap(), SwitchState::Off);
    }

    #[test]
    fn should_toggle_back_and_forth() {
        let device = VirtualDevice::new("input_boolean.guest_mode").unwrap();
        assert_eq!(device.handle_service("toggle").unwrap(), SwitchState::On);
        assert_eq!(device.handle_service("toggle").unwrap(), SwitchState::Off);
    }

    #[test]
    fn should_reject_unknown_service_and_keep_state() {
        let device = VirtualDevice::new("light.porch").unwrap();
        let result = device.handle_service("reboot");
        assert!(matches!(
            result,
            Err(ActionError::UnsupportedService { .. })
        ));
        assert_eq!(device.state(), SwitchState::Off);
    }

    #[test]
    fn should_reject_unsupported_domain() {
        assert!(VirtualDevice::new("sensor.temperature").is_err());
        assert!(VirtualDevice::new("not-an-entity").is_err());
    }
}
