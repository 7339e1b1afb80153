//! State publisher port: pushes switch states to the host's state store.

use std::future::Future;

use stateswitch_domain::error::StateSwitchError;
use stateswitch_domain::switch::SwitchState;

/// Receives every state a switch transitions to.
pub trait StatePublisher {
    /// Record the display name of `entity_id`. Called once when a switch
    /// starts.
    fn describe(
        &self,
        entity_id: &str,
        friendly_name: &str,
    ) -> impl Future<Output = Result<(), StateSwitchError>> + Send;

    /// Record `state` as the current state of `entity_id`.
    fn notify(
        &self,
        entity_id: &str,
        state: SwitchState,
    ) -> impl Future<Output = Result<(), StateSwitchError>> + Send;
}

impl<T: StatePublisher + Send + Sync> StatePublisher for std::sync::Arc<T> {
    fn describe(
        &self,
        entity_id: &str,
        friendly_name: &str,
    ) -> impl Future<Output = Result<(), StateSwitchError>> + Send {
        (**self).describe(entity_id, friendly_name)
    }

    fn notify(
        &self,
        entity_id: &str,
        state: SwitchState,
    ) -> impl Future<Output = Result<(), StateSwitchError>> + Send {
        (**self).notify(entity_id, state)
    }
}
