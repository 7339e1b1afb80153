//! Switch: a templated on/off entity that can revert after a delay.
//!
//! - [`SwitchState`]: the externally observable value
//! - [`SwitchConfig`]: immutable per-switch configuration
//! - [`RevertMachine`]: transitions and the pending revert

pub mod config;
pub mod machine;
pub mod state;

pub use config::{SWITCH_DOMAIN, SwitchConfig, split_entity_id};
pub use machine::{PendingRevert, RevertMachine, Transition};
pub use state::{STATE_OFF, STATE_ON, STATE_UNKNOWN, SwitchState};
