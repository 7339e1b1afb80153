//! # stateswitch-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** for the host services a switch consumes:
//!   - `ActionRunner`: executes the on/off scripts
//!   - `TemplateSource`: evaluates value templates and tracks their inputs
//!   - `StatePublisher`: receives every state transition
//! - Run each switch as a serialized task (`StateSwitch`) and manage the
//!   configured set of them (`SwitchPlatform`)
//! - Provide **in-process infrastructure** that doesn't need IO: the event
//!   bus and the state registry
//!
//! ## Dependency rule
//! Depends on `stateswitch-domain` only (plus `tokio` for tasks, channels and
//! timers). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod event_bus;
pub mod ports;
pub mod services;
pub mod state_registry;
