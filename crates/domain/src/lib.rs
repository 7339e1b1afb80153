//! # stateswitch-domain
//!
//! Pure domain model for the stateswitch platform.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **switch**: its observable state, its configuration and the
//!   delayed-revert state machine
//! - Define **template results** and how they map onto a switch state
//! - Define **scripts** (the actions run on turn on/off)
//! - Define **events** (state-change records)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod event;
pub mod switch;
pub mod template;
