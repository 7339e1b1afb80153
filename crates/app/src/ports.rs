//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the host
//! services a switch consumes. They are defined here (in `app`) so that both
//! the use-case layer and the adapter layer can depend on them without
//! creating circular dependencies.

pub mod action_runner;
pub mod state_publisher;
pub mod template_source;

pub use action_runner::ActionRunner;
pub use state_publisher::StatePublisher;
pub use template_source::{TemplateSource, TemplateStream};
