//! Action runner port: executes the scripts a switch is configured with.

use std::future::Future;

use stateswitch_domain::action::{ActionContext, Script};
use stateswitch_domain::error::StateSwitchError;

/// Executes a [`Script`] on behalf of a switch.
///
/// Implementations run the steps in order and stop at the first failure.
/// The switch awaits completion before finalizing its transition but does
/// not roll back when an error is returned.
pub trait ActionRunner {
    /// Run every step of `script`.
    fn run(
        &self,
        script: &Script,
        context: &ActionContext,
    ) -> impl Future<Output = Result<(), StateSwitchError>> + Send;
}

impl<T: ActionRunner + Send + Sync> ActionRunner for std::sync::Arc<T> {
    fn run(
        &self,
        script: &Script,
        context: &ActionContext,
    ) -> impl Future<Output = Result<(), StateSwitchError>> + Send {
        (**self).run(script, context)
    }
}
