//! # stateswitch-adapter-template-minijinja
//!
//! [`TemplateSource`] implementation backed by minijinja.
//!
//! Each tracked template gets its own task that subscribes to the
//! [`StateRegistry`] event stream and re-evaluates the template when an
//! entity it references changes state. Only changed results are forwarded
//! to the owning switch.
//!
//! ## Dependency rule
//!
//! Depends on `stateswitch-app` (port traits, state registry) and
//! `stateswitch-domain` only.

mod engine;
mod tracker;

use std::sync::Arc;

use tokio::sync::mpsc;

use stateswitch_app::ports::{TemplateSource, TemplateStream};
use stateswitch_app::state_registry::StateRegistry;
use stateswitch_domain::error::StateSwitchError;

pub use engine::TemplateEngine;

use tracker::TemplateTracker;

const RESULT_BUFFER: usize = 16;

/// Tracks value templates against a shared [`StateRegistry`].
pub struct MinijinjaTemplateSource {
    registry: Arc<StateRegistry>,
    engine: Arc<TemplateEngine>,
}

impl MinijinjaTemplateSource {
    pub fn new(registry: Arc<StateRegistry>) -> Self {
        let engine = Arc::new(TemplateEngine::new(Arc::clone(&registry)));
        Self { registry, engine }
    }

    /// The engine used for evaluation.
    #[must_use]
    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }
}

impl TemplateSource for MinijinjaTemplateSource {
    fn track(&self, owner: &str, template: &str) -> Result<TemplateStream, StateSwitchError> {
        self.engine.check(template)?;

        let (tx, rx) = mpsc::channel(RESULT_BUFFER);
        TemplateTracker::new(
            Arc::clone(&self.engine),
            owner,
            template,
            self.registry.subscribe(),
            tx,
        )
        .start();
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stateswitch_domain::error::TemplateError;
    use stateswitch_domain::template::TemplateResult;

    #[tokio::test]
    async fn should_stream_results_for_tracked_template() {
        let registry = Arc::new(StateRegistry::default());
        registry.set("input_boolean.guest_mode", "off");
        let source = MinijinjaTemplateSource::new(Arc::clone(&registry));

        let mut stream = source
            .track(
                "switch.guest_lights",
                "{{ is_state('input_boolean.guest_mode', 'on') }}",
            )
            .unwrap();
        assert_eq!(stream.recv().await, Some(TemplateResult::Bool(false)));

        registry.set("input_boolean.guest_mode", "on");
        assert_eq!(stream.recv().await, Some(TemplateResult::Bool(true)));
    }

    #[tokio::test]
    async fn should_reject_template_with_syntax_error() {
        let source = MinijinjaTemplateSource::new(Arc::new(StateRegistry::default()));
        let result = source.track("switch.porch", "{{ is_state('light.porch', }}");
        assert!(matches!(
            result,
            Err(StateSwitchError::Template(TemplateError::Syntax(_)))
        ));
    }

    #[test]
    fn should_expose_engine_for_one_off_evaluation() {
        let registry = Arc::new(StateRegistry::default());
        registry.set("light.porch", "on");
        let source = MinijinjaTemplateSource::new(registry);
        assert_eq!(
            source.engine().evaluate("states('light.porch') == 'on'"),
            TemplateResult::Bool(true)
        );
    }
}
