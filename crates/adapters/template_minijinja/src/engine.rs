//! Minijinja environment with access to entity states.

use std::sync::Arc;

use minijinja::value::ValueKind;
use minijinja::{Environment, Value};

use stateswitch_app::state_registry::StateRegistry;
use stateswitch_domain::error::TemplateError;
use stateswitch_domain::switch::STATE_UNKNOWN;
use stateswitch_domain::template::TemplateResult;

/// Evaluates value templates against the state registry.
///
/// Two forms are accepted:
/// - render templates such as `{{ is_state('light.porch', 'on') }}`, whose
///   text output is parsed back into a typed result;
/// - bare expressions such as `is_state('light.porch', 'on')`, whose value
///   is used directly.
///
/// Globals: `states(entity_id)` and `is_state(entity_id, state)`.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new(registry: Arc<StateRegistry>) -> Self {
        let mut env = Environment::new();

        let states = Arc::clone(&registry);
        env.add_function("states", move |entity_id: &str| -> String {
            states
                .get(entity_id)
                .unwrap_or_else(|| STATE_UNKNOWN.to_string())
        });

        env.add_function("is_state", move |entity_id: &str, state: &str| -> bool {
            registry.is_state(entity_id, state)
        });

        Self { env }
    }

    /// Check that `template` parses.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] with the engine's message.
    pub fn check(&self, template: &str) -> Result<(), TemplateError> {
        let parsed = if is_render_template(template) {
            self.env.template_from_str(template).map(|_| ())
        } else {
            self.env.compile_expression(template).map(|_| ())
        };
        parsed.map_err(|err| TemplateError::Syntax(err.to_string()))
    }

    /// Evaluate `template` against the current states.
    #[must_use]
    pub fn evaluate(&self, template: &str) -> TemplateResult {
        if is_render_template(template) {
            match self.env.render_str(template, ()) {
                Ok(output) => parse_rendered(&output),
                Err(err) => TemplateResult::Error(err.to_string()),
            }
        } else {
            match self
                .env
                .compile_expression(template)
                .and_then(|expr| expr.eval(()))
            {
                Ok(value) => from_value(&value),
                Err(err) => TemplateResult::Error(err.to_string()),
            }
        }
    }
}

fn is_render_template(template: &str) -> bool {
    template.contains("{{") || template.contains("{%")
}

fn parse_rendered(output: &str) -> TemplateResult {
    let text = output.trim();
    if text.eq_ignore_ascii_case("true") {
        return TemplateResult::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return TemplateResult::Bool(false);
    }
    if let Ok(number) = text.parse::<i64>() {
        return TemplateResult::Other(number.into());
    }
    if let Some(number) = text
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return TemplateResult::Other(serde_json::Value::Number(number));
    }
    TemplateResult::Text(text.to_string())
}

fn from_value(value: &Value) -> TemplateResult {
    match value.kind() {
        ValueKind::Bool => TemplateResult::Bool(value.is_true()),
        ValueKind::String => TemplateResult::Text(value.to_string()),
        ValueKind::Undefined | ValueKind::None => TemplateResult::Other(serde_json::Value::Null),
        _ => serde_json::to_value(value)
            .map_or_else(|err| TemplateResult::Error(err.to_string()), TemplateResult::Other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TemplateEngine {
        let registry = Arc::new(StateRegistry::default());
        registry.set("light.porch", "on");
        registry.set("sensor.temperature", "23.5");
        TemplateEngine::new(registry)
    }

    #[test]
    fn should_parse_rendered_boolean() {
        let result = engine().evaluate("{{ is_state('light.porch', 'on') }}");
        assert_eq!(result, TemplateResult::Bool(true));
    }

    #[test]
    fn should_evaluate_bare_expression() {
        let result = engine().evaluate("is_state('light.porch', 'off')");
        assert_eq!(result, TemplateResult::Bool(false));
    }

    #[test]
    fn should_return_state_strings_as_text() {
        assert_eq!(
            engine().evaluate("{{ states('light.porch') }}"),
            TemplateResult::Text("on".to_string())
        );
        assert_eq!(
            engine().evaluate("states('light.porch')"),
            TemplateResult::Text("on".to_string())
        );
    }

    #[test]
    fn should_report_unknown_for_missing_entity() {
        assert_eq!(
            engine().evaluate("{{ states('light.kitchen') }}"),
            TemplateResult::Text("unknown".to_string())
        );
    }

    #[test]
    fn should_parse_rendered_numbers_as_other() {
        assert_eq!(
            engine().evaluate("{{ states('sensor.temperature') }}"),
            TemplateResult::Other(serde_json::json!(23.5))
        );
        assert_eq!(
            engine().evaluate("{{ 1 + 1 }}"),
            TemplateResult::Other(serde_json::json!(2))
        );
    }

    #[test]
    fn should_turn_runtime_failures_into_errors() {
        let result = engine().evaluate("{{ no_such_function('light.porch') }}");
        assert!(result.is_error());
    }

    #[test]
    fn should_reject_invalid_syntax() {
        assert!(matches!(
            engine().check("{{ is_state('light.porch', 'on' }}"),
            Err(TemplateError::Syntax(_))
        ));
        assert!(engine().check("is_state(").is_err());
    }

    #[test]
    fn should_accept_valid_syntax() {
        assert!(engine().check("{{ is_state('light.porch', 'on') }}").is_ok());
        assert!(engine().check("states('light.porch') == 'on'").is_ok());
    }
}
