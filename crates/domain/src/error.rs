//! Common error types used across the workspace.
//!
//! Each failure domain has its own typed error; [`StateSwitchError`] is the
//! umbrella every layer converts into via `#[from]`.

/// Top-level error returned by ports and application services.
#[derive(Debug, thiserror::Error)]
pub enum StateSwitchError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("action failed")]
    Action(#[from] ActionError),

    #[error("template error")]
    Template(#[from] TemplateError),

    /// The switch task has been torn down and no longer accepts commands.
    #[error("switch {entity_id} is no longer running")]
    Stopped { entity_id: String },
}

/// Domain invariant violations, raised while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("object id must not be empty")]
    EmptyObjectId,

    #[error("object id {0:?} must only contain lowercase letters, digits and underscores")]
    InvalidObjectId(String),

    #[error("entity id {0:?} must look like <domain>.<object_id>")]
    InvalidEntityId(String),

    #[error("value template must not be blank")]
    EmptyTemplate,

    #[error("entity id {0} is configured more than once")]
    DuplicateEntityId(String),

    #[error("unique id {0} is configured more than once")]
    DuplicateUniqueId(String),
}

/// A lookup for something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failures raised while executing a script step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("service {service} is not supported by {entity_id}")]
    UnsupportedService { entity_id: String, service: String },

    #[error("no integration handles {0}")]
    UnknownTarget(String),
}

/// Failures raised by a template source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid template syntax: {0}")]
    Syntax(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_umbrella() {
        let err: StateSwitchError = ValidationError::EmptyObjectId.into();
        assert!(matches!(
            err,
            StateSwitchError::Validation(ValidationError::EmptyObjectId)
        ));
    }

    #[test]
    fn should_describe_missing_entity() {
        let err = NotFoundError {
            entity: "Switch",
            id: "switch.porch".to_string(),
        };
        assert_eq!(err.to_string(), "Switch switch.porch not found");
    }

    #[test]
    fn should_name_stopped_switch() {
        let err = StateSwitchError::Stopped {
            entity_id: "switch.porch".to_string(),
        };
        assert_eq!(err.to_string(), "switch switch.porch is no longer running");
    }
}
