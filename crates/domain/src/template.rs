//! Template results: what a template source hands back after an evaluation.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating a value template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TemplateResult {
    Bool(bool),
    Text(String),
    /// Numbers, lists, maps, none… anything that is neither a bool nor a string.
    Other(serde_json::Value),
    /// The evaluation failed; carries the engine's message.
    Error(String),
}

impl TemplateResult {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<bool> for TemplateResult {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for TemplateResult {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl std::fmt::Display for TemplateResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Other(value) => write!(f, "{value}"),
            Self::Error(message) => write!(f, "error({message})"),
        }
    }
}
