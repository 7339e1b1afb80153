//! Switch configuration, normalized and validated once at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::Script;
use crate::error::ValidationError;

/// Entity domain every configured switch is registered under.
pub const SWITCH_DOMAIN: &str = "switch";

/// Configuration of one delayed-revert switch.
///
/// `object_id` is not part of the serialized form: configuration files key
/// switches by it, see [`with_object_id`](Self::with_object_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    #[serde(skip)]
    pub object_id: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub value_template: Option<String>,
    pub turn_on: Script,
    pub turn_off: Script,
    /// Revert delay in milliseconds; zero disables reverting.
    #[serde(default, alias = "on_off_delay")]
    pub revert_delay_ms: u64,
}

impl SwitchConfig {
    #[must_use]
    pub fn new(object_id: impl Into<String>, turn_on: Script, turn_off: Script) -> Self {
        Self {
            object_id: object_id.into(),
            friendly_name: None,
            unique_id: None,
            value_template: None,
            turn_on,
            turn_off,
            revert_delay_ms: 0,
        }
    }

    #[must_use]
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = object_id.into();
        self
    }

    #[must_use]
    pub fn with_value_template(mut self, template: impl Into<String>) -> Self {
        self.value_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_revert_delay(mut self, delay: Duration) -> Self {
        self.revert_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    #[must_use]
    pub fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.revert_delay_ms)
    }

    /// `switch.<object_id>`.
    #[must_use]
    pub fn entity_id(&self) -> String {
        format!("{SWITCH_DOMAIN}.{}", self.object_id)
    }

    /// Friendly name, falling back to the object id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.object_id)
    }

    /// Check the invariants the platform relies on.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the object id is not a slug or the
    /// value template is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_object_id(&self.object_id)?;
        if self
            .value_template
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            return Err(ValidationError::EmptyTemplate);
        }
        Ok(())
    }
}

fn validate_object_id(object_id: &str) -> Result<(), ValidationError> {
    if object_id.is_empty() {
        return Err(ValidationError::EmptyObjectId);
    }
    let is_slug = object_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !is_slug {
        return Err(ValidationError::InvalidObjectId(object_id.to_string()));
    }
    Ok(())
}

/// Split `domain.object_id`, validating both halves.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEntityId`] when the id is malformed.
pub fn split_entity_id(entity_id: &str) -> Result<(&str, &str), ValidationError> {
    let invalid = || ValidationError::InvalidEntityId(entity_id.to_string());
    let (domain, object_id) = entity_id.split_once('.').ok_or_else(invalid)?;
    if domain.is_empty() || validate_object_id(domain).is_err() {
        return Err(invalid());
    }
    validate_object_id(object_id).map_err(|_| invalid())?;
    Ok((domain, object_id))
}
