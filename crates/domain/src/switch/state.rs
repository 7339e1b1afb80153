//! Switch state: the single value a switch exposes to observers.

use serde::{Deserialize, Serialize};

use crate::template::TemplateResult;

/// Canonical token the host uses for the "on" state.
pub const STATE_ON: &str = "on";
/// Canonical token the host uses for the "off" state.
pub const STATE_OFF: &str = "off";
/// Token published when the template could not be evaluated.
pub const STATE_UNKNOWN: &str = "unknown";

/// Logical state of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    On,
    #[default]
    Off,
    /// The value template failed to evaluate.
    Unknown,
}

impl SwitchState {
    /// Whether the state is a real on/off reading (anything but [`Unknown`](Self::Unknown)).
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Map a template evaluation onto a switch state.
    ///
    /// Errors become [`Unknown`](Self::Unknown). Booleans map directly,
    /// strings are on when they equal `true` or `on` in any case (surrounding
    /// whitespace included, so `" on"` is off), and every
    /// other value falls back to [`Off`](Self::Off).
    #[must_use]
    pub fn from_template(result: &TemplateResult) -> Self {
        match result {
            TemplateResult::Error(_) => Self::Unknown,
            TemplateResult::Bool(value) => Self::from(*value),
            TemplateResult::Text(text) => {
                Self::from(text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case(STATE_ON))
            }
            TemplateResult::Other(_) => Self::Off,
        }
    }
}

impl From<bool> for SwitchState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl std::fmt::Display for SwitchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str(STATE_ON),
            Self::Off => f.write_str(STATE_OFF),
            Self::Unknown => f.write_str(STATE_UNKNOWN),
        }
    }
}
