//! Template source port: evaluates value templates and tracks their inputs.

use stateswitch_domain::error::StateSwitchError;
use stateswitch_domain::template::TemplateResult;
use tokio::sync::mpsc;

/// Stream of template results delivered to one switch.
pub type TemplateStream = mpsc::Receiver<TemplateResult>;

/// Subscribes switches to template re-evaluations.
pub trait TemplateSource {
    /// Start tracking `template` for the switch `owner`.
    ///
    /// The first message on the returned stream is the initial evaluation;
    /// later messages arrive whenever an entity the template references
    /// changes and the result differs from the previous one. Tracking stops
    /// when the receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns a template error when the template cannot be parsed.
    fn track(&self, owner: &str, template: &str) -> Result<TemplateStream, StateSwitchError>;
}

impl<T: TemplateSource> TemplateSource for std::sync::Arc<T> {
    fn track(&self, owner: &str, template: &str) -> Result<TemplateStream, StateSwitchError> {
        (**self).track(owner, template)
    }
}
