//! Switch platform: sets up every configured switch and routes service calls.

use std::collections::{BTreeMap, HashSet};

use stateswitch_domain::error::{ActionError, NotFoundError, StateSwitchError, ValidationError};
use stateswitch_domain::switch::{SwitchConfig, SwitchState};

use crate::ports::{ActionRunner, StatePublisher, TemplateSource};
use crate::services::state_switch::{StateSwitch, SwitchHandle};

/// The running set of switches, keyed by entity id.
#[derive(Debug, Default)]
pub struct SwitchPlatform {
    switches: BTreeMap<String, SwitchHandle>,
}

impl SwitchPlatform {
    /// Validate `configs` and spawn one switch per entry.
    ///
    /// Nothing is spawned unless every config is valid and all entity ids
    /// and unique ids are distinct.
    ///
    /// # Errors
    ///
    /// Returns [`StateSwitchError::Validation`] for invalid or duplicate
    /// configs, or the template source's error when a template cannot be
    /// tracked.
    #[tracing::instrument(skip_all, fields(count = configs.len()))]
    pub fn setup<R, P, T>(
        configs: Vec<SwitchConfig>,
        runner: &R,
        publisher: &P,
        templates: &T,
    ) -> Result<Self, StateSwitchError>
    where
        R: ActionRunner + Clone + Send + Sync + 'static,
        P: StatePublisher + Clone + Send + Sync + 'static,
        T: TemplateSource,
    {
        validate_all(&configs)?;

        let mut streams = Vec::with_capacity(configs.len());
        for config in &configs {
            let stream = match &config.value_template {
                Some(template) => Some(templates.track(&config.entity_id(), template)?),
                None => None,
            };
            streams.push(stream);
        }

        let switches = configs
            .into_iter()
            .zip(streams)
            .map(|(config, stream)| {
                let handle = StateSwitch::spawn(config, runner.clone(), publisher.clone(), stream);
                (handle.entity_id().to_string(), handle)
            })
            .collect::<BTreeMap<_, _>>();

        tracing::info!(switches = switches.len(), "switch platform ready");
        Ok(Self { switches })
    }

    /// Handle of the switch registered as `entity_id`.
    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<&SwitchHandle> {
        self.switches.get(entity_id)
    }

    /// Every registered entity id, sorted.
    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.switches.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.switches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    /// Call `turn_on`, `turn_off` or `toggle` on a switch.
    ///
    /// # Errors
    ///
    /// Returns [`StateSwitchError::NotFound`] for an unknown entity,
    /// [`ActionError::UnsupportedService`] for any other service, or
    /// [`StateSwitchError::Stopped`] after teardown.
    #[tracing::instrument(skip(self))]
    pub async fn call_service(
        &self,
        entity_id: &str,
        service: &str,
    ) -> Result<SwitchState, StateSwitchError> {
        let handle = self.switches.get(entity_id).ok_or_else(|| NotFoundError {
            entity: "Switch",
            id: entity_id.to_string(),
        })?;
        match service {
            "turn_on" => handle.turn_on().await,
            "turn_off" => handle.turn_off().await,
            "toggle" => handle.toggle().await,
            _ => Err(ActionError::UnsupportedService {
                entity_id: entity_id.to_string(),
                service: service.to_string(),
            }
            .into()),
        }
    }

    /// Stop every switch, cancelling pending reverts. Safe to call twice.
    #[tracing::instrument(skip(self))]
    pub async fn teardown(&self) {
        for handle in self.switches.values() {
            handle.shutdown().await;
        }
        tracing::info!("switch platform torn down");
    }
}

fn validate_all(configs: &[SwitchConfig]) -> Result<(), ValidationError> {
    let mut entity_ids = HashSet::new();
    let mut unique_ids = HashSet::new();
    for config in configs {
        config.validate()?;
        let entity_id = config.entity_id();
        if !entity_ids.insert(entity_id.clone()) {
            return Err(ValidationError::DuplicateEntityId(entity_id));
        }
        if let Some(unique_id) = &config.unique_id {
            if !unique_ids.insert(unique_id.as_str()) {
                return Err(ValidationError::DuplicateUniqueId(unique_id.clone()));
            }
        }
    }
    Ok(())
}
