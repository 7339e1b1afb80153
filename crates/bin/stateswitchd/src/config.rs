//! Configuration loading: a TOML file with environment variable overrides.
//!
//! Looks for `stateswitch.toml` in the working directory, or at the path in
//! `STATESWITCH_CONFIG`. Every section has a default so the file is
//! optional. Environment variables take precedence over file values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use stateswitch_domain::switch::SwitchConfig;

const DEFAULT_PATH: &str = "stateswitch.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated devices.
    #[serde(rename = "virtual")]
    pub virtual_devices: VirtualConfig,
    /// Switches keyed by object id.
    pub switches: BTreeMap<String, SwitchConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Virtual integration settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    pub enabled: bool,
    /// Entity ids to simulate, e.g. `light.porch`.
    pub entities: Vec<String>,
}

impl Config {
    /// Load configuration from disk (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("STATESWITCH_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_PATH), PathBuf::from);
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// A missing file yields the defaults.
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STATESWITCH_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.virtual_devices.enabled {
            for entity_id in &self.virtual_devices.entities {
                if self.switches.keys().any(|id| format!("switch.{id}") == *entity_id) {
                    return Err(ConfigError::Validation(format!(
                        "{entity_id} is both a virtual device and a configured switch"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Switch configs with their object ids filled in from the table keys.
    #[must_use]
    pub fn switch_configs(&self) -> Vec<SwitchConfig> {
        self.switches
            .iter()
            .map(|(object_id, switch)| switch.clone().with_object_id(object_id.as_str()))
            .collect()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "stateswitchd=info,stateswitch=info".to_string(),
        }
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            entities: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Sections that parse but contradict each other.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use stateswitch_domain::action::Action;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.filter, "stateswitchd=info,stateswitch=info");
        assert!(config.virtual_devices.enabled);
        assert!(config.virtual_devices.entities.is_empty());
        assert!(config.switches.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.switches.is_empty());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [logging]
            filter = "debug"

            [virtual]
            enabled = true
            entities = ["light.porch"]

            [switches.porch_pulse]
            friendly_name = "Porch pulse"
            unique_id = "porch-pulse-1"
            value_template = "{{ is_state('light.porch', 'on') }}"
            revert_delay_ms = 500
            turn_on = [{ type = "call_service", entity_id = "light.porch", service = "turn_on" }]
            turn_off = [
                { type = "delay", milliseconds = 100 },
                { type = "call_service", entity_id = "light.porch", service = "turn_off" },
            ]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.virtual_devices.entities, vec!["light.porch"]);

        let switches = config.switch_configs();
        assert_eq!(switches.len(), 1);
        let switch = &switches[0];
        assert_eq!(switch.entity_id(), "switch.porch_pulse");
        assert_eq!(switch.name(), "Porch pulse");
        assert_eq!(switch.revert_delay(), Duration::from_millis(500));
        assert_eq!(switch.turn_off.steps().len(), 2);
        assert!(matches!(
            &switch.turn_on.steps()[0],
            Action::CallService { entity_id, service, .. }
                if entity_id == "light.porch" && service == "turn_on"
        ));
    }

    #[test]
    fn should_accept_on_off_delay_alias() {
        let toml = r"
            [switches.garden]
            on_off_delay = 250
            turn_on = []
            turn_off = []
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.switch_configs()[0].revert_delay(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file(Path::new("nonexistent.toml")).unwrap();
        assert!(config.switches.is_empty());
    }

    #[test]
    fn should_name_the_file_in_parse_errors() {
        let path = std::env::temp_dir().join(format!("stateswitch-{}.toml", std::process::id()));
        std::fs::write(&path, "[switches.porch]\nturn_on = 3").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("stateswitch-"));
    }

    #[test]
    fn should_reject_switch_shadowing_virtual_device() {
        let toml = r#"
            [virtual]
            entities = ["switch.porch"]

            [switches.porch]
            turn_on = []
            turn_off = []
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_accept_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_report_parse_error_for_missing_scripts() {
        let result: Result<Config, _> = toml::from_str("[switches.porch]\nrevert_delay_ms = 10");
        assert!(result.is_err());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
