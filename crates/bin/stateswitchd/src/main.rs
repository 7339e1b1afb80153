//! # stateswitchd: delayed-revert switch daemon
//!
//! Composition root that wires the switch platform to its adapters.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the tracing subscriber
//! - Build the state registry and the virtual integration
//! - Track value templates with the minijinja adapter
//! - Start one switch per configured entry
//! - Tear everything down on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no switch logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use stateswitch_adapter_template_minijinja::MinijinjaTemplateSource;
use stateswitch_adapter_virtual::VirtualIntegration;
use stateswitch_app::services::platform::SwitchPlatform;
use stateswitch_app::state_registry::StateRegistry;
use stateswitch_domain::event::Event;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // State
    let registry = Arc::new(StateRegistry::default());
    let log_task = tokio::spawn(log_state_changes(registry.subscribe()));

    // Devices
    let entities = if config.virtual_devices.enabled {
        config.virtual_devices.entities.clone()
    } else {
        Vec::new()
    };
    let devices = Arc::new(
        VirtualIntegration::new(Arc::clone(&registry), entities)
            .context("creating virtual devices")?,
    );
    devices.setup();

    // Switches
    let templates = MinijinjaTemplateSource::new(Arc::clone(&registry));
    let platform = SwitchPlatform::setup(config.switch_configs(), &devices, &registry, &templates)
        .context("setting up switches")?;
    let switches: Vec<&str> = platform.entity_ids().collect();
    tracing::info!(?switches, "stateswitchd running");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutting down");

    platform.teardown().await;
    log_task.abort();
    Ok(())
}

async fn log_state_changes(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => tracing::info!(
                entity_id = event.entity_id().unwrap_or_default(),
                state = event.new_state().unwrap_or_default(),
                "state changed"
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "state change log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
