//! dmxfade - fade engine daemon for DMX lighting networks
//!
//! Usage: `dmxfade [config.toml]`
//!
//! Builds every universe from the configuration, starts the refresh tasks and
//! runs until Ctrl-C, then tears everything down before exiting.

#![warn(missing_docs)]

mod config;
mod logging_setup;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use dmxfade_core::{NetworkManager, TracingTransport};
use tracing::info;

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let _log_guard = logging_setup::init(&config.logging, config_path.as_deref())?;

    let manager = NetworkManager::new(config.engine.clone(), Arc::new(TracingTransport))
        .context("Failed to build universes")?;
    manager.start().context("Failed to start refresh tasks")?;

    if let Some(startup) = &config.startup {
        let steps = startup.steps.unwrap_or(config.engine.fade_steps);
        info!("Startup fade to {} over {} steps", startup.color, steps);
        manager
            .fade_all(startup.color.clone(), steps)
            .context("Startup color does not match device geometry")?;
    }

    if config.engine.ambient.enabled {
        manager
            .start_ambient()
            .context("Failed to start ambient mode")?;
    }

    info!("dmxfade running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Shutting down");
    // Joins the worker threads, keep it off the async runtime
    tokio::task::spawn_blocking(move || manager.shutdown())
        .await
        .context("Shutdown task failed")?;

    Ok(())
}
