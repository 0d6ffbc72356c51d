//! Manager for all DMX universes
//!
//! Builds the universe roster from an [`EngineConfig`] and fans bulk commands
//! out across it. Universe ids are their index in the roster.

use std::sync::Arc;

use tracing::info;

use crate::color::Color;
use crate::config::EngineConfig;
use crate::transport::Transport;
use crate::universe::Universe;
use crate::{error::EngineError, Result};

/// Owns every universe of the installation
pub struct NetworkManager {
    config: EngineConfig,
    universes: Vec<Universe>,
}

impl NetworkManager {
    /// Validate `config` and build all universes over one shared transport
    pub fn new(config: EngineConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let mut universes = Vec::with_capacity(config.universes);
        for id in 0..config.universes {
            let mut builder = Universe::builder(id as u16)
                .max_channels(config.max_channels)
                .refresh_interval(config.refresh_interval());
            for _ in 0..config.devices_per_universe {
                builder = builder.add_device(config.channel_clusters, config.channels_per_device)?;
            }
            universes.push(builder.build(transport.clone())?);
        }

        info!(
            "Network manager built: {} universes x {} devices",
            config.universes, config.devices_per_universe
        );

        Ok(Self { config, universes })
    }

    /// Configuration the manager was built from
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// All universes, indexed by id
    pub fn universes(&self) -> &[Universe] {
        &self.universes
    }

    /// Universe with the given id
    pub fn universe(&self, id: usize) -> Result<&Universe> {
        self.universes
            .get(id)
            .ok_or(EngineError::UniverseNotFound {
                id,
                len: self.universes.len(),
            })
    }

    /// Start the refresh task of every universe
    pub fn start(&self) -> Result<()> {
        for universe in &self.universes {
            universe.start()?;
        }
        Ok(())
    }

    /// Stop the refresh task of every universe
    pub fn stop(&self) {
        for universe in &self.universes {
            universe.stop();
        }
    }

    /// Cut every device in every universe to `color`
    pub fn set_all(&self, color: Color) -> Result<()> {
        for universe in &self.universes {
            universe.set_all(color.clone())?;
        }
        Ok(())
    }

    /// Fade every device in every universe to `color`
    pub fn fade_all(&self, color: Color, steps: u32) -> Result<()> {
        for universe in &self.universes {
            universe.fade_all(color.clone(), steps)?;
        }
        Ok(())
    }

    /// Cut every device of one universe to `color`
    pub fn set_universe(&self, id: usize, color: Color) -> Result<()> {
        self.universe(id)?.set_all(color)
    }

    /// Fade every device of one universe to `color`
    pub fn fade_universe(&self, id: usize, color: Color, steps: u32) -> Result<()> {
        self.universe(id)?.fade_all(color, steps)
    }

    /// Cut one device to `color`
    pub fn set_device(&self, universe: usize, device: usize, color: Color) -> Result<()> {
        self.universe(universe)?.set_one(device, color)
    }

    /// Fade one device to `color`
    pub fn fade_device(&self, universe: usize, device: usize, color: Color, steps: u32) -> Result<()> {
        self.universe(universe)?.fade_one(device, color, steps)
    }

    /// Start ambient mode on every device using the configured schedule
    pub fn start_ambient(&self) -> Result<()> {
        let schedule = self.config.ambient_schedule();
        for universe in &self.universes {
            universe.start_ambient(schedule)?;
        }
        Ok(())
    }

    /// Stop ambient mode everywhere
    pub fn stop_ambient(&self) {
        for universe in &self.universes {
            universe.stop_ambient();
        }
    }

    /// Stop all ambient and refresh tasks and close the output workers
    pub fn shutdown(&self) {
        for universe in &self.universes {
            universe.shutdown();
        }
        info!("Network manager shut down");
    }
}
