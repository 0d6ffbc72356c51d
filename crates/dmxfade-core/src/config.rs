//! Engine geometry configuration
//!
//! All values are plain integers, validated once when the manager is built
//! and never changed afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ambient::AmbientSchedule;
use crate::color::{MAX_CHANNELS, MIN_CHANNELS};
use crate::{error::EngineError, Result};

/// Channel budget of one universe
pub const DEFAULT_MAX_CHANNELS: usize = 512;
/// Refresh period, roughly 60 Hz
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 16;

/// Ambient mode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    /// Start ambient mode on every device at startup
    pub enabled: bool,
    /// Steps per ambient fade, falls back to `EngineConfig::fade_steps`
    pub steps: Option<u32>,
    /// Upper bound of the random pause between fades, in milliseconds
    pub jitter_ms: u64,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            steps: None,
            jitter_ms: 3000,
        }
    }
}

/// Universe and device geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of universes
    pub universes: usize,
    /// Devices in every universe
    pub devices_per_universe: usize,
    /// Color channels per device (1-4)
    pub channels_per_device: usize,
    /// Repeat count of each device's color in the frame
    pub channel_clusters: usize,
    /// Default step count for fades
    pub fade_steps: u32,
    /// Frame size of each universe
    pub max_channels: usize,
    /// Refresh tick period in milliseconds
    pub refresh_interval_ms: u64,
    /// Ambient mode
    pub ambient: AmbientConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            universes: 1,
            devices_per_universe: 1,
            channels_per_device: 3,
            channel_clusters: 1,
            fade_steps: 60,
            max_channels: DEFAULT_MAX_CHANNELS,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            ambient: AmbientConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check the geometry fits in one frame per universe
    pub fn validate(&self) -> Result<()> {
        if self.universes == 0 || self.universes > u16::MAX as usize + 1 {
            return Err(EngineError::InvalidGeometry(format!(
                "universe count {} out of range",
                self.universes
            )));
        }
        if !(MIN_CHANNELS..=MAX_CHANNELS).contains(&self.channels_per_device) {
            return Err(EngineError::InvalidGeometry(format!(
                "channels per device must be {}-{}, got {}",
                MIN_CHANNELS, MAX_CHANNELS, self.channels_per_device
            )));
        }
        if self.channel_clusters == 0 {
            return Err(EngineError::InvalidGeometry(
                "channel clusters must be at least 1".to_string(),
            ));
        }
        if self.max_channels == 0 {
            return Err(EngineError::InvalidGeometry(
                "max channels must be at least 1".to_string(),
            ));
        }
        if self.refresh_interval_ms == 0 {
            return Err(EngineError::InvalidGeometry(
                "refresh interval must be at least 1 ms".to_string(),
            ));
        }

        self.ambient_schedule().validate()?;

        let bytes = self
            .devices_per_universe
            .checked_mul(self.channels_per_device)
            .and_then(|n| n.checked_mul(self.channel_clusters));
        match bytes {
            Some(bytes) if bytes <= self.max_channels => Ok(()),
            _ => Err(EngineError::InvalidGeometry(format!(
                "{} devices x {} channels x {} clusters exceeds {} channels",
                self.devices_per_universe,
                self.channels_per_device,
                self.channel_clusters,
                self.max_channels
            ))),
        }
    }

    /// Refresh tick period
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Ambient timing derived from this configuration
    pub fn ambient_schedule(&self) -> AmbientSchedule {
        AmbientSchedule {
            steps: self.ambient.steps.unwrap_or(self.fade_steps),
            tick: self.refresh_interval(),
            jitter: Duration::from_millis(self.ambient.jitter_ms),
        }
    }
}
