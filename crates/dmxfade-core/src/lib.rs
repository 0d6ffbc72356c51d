//! dmxfade core - Fade engine for DMX lighting networks
//!
//! This crate continuously computes each fixture's color and emits one fixed
//! size frame per universe at a steady refresh rate:
//! - **Color**: immutable 1-4 channel intensity vectors
//! - **Device**: per-fixture fade state machine behind its own lock
//! - **Ambient**: optional self-driven on/off cycling per device
//! - **Universe**: device roster, refresh tick and frame assembly
//! - **Manager**: builds universes from configuration and fans out commands
//!
//! Putting frames on the wire is left to a [`Transport`] implementation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dmxfade_core::{Color, EngineConfig, NetworkManager, TracingTransport};
//!
//! # fn main() -> dmxfade_core::Result<()> {
//! let manager = NetworkManager::new(EngineConfig::default(), Arc::new(TracingTransport))?;
//! manager.start()?;
//!
//! // Fade every fixture to orange over one second
//! manager.fade_all(Color::new(vec![254.0, 120.0, 1.0])?, 60)?;
//!
//! manager.shutdown();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Ambient on/off cycling
pub mod ambient;
/// Channel color values
pub mod color;
/// Engine geometry configuration
pub mod config;
/// Fixture fade state machine
pub mod device;
/// Non-blocking transport hand-off
pub mod dispatch;
/// Error types
pub mod error;
/// Universe roster management
pub mod manager;
/// Periodic background tasks
pub mod scheduler;
/// Transport boundary
pub mod transport;
/// Universe refresh and frame assembly
pub mod universe;

// Re-exports
pub use ambient::{AmbientDriver, AmbientSchedule};
pub use color::Color;
pub use config::{AmbientConfig, EngineConfig};
pub use device::Device;
pub use dispatch::{FrameDispatcher, OutputStats};
pub use error::{EngineError, Result, TransportError};
pub use manager::NetworkManager;
pub use scheduler::PeriodicTask;
pub use transport::{ChannelTransport, FramePacket, TracingTransport, Transport};
pub use universe::{Universe, UniverseBuilder, UniverseStats};
