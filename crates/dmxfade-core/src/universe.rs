//! A universe of DMX devices
//!
//! The universe owns a fixed, ordered roster of devices. Position in the
//! roster is position on the wire: each tick the devices' bytes are
//! concatenated in index order and zero padded to `max_channels`.
//!
//! ## Refresh
//!
//! [`Universe::start`] spawns the refresh task, which once per period steps
//! every device and then composes and dispatches a frame. The dispatch never
//! waits on the transport, so fade progress follows wall clock ticks whether
//! frames get out or not.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, trace, warn};

use crate::ambient::{AmbientDriver, AmbientSchedule};
use crate::color::Color;
use crate::config::{DEFAULT_MAX_CHANNELS, DEFAULT_REFRESH_INTERVAL_MS};
use crate::device::Device;
use crate::dispatch::{FrameDispatcher, OutputStats};
use crate::scheduler::PeriodicTask;
use crate::transport::Transport;
use crate::{error::EngineError, Result};

/// Universe statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniverseStats {
    /// Refresh ticks run so far
    pub ticks: u64,
    /// Transport side counters
    pub output: OutputStats,
}

/// State shared with the refresh task
struct UniverseCore {
    id: u16,
    devices: Vec<Arc<Device>>,
    max_channels: usize,
    dispatcher: Mutex<FrameDispatcher>,
    ticks: AtomicU64,
}

impl UniverseCore {
    fn compose_frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.max_channels);
        for device in &self.devices {
            frame.extend(device.channel_bytes(device.channel_clusters()));
        }
        // Pad with zeros to force everything past the last device off
        frame.resize(self.max_channels, 0);
        frame
    }

    fn refresh(&self) -> Vec<u8> {
        let frame = self.compose_frame();
        if self.dispatcher.lock().dispatch(frame.clone()) {
            trace!("Universe {} frame dispatched", self.id);
        }
        frame
    }

    fn tick(&self) -> Vec<u8> {
        for device in &self.devices {
            device.step();
        }
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.refresh()
    }
}

/// Builder for a universe's device roster
pub struct UniverseBuilder {
    id: u16,
    max_channels: usize,
    refresh_interval: Duration,
    devices: Vec<Device>,
}

impl UniverseBuilder {
    /// Set the frame size (default 512)
    pub fn max_channels(mut self, max_channels: usize) -> Self {
        self.max_channels = max_channels;
        self
    }

    /// Set the refresh period (default 16 ms)
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Append a device at the next wire position
    pub fn add_device(mut self, channel_clusters: usize, color_channel_count: usize) -> Result<Self> {
        self.devices
            .push(Device::new(channel_clusters, color_channel_count)?);
        Ok(self)
    }

    /// Validate the roster against the frame size and spawn the output worker
    pub fn build(self, transport: Arc<dyn Transport>) -> Result<Universe> {
        let bytes: usize = self.devices.iter().map(Device::byte_len).sum();
        if bytes > self.max_channels {
            return Err(EngineError::InvalidGeometry(format!(
                "universe {} needs {} channels but only has {}",
                self.id, bytes, self.max_channels
            )));
        }
        if self.refresh_interval.is_zero() {
            return Err(EngineError::InvalidGeometry(
                "refresh interval must be non-zero".to_string(),
            ));
        }

        let dispatcher = FrameDispatcher::spawn(self.id, transport)?;
        let devices: Vec<Arc<Device>> = self.devices.into_iter().map(Arc::new).collect();
        let ambient: Vec<Option<AmbientDriver>> = devices.iter().map(|_| None).collect();

        info!(
            "Universe {} built with {} devices ({} of {} channels used)",
            self.id,
            devices.len(),
            bytes,
            self.max_channels
        );

        Ok(Universe {
            core: Arc::new(UniverseCore {
                id: self.id,
                devices,
                max_channels: self.max_channels,
                dispatcher: Mutex::new(dispatcher),
                ticks: AtomicU64::new(0),
            }),
            refresh_interval: self.refresh_interval,
            refresh_task: Mutex::new(None),
            ambient: Mutex::new(ambient),
        })
    }
}

/// An addressable network of devices sharing one frame
pub struct Universe {
    core: Arc<UniverseCore>,
    refresh_interval: Duration,
    refresh_task: Mutex<Option<PeriodicTask>>,
    ambient: Mutex<Vec<Option<AmbientDriver>>>,
}

impl Universe {
    /// Start describing a universe with the given network id
    pub fn builder(id: u16) -> UniverseBuilder {
        UniverseBuilder {
            id,
            max_channels: DEFAULT_MAX_CHANNELS,
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            devices: Vec::new(),
        }
    }

    /// Network id of this universe
    pub fn id(&self) -> u16 {
        self.core.id
    }

    /// Frame size
    pub fn max_channels(&self) -> usize {
        self.core.max_channels
    }

    /// Refresh period
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Number of devices
    pub fn len(&self) -> usize {
        self.core.devices.len()
    }

    /// Whether the roster is empty
    pub fn is_empty(&self) -> bool {
        self.core.devices.is_empty()
    }

    /// Device at `index`
    pub fn device(&self, index: usize) -> Result<&Arc<Device>> {
        self.core
            .devices
            .get(index)
            .ok_or(EngineError::DeviceNotFound {
                index,
                len: self.core.devices.len(),
            })
    }

    /// All devices in wire order
    pub fn devices(&self) -> &[Arc<Device>] {
        &self.core.devices
    }

    /// Reject `color` unless every device takes its channel count
    fn check_all(&self, color: &Color) -> Result<()> {
        match self
            .core
            .devices
            .iter()
            .find(|d| d.color_channel_count() != color.len())
        {
            Some(device) => Err(EngineError::ChannelCount {
                expected: device.color_channel_count(),
                actual: color.len(),
            }),
            None => Ok(()),
        }
    }

    /// Cut one device to `color`
    pub fn set_one(&self, index: usize, color: Color) -> Result<()> {
        self.device(index)?.set_color(color)
    }

    /// Cut every device to `color`.
    ///
    /// Either all devices change or none do.
    pub fn set_all(&self, color: Color) -> Result<()> {
        self.check_all(&color)?;
        for device in &self.core.devices {
            device.set_color(color.clone())?;
        }
        Ok(())
    }

    /// Fade one device to `color` over `steps` ticks
    pub fn fade_one(&self, index: usize, color: Color, steps: u32) -> Result<()> {
        self.device(index)?.fade_color(color, steps)
    }

    /// Fade every device to `color` over `steps` ticks.
    ///
    /// Either all devices change or none do.
    pub fn fade_all(&self, color: Color, steps: u32) -> Result<()> {
        self.check_all(&color)?;
        for device in &self.core.devices {
            device.fade_color(color.clone(), steps)?;
        }
        Ok(())
    }

    /// Compose the current frame without stepping or sending it
    pub fn compose_frame(&self) -> Vec<u8> {
        self.core.compose_frame()
    }

    /// Compose the current frame and hand it to the transport.
    ///
    /// Always returns exactly `max_channels` bytes.
    pub fn refresh(&self) -> Vec<u8> {
        self.core.refresh()
    }

    /// Step every device once, then refresh
    pub fn tick(&self) -> Vec<u8> {
        self.core.tick()
    }

    /// Start the periodic refresh task. Does nothing if already running.
    pub fn start(&self) -> Result<()> {
        let mut task = self.refresh_task.lock();
        if task.as_ref().is_some_and(PeriodicTask::is_running) {
            warn!("Universe {} refresh already running", self.id());
            return Ok(());
        }

        let core = self.core.clone();
        let interval = self.refresh_interval;
        *task = Some(PeriodicTask::spawn(
            format!("dmx-universe-{}", self.id()),
            Duration::ZERO,
            move || {
                core.tick();
                interval
            },
        )?);

        info!(
            "Universe {} refreshing every {:?}",
            self.id(),
            self.refresh_interval
        );
        Ok(())
    }

    /// Stop the refresh task. No tick runs after this returns.
    pub fn stop(&self) {
        if let Some(mut task) = self.refresh_task.lock().take() {
            task.stop();
            info!("Universe {} refresh stopped", self.id());
        }
    }

    /// Whether the refresh task is running
    pub fn is_running(&self) -> bool {
        self.refresh_task
            .lock()
            .as_ref()
            .is_some_and(PeriodicTask::is_running)
    }

    /// Ambient timing for `steps` at this universe's refresh rate
    pub fn ambient_schedule(&self, steps: u32) -> AmbientSchedule {
        AmbientSchedule::new(steps, self.refresh_interval)
    }

    /// Start ambient mode on one device, replacing any running cycle
    pub fn start_device_ambient(&self, index: usize, schedule: AmbientSchedule) -> Result<()> {
        let device = self.device(index)?.clone();
        let mut ambient = self.ambient.lock();
        if let Some(mut previous) = ambient[index].take() {
            previous.stop();
        }
        ambient[index] = Some(AmbientDriver::start(
            format!("dmx-ambient-{}-{}", self.id(), index),
            device,
            schedule,
        )?);
        Ok(())
    }

    /// Stop ambient mode on one device
    pub fn stop_device_ambient(&self, index: usize) -> Result<()> {
        self.device(index)?;
        if let Some(mut driver) = self.ambient.lock()[index].take() {
            driver.stop();
        }
        Ok(())
    }

    /// Start ambient mode on every device
    pub fn start_ambient(&self, schedule: AmbientSchedule) -> Result<()> {
        for index in 0..self.len() {
            self.start_device_ambient(index, schedule)?;
        }
        Ok(())
    }

    /// Stop ambient mode on every device
    pub fn stop_ambient(&self) {
        for slot in self.ambient.lock().iter_mut() {
            if let Some(mut driver) = slot.take() {
                driver.stop();
            }
        }
    }

    /// Number of devices currently in ambient mode
    pub fn ambient_count(&self) -> usize {
        self.ambient
            .lock()
            .iter()
            .filter(|d| d.as_ref().is_some_and(AmbientDriver::is_running))
            .count()
    }

    /// Snapshot of the universe statistics
    pub fn stats(&self) -> UniverseStats {
        UniverseStats {
            ticks: self.core.ticks.load(Ordering::Relaxed),
            output: self.core.dispatcher.lock().stats(),
        }
    }

    /// Stop ambient drivers and refresh, then close the output worker
    pub fn shutdown(&self) {
        self.stop_ambient();
        self.stop();
        self.core.dispatcher.lock().shutdown();
    }
}

impl Drop for Universe {
    fn drop(&mut self) {
        self.shutdown();
    }
}
