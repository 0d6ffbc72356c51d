//! Fixture fade state machine
//!
//! A [`Device`] is either idle (`steps_completed == target_steps`) or fading
//! (`steps_completed < target_steps`). The refresh tick calls [`Device::step`]
//! once per frame; callers change the color with [`Device::set_color`] (an
//! immediate cut) or [`Device::fade_color`] (a linear fade over N ticks).
//!
//! All mutable state sits behind one mutex per device, so the refresh tick,
//! ambient drivers and external callers serialize on the same device without
//! ever contending across devices.

use parking_lot::Mutex;

use crate::color::{Color, MAX_LEVEL, MIN_LEVEL};
use crate::{error::EngineError, Result};

/// Mutable fade state of a device
#[derive(Debug, Clone)]
struct FadeState {
    current: Color,
    steps_completed: u32,
    target_steps: u32,
    target: Color,
    step_delta: Vec<f32>,
    needs_refresh: bool,
}

impl FadeState {
    fn is_fading(&self) -> bool {
        self.steps_completed < self.target_steps
    }

    fn assign(&mut self, color: Color) {
        self.current = color;
        self.steps_completed = self.target_steps;
        self.needs_refresh = true;
    }
}

/// One fixture, or a cluster of identical fixtures sharing a channel set
#[derive(Debug)]
pub struct Device {
    channel_clusters: usize,
    color_channel_count: usize,
    state: Mutex<FadeState>,
}

impl Device {
    /// Create a device starting at black
    ///
    /// # Arguments
    /// * `channel_clusters` - How many times the color repeats in the frame
    /// * `color_channel_count` - Channels per color (1-4)
    pub fn new(channel_clusters: usize, color_channel_count: usize) -> Result<Self> {
        if channel_clusters == 0 {
            return Err(EngineError::InvalidGeometry(
                "device needs at least one channel cluster".to_string(),
            ));
        }
        let current = Color::black(color_channel_count)?;
        let target = current.clone();

        Ok(Self {
            channel_clusters,
            color_channel_count,
            state: Mutex::new(FadeState {
                current,
                steps_completed: 0,
                target_steps: 0,
                target,
                step_delta: vec![0.0; color_channel_count],
                needs_refresh: false,
            }),
        })
    }

    /// Repeat count of this device's color within the frame
    pub fn channel_clusters(&self) -> usize {
        self.channel_clusters
    }

    /// Channels per color
    pub fn color_channel_count(&self) -> usize {
        self.color_channel_count
    }

    /// Number of frame bytes this device occupies
    pub fn byte_len(&self) -> usize {
        self.channel_clusters * self.color_channel_count
    }

    fn check_channels(&self, color: &Color) -> Result<()> {
        if color.len() != self.color_channel_count {
            return Err(EngineError::ChannelCount {
                expected: self.color_channel_count,
                actual: color.len(),
            });
        }
        Ok(())
    }

    /// Cut straight to `color`, cancelling any fade in progress
    pub fn set_color(&self, color: Color) -> Result<()> {
        self.check_channels(&color)?;
        self.state.lock().assign(color);
        Ok(())
    }

    /// Start a linear fade to `color` over `steps` ticks.
    ///
    /// A zero step count behaves like [`Device::set_color`].
    pub fn fade_color(&self, color: Color, steps: u32) -> Result<()> {
        self.check_channels(&color)?;
        let mut state = self.state.lock();

        if steps == 0 {
            state.assign(color);
            return Ok(());
        }

        state.step_delta = color
            .channels()
            .iter()
            .zip(state.current.channels())
            .map(|(target, current)| (target - current) / steps as f32)
            .collect();
        state.target = color.clamped();
        state.steps_completed = 0;
        state.target_steps = steps;
        state.needs_refresh = true;
        Ok(())
    }

    /// Advance the fade by one tick.
    ///
    /// Every channel moves by its delta and is clamped to
    /// `MIN_LEVEL..=MAX_LEVEL`. The final step lands on the clamped target
    /// exactly instead of the accumulated sum.
    pub fn step(&self) {
        let mut state = self.state.lock();

        if !state.is_fading() {
            state.needs_refresh = false;
            return;
        }

        let steps_completed = state.steps_completed + 1;
        if steps_completed == state.target_steps {
            let target = state.target.clone();
            state.assign(target);
        } else {
            let next: Vec<f32> = state
                .current
                .channels()
                .iter()
                .zip(&state.step_delta)
                .map(|(value, delta)| (value + delta).clamp(MIN_LEVEL, MAX_LEVEL))
                .collect();

            // Same channel count and finite deltas, so construction cannot fail
            if let Ok(color) = Color::new(next) {
                state.assign(color);
            }
        }
        state.steps_completed = steps_completed;
        state.needs_refresh = state.is_fading();
    }

    /// Whether the device has a change the refresh tick has not consumed yet
    pub fn needs_refresh(&self) -> bool {
        self.state.lock().needs_refresh
    }

    /// Whether a fade is in progress
    pub fn is_fading(&self) -> bool {
        self.state.lock().is_fading()
    }

    /// Snapshot of the current color
    pub fn current_color(&self) -> Color {
        self.state.lock().current.clone()
    }

    /// `(steps_completed, target_steps)` of the current fade
    pub fn progress(&self) -> (u32, u32) {
        let state = self.state.lock();
        (state.steps_completed, state.target_steps)
    }

    /// The current color as bytes, tiled `cluster_count` times
    pub fn channel_bytes(&self, cluster_count: usize) -> Vec<u8> {
        let bytes = self.state.lock().current.to_bytes();
        bytes.repeat(cluster_count)
    }
}
