//! Ambient mode: a device fading between full on and full off by itself
//!
//! Each cycle issues one fade and then waits roughly as long as the fade
//! takes, plus a random jitter of a few seconds so devices running ambient
//! mode drift apart instead of pulsing in lockstep. The driver only calls
//! [`Device::fade_color`]; stepping stays with the universe refresh tick.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info};

use crate::color::Color;
use crate::device::Device;
use crate::error::EngineError;
use crate::scheduler::PeriodicTask;
use crate::Result;

/// Default upper bound of the random pause added to each cycle
pub const DEFAULT_JITTER: Duration = Duration::from_secs(3);

/// Timing of an ambient cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientSchedule {
    /// Steps per fade
    pub steps: u32,
    /// Duration of one refresh tick
    pub tick: Duration,
    /// Upper bound of the random extra delay per cycle
    pub jitter: Duration,
}

impl AmbientSchedule {
    /// Schedule with the default jitter
    pub fn new(steps: u32, tick: Duration) -> Self {
        Self {
            steps,
            tick,
            jitter: DEFAULT_JITTER,
        }
    }

    /// Reject schedules with no steps or no tick.
    ///
    /// A zero step fade is a cut, which would put raw 0 and 255 on the wire
    /// and spin the driver without any delay between cycles.
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(EngineError::InvalidSchedule(
                "ambient fades need at least one step".to_string(),
            ));
        }
        if self.tick.is_zero() {
            return Err(EngineError::InvalidSchedule(
                "ambient tick must be longer than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Time a fade of `steps` ticks takes to play out
    pub fn fade_duration(&self) -> Duration {
        self.tick * self.steps
    }

    /// Delay before the next cycle: fade duration plus random jitter
    pub fn next_delay(&self, rng: &mut impl Rng) -> Duration {
        self.fade_duration() + random_jitter(self.jitter, rng)
    }
}

fn random_jitter(max: Duration, rng: &mut impl Rng) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rng.random_range(0..=max_ms))
}

/// Running ambient cycle for one device
pub struct AmbientDriver {
    task: PeriodicTask,
}

impl AmbientDriver {
    /// Start cycling `device`, beginning with a fade to full on
    pub fn start(name: impl Into<String>, device: Arc<Device>, schedule: AmbientSchedule) -> Result<Self> {
        schedule.validate()?;
        let channels = device.color_channel_count();
        let on = Color::full(channels)?;
        let off = Color::black(channels)?;
        let name = name.into();

        let initial_delay = random_jitter(schedule.jitter, &mut rand::rng());
        let mut fade_on = true;

        let task = PeriodicTask::spawn(name.clone(), initial_delay, move || {
            let target = if fade_on { on.clone() } else { off.clone() };
            if let Err(e) = device.fade_color(target, schedule.steps) {
                error!("Ambient fade failed: {}", e);
            }
            fade_on = !fade_on;
            schedule.next_delay(&mut rand::rng())
        })?;

        info!(
            "Ambient mode '{}' started ({} steps, up to {:?} jitter)",
            name, schedule.steps, schedule.jitter
        );

        Ok(Self { task })
    }

    /// Stop the cycle. No further fades are issued once this returns.
    pub fn stop(&mut self) {
        self.task.stop();
        info!("Ambient mode '{}' stopped", self.task.name());
    }

    /// Whether the cycle is still running
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_next_delay_bounds() {
        let schedule = AmbientSchedule::new(60, Duration::from_millis(16));
        let mut rng = rand::rng();

        for _ in 0..100 {
            let delay = schedule.next_delay(&mut rng);
            assert!(delay >= Duration::from_millis(960));
            assert!(delay <= Duration::from_millis(960) + DEFAULT_JITTER);
        }
    }

    #[test]
    fn test_rejects_cut_schedules() {
        let device = Arc::new(Device::new(1, 3).unwrap());
        for schedule in [
            AmbientSchedule {
                steps: 0,
                tick: Duration::from_millis(16),
                jitter: Duration::ZERO,
            },
            AmbientSchedule {
                steps: 10,
                tick: Duration::ZERO,
                jitter: Duration::ZERO,
            },
        ] {
            assert!(matches!(
                schedule.validate(),
                Err(EngineError::InvalidSchedule(_))
            ));
            assert!(AmbientDriver::start("ambient-test", device.clone(), schedule).is_err());
        }

        // Nothing reached the device
        assert_eq!(device.current_color(), Color::black(3).unwrap());
        assert!(!device.needs_refresh());
    }

    #[test]
    fn test_zero_jitter() {
        let schedule = AmbientSchedule {
            steps: 10,
            tick: Duration::from_millis(1),
            jitter: Duration::ZERO,
        };
        assert_eq!(schedule.next_delay(&mut rand::rng()), Duration::from_millis(10));
    }

    #[test]
    fn test_alternates_on_and_off() {
        let device = Arc::new(Device::new(1, 3).unwrap());
        let schedule = AmbientSchedule {
            steps: 1,
            tick: Duration::from_millis(200),
            jitter: Duration::ZERO,
        };
        let mut driver = AmbientDriver::start("test-ambient", device.clone(), schedule).unwrap();

        // Wait for the fade to full on
        let deadline = Instant::now() + Duration::from_secs(5);
        while !device.is_fading() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        device.step();
        assert_eq!(device.current_color().channels(), &[254.0, 254.0, 254.0]);

        // Then back toward off
        while !device.is_fading() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        device.step();
        assert_eq!(device.current_color().channels(), &[1.0, 1.0, 1.0]);

        driver.stop();
        assert!(!driver.is_running());
    }

    #[test]
    fn test_stop_halts_fades() {
        let device = Arc::new(Device::new(1, 1).unwrap());
        let schedule = AmbientSchedule {
            steps: 1,
            tick: Duration::from_millis(1),
            jitter: Duration::ZERO,
        };
        let mut driver = AmbientDriver::start("test-ambient-stop", device.clone(), schedule).unwrap();
        thread::sleep(Duration::from_millis(20));
        driver.stop();

        // Drain whatever fade was issued before stop, then nothing new arrives
        device.step();
        device.step();
        thread::sleep(Duration::from_millis(20));
        assert!(!device.is_fading());
    }
}
