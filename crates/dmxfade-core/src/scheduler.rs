//! Periodic background tasks with synchronous cancellation
//!
//! A [`PeriodicTask`] runs its body on a dedicated thread. The body returns the
//! delay before its next run, which lets the same primitive drive the fixed
//! rate refresh tick and the randomized ambient schedule.
//!
//! Between runs the thread blocks on a stop channel with a timeout instead of
//! sleeping, so [`PeriodicTask::stop`] wakes it at once. `stop` joins the
//! thread: once it returns the body is guaranteed not to run again.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use tracing::{debug, error};

use crate::{error::EngineError, Result};

/// Handle to a running periodic task
pub struct PeriodicTask {
    name: String,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn a task whose first run happens after `initial_delay`.
    ///
    /// The body is never run concurrently with itself. A body that takes
    /// longer than the delay it asked for is simply run again right away.
    pub fn spawn<F>(name: impl Into<String>, initial_delay: Duration, mut body: F) -> Result<Self>
    where
        F: FnMut() -> Duration + Send + 'static,
    {
        let name = name.into();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut next_run = Instant::now() + initial_delay;
                loop {
                    let wait = next_run.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        // Stop requested or handle dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let started = Instant::now();
                    let delay = body();
                    next_run = started + delay;
                }
            })
            .map_err(EngineError::Spawn)?;

        debug!("Periodic task '{}' started", name);

        Ok(Self {
            name,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Task name, also used as the thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    /// Stop the task and wait for its thread to exit.
    ///
    /// Must not be called from inside the task body.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // A full or closed channel means the thread is already on its way out
            let _ = tx.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Periodic task '{}' panicked", self.name);
            } else {
                debug!("Periodic task '{}' stopped", self.name);
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}
