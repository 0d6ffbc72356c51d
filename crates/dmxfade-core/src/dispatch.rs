//! Non-blocking frame hand-off to a transport
//!
//! Each universe owns a [`FrameDispatcher`] with a worker thread that performs
//! the actual [`Transport::send`] calls. The refresh tick only ever does a
//! `try_send` into a one-slot queue, so a slow or hanging transport costs
//! dropped frames, never a stalled fade.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, error, warn};

use crate::transport::Transport;
use crate::{error::EngineError, Result};

/// Report every Nth consecutive transport failure after the first
const FAILURE_LOG_INTERVAL: u64 = 100;

/// Output statistics for one universe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStats {
    /// Frames the transport accepted
    pub frames_sent: u64,
    /// Frames discarded because the worker was still busy
    pub frames_dropped: u64,
    /// Transport calls that returned an error
    pub send_failures: u64,
}

/// Worker that feeds frames to a transport
pub struct FrameDispatcher {
    universe_id: u16,
    tx: Option<Sender<Vec<u8>>>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<RwLock<OutputStats>>,
}

impl FrameDispatcher {
    /// Spawn the worker thread for `universe_id`
    pub fn spawn(universe_id: u16, transport: Arc<dyn Transport>) -> Result<Self> {
        let (tx, rx) = bounded::<Vec<u8>>(1);
        let stats = Arc::new(RwLock::new(OutputStats::default()));
        let worker_stats = stats.clone();

        let worker = thread::Builder::new()
            .name(format!("dmx-output-{}", universe_id))
            .spawn(move || {
                let mut consecutive_failures = 0u64;
                for frame in rx.iter() {
                    match transport.send(universe_id, &frame) {
                        Ok(()) => {
                            if consecutive_failures > 0 {
                                debug!(
                                    "Universe {} transport recovered after {} failures",
                                    universe_id, consecutive_failures
                                );
                            }
                            consecutive_failures = 0;
                            worker_stats.write().frames_sent += 1;
                        }
                        Err(e) => {
                            if consecutive_failures % FAILURE_LOG_INTERVAL == 0 {
                                warn!("Universe {} transport send failed: {}", universe_id, e);
                            }
                            consecutive_failures += 1;
                            worker_stats.write().send_failures += 1;
                        }
                    }
                }
                debug!("Universe {} output worker stopped", universe_id);
            })
            .map_err(EngineError::Spawn)?;

        Ok(Self {
            universe_id,
            tx: Some(tx),
            worker: Some(worker),
            stats,
        })
    }

    /// Queue a frame without blocking.
    ///
    /// Returns false when the frame was dropped.
    pub fn dispatch(&self, frame: Vec<u8>) -> bool {
        let Some(tx) = &self.tx else {
            self.stats.write().frames_dropped += 1;
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.stats.write().frames_dropped += 1;
                debug!(
                    "Universe {} output busy, frame dropped",
                    self.universe_id
                );
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.stats.write().frames_dropped += 1;
                false
            }
        }
    }

    /// Snapshot of the output statistics
    pub fn stats(&self) -> OutputStats {
        *self.stats.read()
    }

    /// Close the queue and wait for the worker to finish its current frame
    pub fn shutdown(&mut self) {
        self.tx = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Universe {} output worker panicked", self.universe_id);
            }
        }
    }
}

impl Drop for FrameDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::ChannelTransport;
    use std::time::Duration;

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn send(&self, _universe_id: u16, _frame: &[u8]) -> std::result::Result<(), TransportError> {
            Err(TransportError::Rejected("offline".to_string()))
        }
    }

    struct SlowTransport;

    impl Transport for SlowTransport {
        fn send(&self, _universe_id: u16, _frame: &[u8]) -> std::result::Result<(), TransportError> {
            thread::sleep(Duration::from_millis(200));
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_reaches_transport() {
        let (transport, rx) = ChannelTransport::unbounded();
        let mut dispatcher = FrameDispatcher::spawn(2, Arc::new(transport)).unwrap();

        assert!(dispatcher.dispatch(vec![9; 4]));
        let (id, frame) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(id, 2);
        assert_eq!(frame, vec![9; 4]);

        dispatcher.shutdown();
        assert_eq!(dispatcher.stats().frames_sent, 1);
    }

    #[test]
    fn test_failures_are_counted() {
        let mut dispatcher = FrameDispatcher::spawn(0, Arc::new(FailingTransport)).unwrap();
        dispatcher.dispatch(vec![0; 4]);
        dispatcher.shutdown();

        let stats = dispatcher.stats();
        assert_eq!(stats.send_failures, 1);
        assert_eq!(stats.frames_sent, 0);
    }

    #[test]
    fn test_slow_transport_drops_instead_of_blocking() {
        let dispatcher = FrameDispatcher::spawn(0, Arc::new(SlowTransport)).unwrap();

        let started = std::time::Instant::now();
        for _ in 0..10 {
            dispatcher.dispatch(vec![0; 4]);
        }
        assert!(started.elapsed() < Duration::from_millis(150));
        assert!(dispatcher.stats().frames_dropped > 0);
    }

    #[test]
    fn test_dispatch_after_shutdown_drops() {
        let (transport, _rx) = ChannelTransport::unbounded();
        let mut dispatcher = FrameDispatcher::spawn(0, Arc::new(transport)).unwrap();
        dispatcher.shutdown();

        assert!(!dispatcher.dispatch(vec![0; 4]));
        assert_eq!(dispatcher.stats().frames_dropped, 1);
    }
}
