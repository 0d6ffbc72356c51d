//! Transport boundary
//!
//! The engine only produces frame payloads. Getting them onto the wire is the
//! job of a [`Transport`], which receives the universe id and the 512 byte
//! frame once per tick. Failures are reported back but never change what the
//! engine does next.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::trace;

use crate::error::TransportError;

/// A frame as handed to embedders: `(universe_id, bytes)`
pub type FramePacket = (u16, Vec<u8>);

/// Sink for composed frames
pub trait Transport: Send + Sync {
    /// Send one frame for `universe_id`
    fn send(&self, universe_id: u16, frame: &[u8]) -> Result<(), TransportError>;
}

/// Transport that only traces frames
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTransport;

impl Transport for TracingTransport {
    fn send(&self, universe_id: u16, frame: &[u8]) -> Result<(), TransportError> {
        let lit = frame.iter().filter(|b| **b != 0).count();
        trace!(
            "Universe {} frame: {} bytes, {} non-zero, head {:?}",
            universe_id,
            frame.len(),
            lit,
            &frame[..frame.len().min(8)]
        );
        Ok(())
    }
}

/// Transport that forwards frames over a channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: Sender<FramePacket>,
}

impl ChannelTransport {
    /// Wrap an existing sender
    pub fn new(tx: Sender<FramePacket>) -> Self {
        Self { tx }
    }

    /// Create a transport with an unbounded queue, returning the receiving end
    pub fn unbounded() -> (Self, Receiver<FramePacket>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    /// Create a transport with a bounded queue, returning the receiving end
    pub fn bounded(capacity: usize) -> (Self, Receiver<FramePacket>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, universe_id: u16, frame: &[u8]) -> Result<(), TransportError> {
        self.tx
            .try_send((universe_id, frame.to_vec()))
            .map_err(|e| match e {
                TrySendError::Full(_) => TransportError::Busy,
                TrySendError::Disconnected(_) => TransportError::Disconnected,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_transport_accepts_frames() {
        assert!(TracingTransport.send(0, &[0u8; 512]).is_ok());
        assert!(TracingTransport.send(1, &[]).is_ok());
    }

    #[test]
    fn test_channel_transport_forwards() {
        let (transport, rx) = ChannelTransport::unbounded();
        transport.send(3, &[1, 2, 3]).unwrap();

        let (id, frame) = rx.try_recv().unwrap();
        assert_eq!(id, 3);
        assert_eq!(frame, vec![1, 2, 3]);
    }

    #[test]
    fn test_channel_transport_errors() {
        let (transport, rx) = ChannelTransport::bounded(1);
        transport.send(0, &[1]).unwrap();
        assert!(matches!(transport.send(0, &[2]), Err(TransportError::Busy)));

        drop(rx);
        assert!(matches!(
            transport.send(0, &[3]),
            Err(TransportError::Disconnected)
        ));
    }
}
