//! Error types for the fade engine
use thiserror::Error;

/// Fade engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A color's channel count does not fit the target
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelCount {
        /// Channel count the target accepts
        expected: usize,
        /// Channel count that was supplied
        actual: usize,
    },

    /// A color channel is NaN or infinite
    #[error("channel {index} is not a finite number")]
    NonFiniteChannel {
        /// Position of the offending channel
        index: usize,
    },

    /// Device index outside the universe roster
    #[error("device {index} not found (universe has {len} devices)")]
    DeviceNotFound {
        /// Requested index
        index: usize,
        /// Roster size
        len: usize,
    },

    /// Universe id outside the manager roster
    #[error("universe {id} not found (manager has {len} universes)")]
    UniverseNotFound {
        /// Requested id
        id: usize,
        /// Roster size
        len: usize,
    },

    /// Device geometry rejected at build time
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Ambient timing that would cut instead of fade
    #[error("invalid ambient schedule: {0}")]
    InvalidSchedule(String),

    /// Background worker could not be started
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Frame could not be handed to the transport
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failures surfaced from the transport boundary
#[derive(Error, Debug)]
pub enum TransportError {
    /// I/O error while sending
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The receiving end is gone
    #[error("transport disconnected")]
    Disconnected,

    /// The transport cannot take another frame right now
    #[error("transport busy")]
    Busy,

    /// The transport refused the frame
    #[error("frame rejected: {0}")]
    Rejected(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::ChannelCount {
            expected: 3,
            actual: 4,
        };
        assert_eq!(err.to_string(), "channel count mismatch: expected 3, got 4");

        let err = EngineError::DeviceNotFound { index: 7, len: 2 };
        assert_eq!(err.to_string(), "device 7 not found (universe has 2 devices)");

        let err = EngineError::NonFiniteChannel { index: 1 };
        assert_eq!(err.to_string(), "channel 1 is not a finite number");
    }

    #[test]
    fn test_transport_error_conversion() {
        let err: EngineError = TransportError::Disconnected.into();
        assert!(matches!(
            err,
            EngineError::Transport(TransportError::Disconnected)
        ));
    }
}
