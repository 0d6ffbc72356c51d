//! Channel color values
//!
//! A [`Color`] is an immutable vector of 1 to 4 floating point channel
//! intensities. Every fade step produces a new value; nothing mutates a color
//! in place.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::EngineError, Result};

/// Smallest supported channel count
pub const MIN_CHANNELS: usize = 1;
/// Largest supported channel count
pub const MAX_CHANNELS: usize = 4;

/// Lower bound a fading channel is clamped to
pub const MIN_LEVEL: f32 = 1.0;
/// Upper bound a fading channel is clamped to
pub const MAX_LEVEL: f32 = 254.0;

/// An immutable 1-4 channel DMX color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Color {
    values: Vec<f32>,
}

impl Color {
    /// Create a color from 1-4 finite channel values
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if !(MIN_CHANNELS..=MAX_CHANNELS).contains(&values.len()) {
            return Err(EngineError::ChannelCount {
                expected: if values.is_empty() {
                    MIN_CHANNELS
                } else {
                    MAX_CHANNELS
                },
                actual: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::NonFiniteChannel { index });
        }
        Ok(Self { values })
    }

    /// Create a color with every channel at zero
    pub fn black(channels: usize) -> Result<Self> {
        Self::new(vec![0.0; channels])
    }

    /// Create a color with every channel at 255
    pub fn full(channels: usize) -> Result<Self> {
        Self::new(vec![255.0; channels])
    }

    /// Rebuild a color from raw channel bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes.iter().map(|b| *b as f32).collect())
    }

    /// Channel values, for reading and interpolation
    pub fn channels(&self) -> &[f32] {
        &self.values
    }

    /// Number of channels in this color
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false, a color has at least one channel
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy with every channel clamped to `MIN_LEVEL..=MAX_LEVEL`
    pub fn clamped(&self) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|v| v.clamp(MIN_LEVEL, MAX_LEVEL))
                .collect(),
        }
    }

    /// Narrow each channel to a byte.
    ///
    /// Values truncate toward zero and then wrap modulo 256, the same as an
    /// unsigned 8-bit cast of the integer part. Out-of-range input is not
    /// saturated.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.values.iter().map(|v| *v as i32 as u8).collect()
    }
}

impl TryFrom<Vec<f32>> for Color {
    type Error = EngineError;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<Color> for Vec<f32> {
    fn from(color: Color) -> Self {
        color.values
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DMX Color:")?;
        for v in &self.values {
            write!(f, " {}", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_count_limits() {
        assert!(Color::new(vec![10.0]).is_ok());
        assert!(Color::new(vec![10.0, 20.0, 30.0, 40.0]).is_ok());

        let err = Color::new(vec![10.0, 20.0, 30.0, 40.0, 50.0]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ChannelCount {
                expected: 4,
                actual: 5
            }
        ));

        let err = Color::new(Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ChannelCount {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_rejects_non_finite_channels() {
        let err = Color::new(vec![f32::NAN]).unwrap_err();
        assert!(matches!(err, EngineError::NonFiniteChannel { index: 0 }));

        let err = Color::new(vec![10.0, 10.0, f32::NEG_INFINITY]).unwrap_err();
        assert!(matches!(err, EngineError::NonFiniteChannel { index: 2 }));

        let err = Color::try_from(vec![f32::INFINITY, 10.0, 10.0]).unwrap_err();
        assert!(matches!(err, EngineError::NonFiniteChannel { index: 0 }));
    }

    #[test]
    fn test_to_bytes_truncates() {
        let color = Color::new(vec![0.0, 10.9, 254.5, 255.0]).unwrap();
        assert_eq!(color.to_bytes(), vec![0, 10, 254, 255]);
    }

    #[test]
    fn test_to_bytes_wraps_like_a_byte_cast() {
        let color = Color::new(vec![256.0, 300.0, -1.0]).unwrap();
        assert_eq!(color.to_bytes(), vec![0, 44, 255]);
    }

    #[test]
    fn test_equality() {
        let a = Color::new(vec![1.0, 2.0, 3.0]).unwrap();
        let b = Color::new(vec![1.0, 2.0, 3.0]).unwrap();
        let c = Color::new(vec![1.0, 2.0, 4.0]).unwrap();
        let d = Color::new(vec![1.0, 2.0]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        // Length mismatch is plain inequality
        assert_ne!(a, d);
    }

    #[test]
    fn test_clamped() {
        let color = Color::new(vec![0.0, 128.0, 255.0]).unwrap();
        assert_eq!(color.clamped().channels(), &[1.0, 128.0, 254.0]);
    }

    #[test]
    fn test_display() {
        let color = Color::new(vec![10.0, 20.5]).unwrap();
        assert_eq!(color.to_string(), "DMX Color: 10 20.5");
    }

    #[test]
    fn test_serde_validates_channel_count() {
        let color: Color = serde_json::from_str("[10.0, 20.0, 30.0]").unwrap();
        assert_eq!(color.channels(), &[10.0, 20.0, 30.0]);

        assert!(serde_json::from_str::<Color>("[1, 2, 3, 4, 5]").is_err());
        assert!(serde_json::from_str::<Color>("[]").is_err());
    }
}
