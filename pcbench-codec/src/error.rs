//! Error types for encoding and decoding.

use thiserror::Error;

/// Errors that can occur in the codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid codec configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown color coding type: {0}")]
    UnknownColorCoding(i64),

    #[error("Cannot encode an empty point cloud")]
    EmptyCloud,

    #[error("Point {index} lies outside the unit cube: ({x}, {y}, {z})")]
    OutOfRange { index: usize, x: f32, y: f32, z: f32 },

    #[error("Stream does not start with a pcbench header")]
    BadMagic,

    #[error("Stream truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Stream was encoded with {stream}, decoder is configured for {decoder}")]
    ConfigMismatch { stream: String, decoder: String },

    #[error("Corrupt stream: {0}")]
    Corrupt(String),
}
