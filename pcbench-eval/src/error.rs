//! Error types for the evaluation pipeline.

use pcbench_codec::CodecError;
use pcbench_data::DataError;
use pcbench_quality::QualityError;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with the input folders. Fatal at startup.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("No input folders given")]
    NoFolders,

    #[error(
        "Folder {folder} has {found} frames but {reference} has {expected}; views must have equal length"
    )]
    ShapeMismatch {
        reference: PathBuf,
        expected: usize,
        folder: PathBuf,
        found: usize,
    },
}

/// A fused frame could not be mapped into the unit cube. Only that frame is dropped.
#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("Bounding box expansion factor must be finite and non-negative, got {0}")]
    InvalidExpandFactor(f32),

    #[error("Frame {frame} is empty")]
    EmptyCloud { frame: usize },

    #[error("Frame {frame} has a non-finite coordinate at point {index}")]
    NonFinite { frame: usize, index: usize },

    #[error("Frame {frame}: normalised coordinate {value} on axis {axis} outside [0, 1]")]
    OutOfRange { frame: usize, axis: usize, value: f32 },
}

/// Failure of a single (configuration, frame) evaluation. Recorded as a skipped row.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("codec: {0}")]
    Codec(#[from] CodecError),

    #[error("quality: {0}")]
    Quality(#[from] QualityError),

    #[error("artifact: {0}")]
    Artifact(#[from] DataError),
}

impl FrameError {
    /// Short marker used in the report's status column.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::Codec(_) => "codec",
            FrameError::Quality(_) => "quality",
            FrameError::Artifact(_) => "artifact",
        }
    }
}

/// Errors that abort a whole sweep.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Invalid sweep parameters: {0}")]
    InvalidGrid(#[source] CodecError),

    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Sweep cancelled after {rows} rows")]
    Cancelled { rows: usize },
}
