//! Error types for data loading and writing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing point cloud data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No .ply files found in {0}")]
    EmptyFolder(PathBuf),

    #[error("PLY parsing error in {path}: {message}")]
    PlyParse { path: PathBuf, message: String },

    #[error("Missing '{property}' at vertex {vertex} in {path}")]
    MissingProperty {
        path: PathBuf,
        property: &'static str,
        vertex: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
