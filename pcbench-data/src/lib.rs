//! Pcbench Data Crate
//!
//! Point cloud types, PLY reading and writing, and per-view folder ingestion.
//! Nothing in here knows about codecs or sweeps; the evaluation crates build on
//! these types.

mod error;
pub mod folder;
pub mod ply;
pub mod types;

pub use error::DataError;
pub use folder::{MeshMetadata, ViewFolder, load_folder};
pub use ply::{PlyMesh, load_ply, write_ply};
pub use types::{Bounds, DEFAULT_COLOR, Point, PointCloud};
