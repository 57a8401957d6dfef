//! PLY file loading and writing

mod loader;
mod writer;

pub use loader::{PlyMesh, load_ply};
pub use writer::write_ply;
