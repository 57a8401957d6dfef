//! Pcbench Codec Crate
//!
//! An octree point cloud codec with three layers:
//!
//! - octree: breadth-first child occupancy of the quantised voxel grid
//! - centroid: optional per-voxel offset of the point centroid (enhancement layer)
//! - color: per-voxel mean colour, coded natively or as a predicted raster
//!
//! Encoders and decoders are long-lived: one instance is expected to code
//! many frames in a row with the same configuration.

mod bits;
mod color;
mod config;
mod decoder;
mod encoder;
mod error;
mod header;
mod morton;
mod octree;

pub use config::{CodecConfig, ColorCodingType, MAX_OCTREE_BITS};
pub use decoder::OctreeDecoder;
pub use encoder::OctreeEncoder;
pub use error::CodecError;
pub use header::HEADER_LEN;

use pcbench_data::PointCloud;

/// Bytes spent in each layer of the last encoded frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerByteCounts {
    pub octree: u64,
    pub centroid: u64,
    pub color: u64,
}

impl LayerByteCounts {
    pub fn total(&self) -> u64 {
        self.octree + self.centroid + self.color
    }
}

/// Trait for point cloud encoders.
pub trait PointCloudEncoder {
    /// Encode `cloud` and append the stream to `sink`.
    fn encode(&mut self, cloud: &PointCloud, sink: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Per-layer byte breakdown of the most recent successful `encode`.
    fn performance_metrics(&self) -> LayerByteCounts;
}

/// Trait for point cloud decoders.
pub trait PointCloudDecoder {
    /// Decode one complete stream produced by a matching encoder.
    fn decode(&mut self, stream: &[u8]) -> Result<PointCloud, CodecError>;
}
