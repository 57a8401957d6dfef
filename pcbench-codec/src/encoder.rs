//! Octree encoder.

use crate::color::encode_colors;
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::header::{HEADER_LEN, HeaderInfo};
use crate::octree::{Voxel, encode_occupancy, voxelize};
use crate::bits::BitWriter;
use crate::{LayerByteCounts, PointCloudEncoder};
use pcbench_data::PointCloud;
use tracing::debug;

/// Encoder for clouds normalised to the unit cube.
///
/// Scratch buffers are kept between frames; the produced stream depends only
/// on the configuration and the input cloud.
pub struct OctreeEncoder {
    config: CodecConfig,
    metrics: LayerByteCounts,
    frames_encoded: u64,
    voxels: Vec<Voxel>,
    octree_layer: Vec<u8>,
    color_layer: Vec<u8>,
}

impl OctreeEncoder {
    pub fn new(config: CodecConfig) -> Result<Self, CodecError> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: LayerByteCounts::default(),
            frames_encoded: 0,
            voxels: Vec::new(),
            octree_layer: Vec::new(),
            color_layer: Vec::new(),
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Number of frames this instance has encoded successfully.
    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    fn encode_centroids(&self) -> Vec<u8> {
        if !self.config.codes_centroids() {
            return Vec::new();
        }
        let bits = self.config.enh_bits;
        let steps = (1u32 << bits) as f64;
        let max = (1u32 << bits) - 1;
        let mut writer = BitWriter::new();
        for voxel in &self.voxels {
            for offset in voxel.mean_offset() {
                let q = ((offset * steps).floor() as u32).min(max);
                writer.write(q, bits);
            }
        }
        writer.finish()
    }
}

fn layer_len(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::InvalidConfig(format!("layer of {len} bytes exceeds 4 GiB")))
}

impl PointCloudEncoder for OctreeEncoder {
    fn encode(&mut self, cloud: &PointCloud, sink: &mut Vec<u8>) -> Result<(), CodecError> {
        if cloud.is_empty() {
            return Err(CodecError::EmptyCloud);
        }
        let point_count = u32::try_from(cloud.len())
            .map_err(|_| CodecError::InvalidConfig("more than u32::MAX points".into()))?;

        voxelize(cloud, self.config.octree_bits, &mut self.voxels)?;

        self.octree_layer.clear();
        let codes: Vec<u64> = self.voxels.iter().map(|v| v.code).collect();
        encode_occupancy(&codes, self.config.octree_bits, &mut self.octree_layer);

        let centroid_layer = self.encode_centroids();

        self.color_layer.clear();
        let colors: Vec<[u8; 3]> = self.voxels.iter().map(Voxel::mean_color).collect();
        encode_colors(
            &colors,
            self.config.color_bits,
            self.config.color_coding,
            &mut self.color_layer,
        );

        let header = HeaderInfo {
            point_count,
            leaf_count: layer_len(self.voxels.len())?,
            octree_bytes: layer_len(self.octree_layer.len())?,
            centroid_bytes: layer_len(centroid_layer.len())?,
            color_bytes: layer_len(self.color_layer.len())?,
            config: self.config,
        };

        sink.reserve(HEADER_LEN + self.octree_layer.len() + centroid_layer.len() + self.color_layer.len());
        sink.extend_from_slice(&header.to_bytes());
        sink.extend_from_slice(&self.octree_layer);
        sink.extend_from_slice(&centroid_layer);
        sink.extend_from_slice(&self.color_layer);

        self.metrics = LayerByteCounts {
            octree: (HEADER_LEN + self.octree_layer.len()) as u64,
            centroid: centroid_layer.len() as u64,
            color: self.color_layer.len() as u64,
        };
        self.frames_encoded += 1;

        debug!(
            "Encoded {} points into {} voxels: octree {} B, centroid {} B, color {} B",
            point_count,
            self.voxels.len(),
            self.metrics.octree,
            self.metrics.centroid,
            self.metrics.color
        );
        Ok(())
    }

    fn performance_metrics(&self) -> LayerByteCounts {
        self.metrics
    }
}
