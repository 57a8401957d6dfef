//! Octree decoder.

use crate::PointCloudDecoder;
use crate::bits::BitReader;
use crate::color::decode_colors;
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::header::{HEADER_LEN, HeaderInfo};
use crate::octree::{cell_of, decode_occupancy};
use glam::Vec3;
use pcbench_data::{Point, PointCloud};
use tracing::debug;

/// Decoder paired with an [`OctreeEncoder`](crate::OctreeEncoder) of the same configuration.
pub struct OctreeDecoder {
    config: CodecConfig,
    frames_decoded: u64,
}

impl OctreeDecoder {
    pub fn new(config: CodecConfig) -> Result<Self, CodecError> {
        config.validate()?;
        Ok(Self {
            config,
            frames_decoded: 0,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }
}

fn split_layer<'a>(stream: &'a [u8], start: usize, len: u32) -> Result<&'a [u8], CodecError> {
    let end = start + len as usize;
    stream.get(start..end).ok_or(CodecError::Truncated {
        needed: end,
        available: stream.len(),
    })
}

impl PointCloudDecoder for OctreeDecoder {
    fn decode(&mut self, stream: &[u8]) -> Result<PointCloud, CodecError> {
        let header = HeaderInfo::parse(stream)?;
        if header.config != self.config {
            return Err(CodecError::ConfigMismatch {
                stream: header.config.to_string(),
                decoder: self.config.to_string(),
            });
        }

        let octree_layer = split_layer(stream, HEADER_LEN, header.octree_bytes)?;
        let centroid_start = HEADER_LEN + octree_layer.len();
        let centroid_layer = split_layer(stream, centroid_start, header.centroid_bytes)?;
        let color_start = centroid_start + centroid_layer.len();
        let color_layer = split_layer(stream, color_start, header.color_bytes)?;
        if color_start + color_layer.len() != stream.len() {
            return Err(CodecError::Corrupt(format!(
                "{} trailing bytes after color layer",
                stream.len() - color_start - color_layer.len()
            )));
        }

        let bits = self.config.octree_bits;
        let codes = decode_occupancy(octree_layer, bits)?;
        if codes.len() != header.leaf_count as usize {
            return Err(CodecError::Corrupt(format!(
                "header announces {} leaves, octree holds {}",
                header.leaf_count,
                codes.len()
            )));
        }

        let colors = decode_colors(
            color_layer,
            codes.len(),
            self.config.color_bits,
            self.config.color_coding,
        )?;

        let cell_size = 1.0 / (1u64 << bits) as f64;
        let enh_bits = self.config.enh_bits;
        let enh_steps = (1u32 << enh_bits) as f64;
        let mut centroids = self
            .config
            .codes_centroids()
            .then(|| BitReader::new(centroid_layer));

        let mut cloud = PointCloud::with_capacity(codes.len());
        for (code, color) in codes.iter().zip(colors) {
            let cell = cell_of(*code);
            let mut offset = [0.5f64; 3];
            if let Some(reader) = centroids.as_mut() {
                for axis in &mut offset {
                    *axis = (reader.read(enh_bits)? as f64 + 0.5) / enh_steps;
                }
            }
            let position = Vec3::new(
                ((cell[0] as f64 + offset[0]) * cell_size) as f32,
                ((cell[1] as f64 + offset[1]) * cell_size) as f32,
                ((cell[2] as f64 + offset[2]) * cell_size) as f32,
            );
            cloud.push(Point::new(position, color));
        }
        self.frames_decoded += 1;

        debug!(
            "Decoded {} voxels (source had {} points)",
            cloud.len(),
            header.point_count
        );
        Ok(cloud)
    }
}
