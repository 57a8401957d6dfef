//! Fixed-size stream header.

use crate::config::{CodecConfig, ColorCodingType};
use crate::error::CodecError;
use bytemuck::{Pod, Zeroable};

pub(crate) const MAGIC: [u8; 4] = *b"PCB1";

/// Encoded size of [`StreamHeader`] in bytes.
pub const HEADER_LEN: usize = std::mem::size_of::<StreamHeader>();

/// Header written in front of every frame. Multi-byte fields are little-endian.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct StreamHeader {
    magic: [u8; 4],
    point_count: u32,
    leaf_count: u32,
    octree_bytes: u32,
    centroid_bytes: u32,
    color_bytes: u32,
    octree_bits: u8,
    enh_bits: u8,
    color_bits: u8,
    color_coding: u8,
    keep_centroid: u8,
    _pad: [u8; 3],
}

/// Decoded header values in native byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderInfo {
    pub point_count: u32,
    pub leaf_count: u32,
    pub octree_bytes: u32,
    pub centroid_bytes: u32,
    pub color_bytes: u32,
    pub config: CodecConfig,
}

impl HeaderInfo {
    pub(crate) fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let header = StreamHeader {
            magic: MAGIC,
            point_count: self.point_count.to_le(),
            leaf_count: self.leaf_count.to_le(),
            octree_bytes: self.octree_bytes.to_le(),
            centroid_bytes: self.centroid_bytes.to_le(),
            color_bytes: self.color_bytes.to_le(),
            octree_bits: self.config.octree_bits,
            enh_bits: self.config.enh_bits,
            color_bits: self.config.color_bits,
            color_coding: self.config.color_coding.code(),
            keep_centroid: self.config.keep_centroid as u8,
            _pad: [0; 3],
        };
        let mut bytes = [0u8; HEADER_LEN];
        bytes.copy_from_slice(bytemuck::bytes_of(&header));
        bytes
    }

    pub(crate) fn parse(stream: &[u8]) -> Result<Self, CodecError> {
        let Some(raw) = stream.get(..HEADER_LEN) else {
            return Err(CodecError::Truncated {
                needed: HEADER_LEN,
                available: stream.len(),
            });
        };
        let header: StreamHeader = bytemuck::pod_read_unaligned(raw);
        if header.magic != MAGIC {
            return Err(CodecError::BadMagic);
        }

        let config = CodecConfig::new(
            header.octree_bits,
            header.enh_bits,
            header.color_bits,
            ColorCodingType::try_from(header.color_coding as i64)?,
            header.keep_centroid != 0,
        )?;

        Ok(Self {
            point_count: u32::from_le(header.point_count),
            leaf_count: u32::from_le(header.leaf_count),
            octree_bytes: u32::from_le(header.octree_bytes),
            centroid_bytes: u32::from_le(header.centroid_bytes),
            color_bytes: u32::from_le(header.color_bytes),
            config,
        })
    }
}
