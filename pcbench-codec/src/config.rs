//! Codec configuration.

use crate::error::CodecError;
use std::fmt;

/// Deepest supported octree; Morton codes pack three 21-bit axes into a u64.
pub const MAX_OCTREE_BITS: u8 = 21;

/// How the colour layer is coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorCodingType {
    /// Fixed-width quantised colour per voxel.
    Native,
    /// Voxel colours laid out as a raster and coded as predicted residuals.
    ImageBased,
}

impl ColorCodingType {
    /// Numeric code used in configuration files and stream headers.
    pub fn code(self) -> u8 {
        match self {
            ColorCodingType::Native => 0,
            ColorCodingType::ImageBased => 1,
        }
    }
}

impl TryFrom<i64> for ColorCodingType {
    type Error = CodecError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ColorCodingType::Native),
            1 => Ok(ColorCodingType::ImageBased),
            other => Err(CodecError::UnknownColorCoding(other)),
        }
    }
}

impl fmt::Display for ColorCodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Full configuration of an encoder/decoder pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecConfig {
    /// Octree depth; the grid has `2^octree_bits` cells per axis.
    pub octree_bits: u8,
    /// Bits per axis for the centroid offset inside a voxel.
    pub enh_bits: u8,
    /// Bits per colour channel.
    pub color_bits: u8,
    pub color_coding: ColorCodingType,
    /// Code the point centroid of every voxel instead of its centre.
    pub keep_centroid: bool,
}

impl CodecConfig {
    pub fn new(
        octree_bits: u8,
        enh_bits: u8,
        color_bits: u8,
        color_coding: ColorCodingType,
        keep_centroid: bool,
    ) -> Result<Self, CodecError> {
        let config = Self {
            octree_bits,
            enh_bits,
            color_bits,
            color_coding,
            keep_centroid,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.octree_bits == 0 || self.octree_bits > MAX_OCTREE_BITS {
            return Err(CodecError::InvalidConfig(format!(
                "octree bits must be in 1..={MAX_OCTREE_BITS}, got {}",
                self.octree_bits
            )));
        }
        if self.enh_bits > 8 {
            return Err(CodecError::InvalidConfig(format!(
                "enhancement bits must be in 0..=8, got {}",
                self.enh_bits
            )));
        }
        if self.color_bits == 0 || self.color_bits > 8 {
            return Err(CodecError::InvalidConfig(format!(
                "color bits must be in 1..=8, got {}",
                self.color_bits
            )));
        }
        Ok(())
    }

    /// Whether streams carry a centroid layer.
    pub fn codes_centroids(&self) -> bool {
        self.keep_centroid && self.enh_bits > 0
    }
}

impl fmt::Display for CodecConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "octree={} enh={} color={} colort={} centroid={}",
            self.octree_bits,
            self.enh_bits,
            self.color_bits,
            self.color_coding,
            if self.keep_centroid { "yes" } else { "no" }
        )
    }
}
