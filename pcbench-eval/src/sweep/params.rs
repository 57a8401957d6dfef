//! The parameter grid and its points.

use pcbench_codec::{CodecConfig, CodecError, ColorCodingType};
use std::fmt;

/// The swept axes plus the run-wide enhancement and centroid settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepGrid {
    pub color_coding_types: Vec<ColorCodingType>,
    pub octree_bits: Vec<u8>,
    pub color_bits: Vec<u8>,
    pub enh_bits: u8,
    pub keep_centroid: bool,
}

impl SweepGrid {
    /// Number of codec configurations in the grid.
    pub fn len(&self) -> usize {
        self.color_coding_types.len() * self.octree_bits.len() * self.color_bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn point(&self, color_coding: ColorCodingType, octree_bits: u8, color_bits: u8) -> SweepPoint {
        SweepPoint {
            color_coding,
            octree_bits,
            color_bits,
            enh_bits: self.enh_bits,
            keep_centroid: self.keep_centroid,
        }
    }

    /// All points in sweep order: colour coding, then octree bits, then colour bits.
    pub fn points(&self) -> impl Iterator<Item = SweepPoint> + '_ {
        self.color_coding_types.iter().flat_map(move |&ct| {
            self.octree_bits.iter().flat_map(move |&ob| {
                self.color_bits.iter().map(move |&cb| self.point(ct, ob, cb))
            })
        })
    }

    /// Independent outer jobs, one per (colour coding, octree bits) pair,
    /// each with the sweep position of its first point.
    pub(crate) fn outer_jobs(&self) -> Vec<(usize, Vec<SweepPoint>)> {
        let mut jobs = Vec::with_capacity(self.color_coding_types.len() * self.octree_bits.len());
        let mut first = 0;
        for &ct in &self.color_coding_types {
            for &ob in &self.octree_bits {
                let points: Vec<SweepPoint> =
                    self.color_bits.iter().map(|&cb| self.point(ct, ob, cb)).collect();
                let count = points.len();
                jobs.push((first, points));
                first += count;
            }
        }
        jobs
    }

    /// Check every configuration before any work starts.
    pub fn validate(&self) -> Result<(), CodecError> {
        for point in self.points() {
            point.config()?;
        }
        Ok(())
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SweepPoint {
    pub color_coding: ColorCodingType,
    pub octree_bits: u8,
    pub color_bits: u8,
    pub enh_bits: u8,
    pub keep_centroid: bool,
}

impl SweepPoint {
    pub fn config(&self) -> Result<CodecConfig, CodecError> {
        CodecConfig::new(
            self.octree_bits,
            self.enh_bits,
            self.color_bits,
            self.color_coding,
            self.keep_centroid,
        )
    }

    fn centroid_label(&self) -> &'static str {
        if self.keep_centroid { "yes" } else { "no" }
    }

    /// File name of the decoded artifact for `frame`; unique per configuration.
    pub fn artifact_name(&self, frame: usize) -> String {
        format!(
            "{}_{}_{}_colort-{}_centroid-{}_{}out.ply",
            self.octree_bits,
            self.color_bits,
            self.enh_bits,
            self.color_coding,
            self.centroid_label(),
            frame
        )
    }
}

/// Report tag, e.g. `10_4_colort-0_centroid-yes`.
impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_colort-{}_centroid-{}",
            self.octree_bits,
            self.color_bits,
            self.color_coding,
            self.centroid_label()
        )
    }
}
