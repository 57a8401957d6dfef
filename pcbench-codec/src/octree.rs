//! Voxelisation and the breadth-first occupancy layer.

use crate::error::CodecError;
use crate::morton;
use pcbench_data::PointCloud;

/// One occupied cell of the quantisation grid with its accumulated points.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Voxel {
    pub code: u64,
    /// Sum of point offsets inside the cell, in cell units.
    pub offset_sum: [f64; 3],
    pub color_sum: [u32; 3],
    pub count: u32,
}

impl Voxel {
    /// Mean point offset inside the cell, each axis in [0, 1).
    pub fn mean_offset(&self) -> [f64; 3] {
        let n = self.count as f64;
        self.offset_sum.map(|s| s / n)
    }

    /// Rounded mean colour.
    pub fn mean_color(&self) -> [u8; 3] {
        let n = self.count;
        self.color_sum.map(|s| ((s + n / 2) / n).min(255) as u8)
    }
}

/// Quantise a unit-cube cloud to a `2^bits` grid and merge points per cell.
///
/// `voxels` is cleared and refilled in Morton order; within a cell the input
/// order is preserved so accumulated sums are reproducible.
pub(crate) fn voxelize(
    cloud: &PointCloud,
    bits: u8,
    voxels: &mut Vec<Voxel>,
) -> Result<(), CodecError> {
    voxels.clear();
    let cells = 1u32 << bits;
    let scale = cells as f64;

    let mut keyed = Vec::with_capacity(cloud.len());
    for (index, point) in cloud.points.iter().enumerate() {
        let p = point.position;
        let inside = p.is_finite()
            && p.cmpge(glam::Vec3::ZERO).all()
            && p.cmple(glam::Vec3::ONE).all();
        if !inside {
            return Err(CodecError::OutOfRange {
                index,
                x: p.x,
                y: p.y,
                z: p.z,
            });
        }

        let scaled = [p.x as f64 * scale, p.y as f64 * scale, p.z as f64 * scale];
        let cell = scaled.map(|v| (v.floor() as u32).min(cells - 1));
        let offset = [
            scaled[0] - cell[0] as f64,
            scaled[1] - cell[1] as f64,
            scaled[2] - cell[2] as f64,
        ];
        keyed.push((morton::encode(cell[0], cell[1], cell[2]), offset, point.color));
    }
    keyed.sort_by_key(|(code, _, _)| *code);

    for (code, offset, color) in keyed {
        match voxels.last_mut() {
            Some(voxel) if voxel.code == code => {
                for axis in 0..3 {
                    voxel.offset_sum[axis] += offset[axis];
                    voxel.color_sum[axis] += color[axis] as u32;
                }
                voxel.count += 1;
            }
            _ => voxels.push(Voxel {
                code,
                offset_sum: offset,
                color_sum: color.map(u32::from),
                count: 1,
            }),
        }
    }
    Ok(())
}

/// Emit one child-occupancy byte per internal node, level by level.
///
/// `codes` must be sorted and unique; Morton order makes the node order at
/// each level identical to a breadth-first traversal.
pub(crate) fn encode_occupancy(codes: &[u64], bits: u8, out: &mut Vec<u8>) {
    for level in 0..bits {
        let child_shift = 3 * (bits - level - 1) as u32;
        let parent_shift = child_shift + 3;
        let mut i = 0;
        while i < codes.len() {
            let parent = codes[i] >> parent_shift;
            let mut mask = 0u8;
            while i < codes.len() && codes[i] >> parent_shift == parent {
                mask |= 1 << ((codes[i] >> child_shift) & 7);
                i += 1;
            }
            out.push(mask);
        }
    }
}

/// Rebuild the sorted leaf codes from an occupancy layer.
pub(crate) fn decode_occupancy(layer: &[u8], bits: u8) -> Result<Vec<u64>, CodecError> {
    let mut nodes = vec![0u64];
    let mut cursor = 0;
    for _ in 0..bits {
        let mut next = Vec::with_capacity(nodes.len() * 2);
        for &node in &nodes {
            let Some(&mask) = layer.get(cursor) else {
                return Err(CodecError::Truncated {
                    needed: cursor + 1,
                    available: layer.len(),
                });
            };
            cursor += 1;
            if mask == 0 {
                return Err(CodecError::Corrupt(format!(
                    "empty occupancy byte at offset {}",
                    cursor - 1
                )));
            }
            for child in 0..8u64 {
                if mask & (1 << child) != 0 {
                    next.push((node << 3) | child);
                }
            }
        }
        nodes = next;
    }
    if cursor != layer.len() {
        return Err(CodecError::Corrupt(format!(
            "{} trailing bytes after octree layer",
            layer.len() - cursor
        )));
    }
    Ok(nodes)
}

/// Cell coordinates of a leaf code.
pub(crate) fn cell_of(code: u64) -> [u32; 3] {
    morton::decode(code)
}
