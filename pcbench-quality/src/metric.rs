//! Point-to-point distortion metrics.

use crate::error::QualityError;
use pcbench_data::PointCloud;
use rayon::prelude::*;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use tracing::debug;

/// PSNR reported for identical signals.
pub const PSNR_CAP_DB: f64 = 99.0;

/// Everything recorded for one evaluated frame.
///
/// Timing, size and layer fields are filled by the caller around the codec
/// calls; [`compute_quality_metric`] fills the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityMetric {
    pub in_point_count: usize,
    pub out_point_count: usize,
    pub compressed_size: u64,
    pub bits_per_point: f64,
    pub mse_dist_a2b: f64,
    pub mse_dist_b2a: f64,
    pub symm_rms: f64,
    pub symm_hausdorff: f64,
    pub psnr_db_p2p: f64,
    /// Y, U, V.
    pub psnr_colors_yuv: [f64; 3],
    pub encoding_time_ms: f64,
    pub decoding_time_ms: f64,
    pub byte_count_octree_layer: u64,
    pub byte_count_centroid_layer: u64,
    pub byte_count_color_layer: u64,
}

struct IndexedPoint(usize, [f32; 3]);

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.1)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        let dx = self.1[0] - point[0];
        let dy = self.1[1] - point[1];
        let dz = self.1[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

fn build_tree(cloud: &PointCloud, name: &'static str) -> Result<RTree<IndexedPoint>, QualityError> {
    let mut wrappers = Vec::with_capacity(cloud.len());
    for (index, point) in cloud.points.iter().enumerate() {
        if !point.position.is_finite() {
            return Err(QualityError::NonFinite { cloud: name, index });
        }
        wrappers.push(IndexedPoint(index, point.position.to_array()));
    }
    Ok(RTree::bulk_load(wrappers))
}

/// For every point of `from`, its nearest neighbour in `tree`: (index, squared distance).
fn nearest_neighbours(from: &PointCloud, tree: &RTree<IndexedPoint>) -> Vec<(usize, f64)> {
    from.points
        .par_iter()
        .map(|p| {
            let query = p.position.to_array();
            match tree.nearest_neighbor(&query) {
                Some(n) => (n.0, n.distance_2(&query) as f64),
                None => (0, 0.0),
            }
        })
        .collect()
}

fn to_yuv(rgb: [u8; 3]) -> [f64; 3] {
    let [r, g, b] = rgb.map(f64::from);
    [
        0.299 * r + 0.587 * g + 0.114 * b,
        -0.14713 * r - 0.28886 * g + 0.436 * b + 128.0,
        0.615 * r - 0.51499 * g - 0.10001 * b + 128.0,
    ]
}

fn psnr(peak: f64, mse: f64) -> f64 {
    if mse <= 0.0 {
        return PSNR_CAP_DB;
    }
    (10.0 * (peak * peak / mse).log10()).min(PSNR_CAP_DB)
}

/// Compare `decoded` against `original` and store the result in `quality`.
///
/// `quality.compressed_size` must already be set; it is used for the
/// bits-per-point figure.
pub fn compute_quality_metric(
    original: &PointCloud,
    decoded: &PointCloud,
    quality: &mut QualityMetric,
) -> Result<(), QualityError> {
    if original.is_empty() {
        return Err(QualityError::EmptyOriginal);
    }
    if decoded.is_empty() {
        return Err(QualityError::EmptyDecoded);
    }

    let original_tree = build_tree(original, "original")?;
    let decoded_tree = build_tree(decoded, "decoded")?;

    let a2b = nearest_neighbours(original, &decoded_tree);
    let b2a = nearest_neighbours(decoded, &original_tree);

    let mean = |pairs: &[(usize, f64)]| pairs.iter().map(|(_, d)| d).sum::<f64>() / pairs.len() as f64;
    let max = |pairs: &[(usize, f64)]| pairs.iter().map(|(_, d)| *d).fold(0.0f64, f64::max);

    quality.in_point_count = original.len();
    quality.out_point_count = decoded.len();
    quality.bits_per_point = quality.compressed_size as f64 * 8.0 / original.len() as f64;
    quality.mse_dist_a2b = mean(&a2b);
    quality.mse_dist_b2a = mean(&b2a);
    quality.symm_rms = quality.mse_dist_a2b.sqrt().max(quality.mse_dist_b2a.sqrt());
    quality.symm_hausdorff = max(&a2b).max(max(&b2a)).sqrt();

    // A single-point original has no extent; fall back to the unit cube.
    let peak = original
        .bounds()
        .map(|b| b.extent().max_element() as f64)
        .filter(|extent| *extent > 0.0)
        .unwrap_or(1.0);
    let symm_mse = quality.mse_dist_a2b.max(quality.mse_dist_b2a);
    quality.psnr_db_p2p = psnr(peak, symm_mse);

    let mut color_sq = [0.0f64; 3];
    for (point, (neighbour, _)) in original.points.iter().zip(&a2b) {
        let a = to_yuv(point.color);
        let b = to_yuv(decoded.points[*neighbour].color);
        for channel in 0..3 {
            let diff = a[channel] - b[channel];
            color_sq[channel] += diff * diff;
        }
    }
    let n = original.len() as f64;
    quality.psnr_colors_yuv = color_sq.map(|sum| psnr(255.0, sum / n));

    debug!(
        "Quality: rms {:.6}, hausdorff {:.6}, psnr {:.2} dB",
        quality.symm_rms, quality.symm_hausdorff, quality.psnr_db_p2p
    );
    Ok(())
}
