//! Multi-view fusion.
//!
//! Every view folder contributes one cloud per frame index; the fused cloud for
//! frame `i` is the concatenation of those clouds in folder order.

use crate::error::InputError;
use pcbench_data::{PointCloud, ViewFolder};
use tracing::{debug, info};

/// Verify that all views have the same number of frames and return it.
///
/// Zero views yield zero frames.
pub fn check_shape(folders: &[ViewFolder]) -> Result<usize, InputError> {
    let Some(reference) = folders.first() else {
        return Ok(0);
    };
    for folder in &folders[1..] {
        if folder.len() != reference.len() {
            return Err(InputError::ShapeMismatch {
                reference: reference.path.clone(),
                expected: reference.len(),
                folder: folder.path.clone(),
                found: folder.len(),
            });
        }
    }
    Ok(reference.len())
}

/// Fuse same-index frames of all views into one cloud per frame.
///
/// The views are left untouched.
#[tracing::instrument(skip_all, fields(views = folders.len()))]
pub fn fuse_views(folders: &[ViewFolder]) -> Result<Vec<PointCloud>, InputError> {
    let frame_count = check_shape(folders)?;

    let fused: Vec<PointCloud> = (0..frame_count)
        .map(|frame| {
            let total = folders.iter().map(|f| f.frames[frame].len()).sum();
            let mut cloud = PointCloud::with_capacity(total);
            for folder in folders {
                cloud.extend_from(&folder.frames[frame]);
            }
            debug!("Fused frame {} with {} points", frame, cloud.len());
            cloud
        })
        .collect();

    info!(
        "Fused {} views into {} frames",
        folders.len(),
        fused.len()
    );
    Ok(fused)
}
