//! Bounding-box normalisation of a fused frame sequence.
//!
//! One global box is shared by consecutive frames so that the codec's
//! quantisation grid covers the same physical volume from frame to frame. The
//! box is only replaced when a frame no longer fits strictly inside it; it is
//! then rebuilt from that frame alone, expanded by `expand_factor` of the
//! frame's extent on each side. Frames after a re-initialisation may therefore
//! be scaled differently from frames before it.

use crate::error::NormalizationError;
use glam::Vec3;
use pcbench_data::{Bounds, PointCloud};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_EXPAND_FACTOR: f32 = 0.15;

/// Margin used on an axis with zero extent.
const DEGENERATE_MARGIN: f32 = 0.5;

/// Affine map `p -> (p - offset) / scale` into the unit cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeTransform {
    pub offset: Vec3,
    pub scale: Vec3,
}

impl NormalizeTransform {
    fn from_box(bounds: &Bounds) -> Self {
        Self {
            offset: bounds.min,
            scale: bounds.extent(),
        }
    }

    pub fn apply(&self, position: Vec3) -> Vec3 {
        let p = (position.as_dvec3() - self.offset.as_dvec3()) / self.scale.as_dvec3();
        p.as_vec3()
    }

    /// Map a normalised position back to the source frame.
    pub fn invert(&self, position: Vec3) -> Vec3 {
        position * self.scale + self.offset
    }
}

/// Tracking state of one normalisation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizerState {
    global_box: Option<Bounds>,
    reinit_count: usize,
    frames_normalized: usize,
}

impl NormalizerState {
    /// The current global box, once the first frame was seen.
    pub fn global_box(&self) -> Option<&Bounds> {
        self.global_box.as_ref()
    }

    /// Number of times the box was (re)built, including the first frame.
    pub fn reinit_count(&self) -> usize {
        self.reinit_count
    }

    pub fn frames_normalized(&self) -> usize {
        self.frames_normalized
    }
}

/// Run-scoped trace of every fused frame's raw bounds.
pub struct BoundingBoxLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl BoundingBoxLog {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&mut self, bounds: &Bounds) -> io::Result<()> {
        let (min, max) = (bounds.min, bounds.max);
        writeln!(
            self.writer,
            "[ {},{},{}]    [{},{},{}]",
            min.x, min.y, min.z, max.x, max.y, max.z
        )
    }

    /// Flush and close the log.
    pub fn finish(mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A fused frame mapped into the unit cube. Never mutated after normalisation.
#[derive(Debug, Clone)]
pub struct NormalizedFrame {
    /// Frame index in the fused sequence.
    pub index: usize,
    pub cloud: PointCloud,
    pub transform: NormalizeTransform,
    /// Value of the re-initialisation counter when this frame was mapped.
    /// Frames with equal epochs share one transform.
    pub box_epoch: usize,
}

/// Output of [`BoxNormalizer::normalize_sequence`].
#[derive(Debug, Default)]
pub struct NormalizedSequence {
    pub frames: Vec<NormalizedFrame>,
    /// Frames that could not be normalised, with the reason.
    pub dropped: Vec<NormalizationError>,
}

pub struct BoxNormalizer {
    expand_factor: f32,
    state: NormalizerState,
    log: Option<BoundingBoxLog>,
}

impl BoxNormalizer {
    pub fn new(expand_factor: f32) -> Result<Self, NormalizationError> {
        if !expand_factor.is_finite() || expand_factor < 0.0 {
            return Err(NormalizationError::InvalidExpandFactor(expand_factor));
        }
        Ok(Self {
            expand_factor,
            state: NormalizerState::default(),
            log: None,
        })
    }

    /// Record every frame's raw bounds to `log` for the lifetime of this normalizer.
    pub fn with_log(mut self, log: BoundingBoxLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn expand_factor(&self) -> f32 {
        self.expand_factor
    }

    pub fn state(&self) -> &NormalizerState {
        &self.state
    }

    /// Forget the global box, e.g. before an unrelated group of frames.
    pub fn reset(&mut self) {
        self.state = NormalizerState::default();
    }

    fn fits(global: &Bounds, frame: &Bounds) -> bool {
        frame.min.cmpgt(global.min).all() && frame.max.cmplt(global.max).all()
    }

    fn expanded(&self, frame: &Bounds) -> Bounds {
        let extent = frame.extent().abs();
        let margin = Vec3::select(
            extent.cmpgt(Vec3::ZERO),
            extent * self.expand_factor,
            Vec3::splat(DEGENERATE_MARGIN),
        );
        // An expansion that vanishes in f32 would leave a zero range.
        let mut bounds = Bounds::new(frame.min - margin, frame.max + margin);
        let collapsed = bounds.extent().cmple(Vec3::ZERO);
        bounds.min = Vec3::select(collapsed, frame.min - DEGENERATE_MARGIN, bounds.min);
        bounds.max = Vec3::select(collapsed, frame.max + DEGENERATE_MARGIN, bounds.max);
        bounds
    }

    /// Map `cloud` into the unit cube, updating the global box first if needed.
    ///
    /// On error the cloud may be partially rewritten and must be discarded.
    pub fn normalize(
        &mut self,
        frame: usize,
        cloud: &mut PointCloud,
    ) -> Result<NormalizeTransform, NormalizationError> {
        if let Some(index) = cloud.points.iter().position(|p| !p.position.is_finite()) {
            return Err(NormalizationError::NonFinite { frame, index });
        }
        let bounds = cloud
            .bounds()
            .ok_or(NormalizationError::EmptyCloud { frame })?;

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.record(&bounds) {
                warn!("Failed to write bounding box log {}: {}", log.path().display(), e);
            }
        }

        let (global, reinit) = match self.state.global_box {
            Some(global) if Self::fits(&global, &bounds) => (global, false),
            _ => (self.expanded(&bounds), true),
        };

        let transform = NormalizeTransform::from_box(&global);
        for point in &mut cloud.points {
            point.position = transform.apply(point.position);
            check_unit_range(frame, point.position)?;
        }

        // A rejected frame leaves the previous box in place.
        if reinit {
            self.state.global_box = Some(global);
            self.state.reinit_count += 1;
            info!(
                "re-initialized bounding box at frame {}: {:?} .. {:?}",
                frame, global.min, global.max
            );
        }
        self.state.frames_normalized += 1;
        Ok(transform)
    }

    /// Normalise a fused sequence in frame order, dropping frames that fail.
    #[tracing::instrument(skip_all, fields(frames = clouds.len()))]
    pub fn normalize_sequence(&mut self, clouds: Vec<PointCloud>) -> NormalizedSequence {
        let mut sequence = NormalizedSequence::default();
        for (index, mut cloud) in clouds.into_iter().enumerate() {
            match self.normalize(index, &mut cloud) {
                Ok(transform) => sequence.frames.push(NormalizedFrame {
                    index,
                    cloud,
                    transform,
                    box_epoch: self.state.reinit_count,
                }),
                Err(e) => {
                    warn!("Dropping frame {}: {}", index, e);
                    sequence.dropped.push(e);
                }
            }
        }
        debug!(
            "Normalised {} frames, {} box re-initialisations",
            sequence.frames.len(),
            self.state.reinit_count
        );
        sequence
    }

    /// End the run: close the bounding box log and hand back the final state.
    pub fn finish(self) -> io::Result<NormalizerState> {
        if let Some(log) = self.log {
            log.finish()?;
        }
        Ok(self.state)
    }
}

fn check_unit_range(frame: usize, position: Vec3) -> Result<(), NormalizationError> {
    match (0..3).find(|&axis| !(0.0..=1.0).contains(&position[axis])) {
        Some(axis) => Err(NormalizationError::OutOfRange {
            frame,
            axis,
            value: position[axis],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcbench_data::Point;

    fn cube(min: f32, max: f32) -> PointCloud {
        PointCloud::new(vec![
            Point::uncolored(Vec3::splat(min)),
            Point::uncolored(Vec3::splat((min + max) / 2.0)),
            Point::uncolored(Vec3::splat(max)),
        ])
    }

    #[test]
    fn test_first_frame_initialises_box() {
        let mut normalizer = BoxNormalizer::new(0.1).unwrap();
        let mut cloud = cube(0.0, 10.0);
        let transform = normalizer.normalize(0, &mut cloud).unwrap();

        assert_eq!(normalizer.state().reinit_count(), 1);
        let global = normalizer.state().global_box().unwrap();
        assert_eq!(global.min, Vec3::splat(-1.0));
        assert_eq!(global.max, Vec3::splat(11.0));
        assert_eq!(transform.scale, Vec3::splat(12.0));
        assert!((cloud.points[0].position.x - 1.0 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_fitting_frame_reuses_transform() {
        let mut normalizer = BoxNormalizer::new(0.15).unwrap();
        let a = normalizer.normalize(0, &mut cube(0.0, 10.0)).unwrap();
        let b = normalizer.normalize(1, &mut cube(0.5, 9.5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(normalizer.state().reinit_count(), 1);
    }

    #[test]
    fn test_touching_border_is_stale() {
        let mut normalizer = BoxNormalizer::new(0.0).unwrap();
        normalizer.normalize(0, &mut cube(0.0, 1.0)).unwrap();
        normalizer.normalize(1, &mut cube(0.0, 1.0)).unwrap();
        assert_eq!(normalizer.state().reinit_count(), 2);
    }

    #[test]
    fn test_degenerate_axis_maps_to_middle() {
        let mut normalizer = BoxNormalizer::new(0.15).unwrap();
        let mut cloud = PointCloud::new(vec![
            Point::uncolored(Vec3::new(0.0, 2.0, 5.0)),
            Point::uncolored(Vec3::new(4.0, 2.0, 5.0)),
        ]);
        normalizer.normalize(0, &mut cloud).unwrap();
        for p in &cloud.points {
            assert!((p.position.y - 0.5).abs() < 1e-6);
            assert!((p.position.z - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_and_non_finite_frames_rejected() {
        let mut normalizer = BoxNormalizer::new(0.15).unwrap();
        assert!(matches!(
            normalizer.normalize(4, &mut PointCloud::default()),
            Err(NormalizationError::EmptyCloud { frame: 4 })
        ));
        let mut bad = cube(0.0, 1.0);
        bad.points[1].position.y = f32::NAN;
        assert!(matches!(
            normalizer.normalize(5, &mut bad),
            Err(NormalizationError::NonFinite { frame: 5, index: 1 })
        ));
        assert_eq!(normalizer.state().reinit_count(), 0);
    }

    #[test]
    fn test_reset_forgets_box() {
        let mut normalizer = BoxNormalizer::new(0.15).unwrap();
        normalizer.normalize(0, &mut cube(0.0, 1.0)).unwrap();
        normalizer.reset();
        assert!(normalizer.state().global_box().is_none());
        assert_eq!(normalizer.state().reinit_count(), 0);
    }

    #[test]
    fn test_unit_range_check() {
        assert!(check_unit_range(0, Vec3::ZERO).is_ok());
        assert!(check_unit_range(0, Vec3::ONE).is_ok());
        assert!(matches!(
            check_unit_range(3, Vec3::new(0.5, -1e-3, 0.5)),
            Err(NormalizationError::OutOfRange { frame: 3, axis: 1, .. })
        ));
        assert!(matches!(
            check_unit_range(7, Vec3::new(0.5, 0.5, 1.0 + 1e-3)),
            Err(NormalizationError::OutOfRange { frame: 7, axis: 2, .. })
        ));
        assert!(matches!(
            check_unit_range(2, Vec3::new(f32::NAN, 0.5, 0.5)),
            Err(NormalizationError::OutOfRange { frame: 2, axis: 0, .. })
        ));
    }

    #[test]
    fn test_overflowing_frame_is_dropped_and_box_kept() {
        let mut normalizer = BoxNormalizer::new(0.1).unwrap();
        // The extent overflows f32, so the transform yields NaN.
        let huge = PointCloud::new(vec![
            Point::uncolored(Vec3::splat(-3.0e38)),
            Point::uncolored(Vec3::splat(3.0e38)),
        ]);
        let sequence = normalizer.normalize_sequence(vec![cube(0.0, 10.0), huge, cube(1.0, 9.0)]);

        assert_eq!(sequence.frames.len(), 2);
        assert_eq!(sequence.frames[1].index, 2);
        assert_eq!(sequence.dropped.len(), 1);
        assert!(matches!(
            sequence.dropped[0],
            NormalizationError::OutOfRange { frame: 1, axis: 0, .. }
        ));
        assert_eq!(normalizer.state().reinit_count(), 1);
        assert_eq!(normalizer.state().frames_normalized(), 2);
        assert_eq!(
            normalizer.state().global_box().unwrap().min,
            Vec3::splat(-1.0)
        );
    }

    #[test]
    fn test_invalid_expand_factor() {
        assert!(BoxNormalizer::new(-0.1).is_err());
        assert!(BoxNormalizer::new(f32::NAN).is_err());
    }
}
