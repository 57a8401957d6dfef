//! Pcbench Eval Crate
//!
//! The benchmarking core. Per-view clouds are fused per frame index, the fused
//! sequence is mapped into the unit cube through one shared bounding box, and
//! the normalised frames are pushed through every codec configuration of a
//! parameter grid.
//!
//! ## Example
//!
//! ```ignore
//! use pcbench_eval::{BoxNormalizer, OctreeCodecFactory, ReportWriter, SweepEvaluator, fuse_views};
//!
//! let fused = fuse_views(&folders)?;
//! let mut normalizer = BoxNormalizer::new(0.15)?;
//! let sequence = normalizer.normalize_sequence(fused);
//! let mut report = ReportWriter::new(std::fs::File::create("bench_out.csv")?)?;
//! SweepEvaluator::new(grid, OctreeCodecFactory)?.run(&sequence.frames, &mut report)?;
//! ```

mod cancel;
mod error;
pub mod fusion;
pub mod normalize;
pub mod sweep;

pub use cancel::CancelToken;
pub use error::{EvalError, FrameError, InputError, NormalizationError};
pub use fusion::{check_shape, fuse_views};
pub use normalize::{
    BoundingBoxLog, BoxNormalizer, DEFAULT_EXPAND_FACTOR, NormalizeTransform, NormalizedFrame,
    NormalizedSequence, NormalizerState,
};
pub use sweep::{
    ArtifactWriter, CodecFactory, OctreeCodecFactory, OrderedRowBuffer, ReportRow, ReportWriter,
    RowOutcome, SweepEvaluator, SweepGrid, SweepPoint, SweepSummary,
};
