//! Parameter sweep over codec configurations.
//!
//! Each grid point gets a fresh encoder/decoder pair that is then reused for
//! every frame, so long-lived codec state is exercised the same way a
//! streaming deployment would.

mod artifacts;
mod params;
mod report;

pub use artifacts::ArtifactWriter;
pub use params::{SweepGrid, SweepPoint};
pub use report::{OrderedRowBuffer, ReportRow, ReportWriter, RowOutcome};

use crate::cancel::CancelToken;
use crate::error::{EvalError, FrameError};
use crate::normalize::NormalizedFrame;
use pcbench_codec::{
    CodecConfig, CodecError, OctreeDecoder, OctreeEncoder, PointCloudDecoder, PointCloudEncoder,
};
use pcbench_quality::{QualityMetric, compute_quality_metric};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Creates the encoder/decoder pair for one grid point.
pub trait CodecFactory: Sync {
    type Encoder: PointCloudEncoder;
    type Decoder: PointCloudDecoder;

    fn create(&self, config: CodecConfig) -> Result<(Self::Encoder, Self::Decoder), CodecError>;
}

/// Factory for the octree codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct OctreeCodecFactory;

impl CodecFactory for OctreeCodecFactory {
    type Encoder = OctreeEncoder;
    type Decoder = OctreeDecoder;

    fn create(&self, config: CodecConfig) -> Result<(OctreeEncoder, OctreeDecoder), CodecError> {
        Ok((OctreeEncoder::new(config)?, OctreeDecoder::new(config)?))
    }
}

/// Totals of a finished sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub combinations: usize,
    pub rows_written: usize,
    pub skipped: usize,
}

pub struct SweepEvaluator<F: CodecFactory> {
    grid: SweepGrid,
    factory: F,
    artifacts: Option<ArtifactWriter>,
    workers: usize,
    cancel: CancelToken,
}

impl<F: CodecFactory> SweepEvaluator<F> {
    /// Fails if any grid point is not a valid codec configuration.
    pub fn new(grid: SweepGrid, factory: F) -> Result<Self, EvalError> {
        grid.validate().map_err(EvalError::InvalidGrid)?;
        Ok(Self {
            grid,
            factory,
            artifacts: None,
            workers: 1,
            cancel: CancelToken::new(),
        })
    }

    /// Write every decoded frame through `artifacts`.
    pub fn with_artifacts(mut self, artifacts: ArtifactWriter) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Evaluate outer (colour coding, octree bits) jobs on `workers` threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn grid(&self) -> &SweepGrid {
        &self.grid
    }

    /// Evaluate every grid point on every frame and append the rows to `report`.
    ///
    /// Rows appear in sweep order, then frame order. Per-frame failures are
    /// written as skipped rows; only report I/O errors and cancellation abort.
    #[tracing::instrument(skip_all, fields(combinations = self.grid.len(), frames = frames.len()))]
    pub fn run<W: Write>(
        &self,
        frames: &[NormalizedFrame],
        report: &mut ReportWriter<W>,
    ) -> Result<SweepSummary, EvalError> {
        let written_before = report.rows_written();
        let skipped_before = report.skipped();

        if self.workers > 1 {
            self.run_parallel(frames, report)?;
        } else {
            self.run_sequential(frames, report)?;
        }

        let summary = SweepSummary {
            combinations: self.grid.len(),
            rows_written: report.rows_written() - written_before,
            skipped: report.skipped() - skipped_before,
        };
        if self.cancel.is_cancelled() {
            warn!("Sweep cancelled after {} rows", summary.rows_written);
            return Err(EvalError::Cancelled {
                rows: summary.rows_written,
            });
        }
        info!(
            "Sweep finished: {} combinations, {} rows, {} skipped",
            summary.combinations, summary.rows_written, summary.skipped
        );
        Ok(summary)
    }

    fn run_sequential<W: Write>(
        &self,
        frames: &[NormalizedFrame],
        report: &mut ReportWriter<W>,
    ) -> Result<(), EvalError> {
        let stop = || self.cancel.is_cancelled();
        for (point_index, point) in self.grid.points().enumerate() {
            self.evaluate_point(point_index, point, frames, &stop, &mut |row: ReportRow| {
                report.write_row(&row).map_err(EvalError::from)
            })?;
            if stop() {
                break;
            }
        }
        Ok(())
    }

    fn run_parallel<W: Write>(
        &self,
        frames: &[NormalizedFrame],
        report: &mut ReportWriter<W>,
    ) -> Result<(), EvalError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("pcbench-sweep-{i}"))
            .build()?;
        let jobs = self.grid.outer_jobs();
        debug!("Scheduling {} jobs on {} workers", jobs.len(), self.workers);

        let aborted = AtomicBool::new(false);
        let stop = || self.cancel.is_cancelled() || aborted.load(Ordering::Relaxed);
        let (tx, rx) = mpsc::channel::<ReportRow>();

        std::thread::scope(|scope| {
            let stop = &stop;
            scope.spawn(move || {
                pool.scope(|pool_scope| {
                    for (first, points) in jobs {
                        let tx = tx.clone();
                        pool_scope.spawn(move |_| {
                            for (offset, point) in points.into_iter().enumerate() {
                                // A closed channel means the writer gave up.
                                let mut emit = |row: ReportRow| -> Result<(), EvalError> {
                                    let _ = tx.send(row);
                                    Ok(())
                                };
                                let _ = self.evaluate_point(
                                    first + offset,
                                    point,
                                    frames,
                                    stop,
                                    &mut emit,
                                );
                                if stop() {
                                    break;
                                }
                            }
                        });
                    }
                });
                drop(tx);
            });

            let mut buffer = OrderedRowBuffer::new();
            for row in rx {
                for ready in buffer.push(row) {
                    if let Err(e) = report.write_row(&ready) {
                        aborted.store(true, Ordering::Relaxed);
                        return Err(EvalError::from(e));
                    }
                }
            }
            if buffer.pending() > 0 {
                debug!("{} rows not written after a gap", buffer.pending());
            }
            Ok(())
        })
    }

    /// Run one grid point over all frames, emitting one row per frame.
    fn evaluate_point(
        &self,
        point_index: usize,
        point: SweepPoint,
        frames: &[NormalizedFrame],
        stop: &dyn Fn() -> bool,
        emit: &mut dyn FnMut(ReportRow) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        let tag = point.to_string();
        info!("Evaluating {}", tag);

        let codec = point.config().and_then(|config| self.factory.create(config));
        let (mut encoder, mut decoder) = match codec {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Skipping {}: cannot create codec: {}", tag, e);
                for (position, frame) in frames.iter().enumerate() {
                    emit(ReportRow {
                        sequence: point_index * frames.len() + position,
                        tag: tag.clone(),
                        frame: frame.index,
                        outcome: RowOutcome::Skipped {
                            kind: "codec",
                            message: e.to_string(),
                        },
                    })?;
                }
                return Ok(());
            }
        };

        let mut stream = Vec::new();
        for (position, frame) in frames.iter().enumerate() {
            if stop() {
                return Ok(());
            }
            let result = self.evaluate_frame(&mut encoder, &mut decoder, &point, frame, &mut stream);
            let outcome = match result {
                Ok(quality) => RowOutcome::Evaluated(quality),
                Err(e) => {
                    warn!("Skipping frame {} of {}: {}", frame.index, tag, e);
                    RowOutcome::Skipped {
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };
            emit(ReportRow {
                sequence: point_index * frames.len() + position,
                tag: tag.clone(),
                frame: frame.index,
                outcome,
            })?;
        }
        Ok(())
    }

    fn evaluate_frame(
        &self,
        encoder: &mut F::Encoder,
        decoder: &mut F::Decoder,
        point: &SweepPoint,
        frame: &NormalizedFrame,
        stream: &mut Vec<u8>,
    ) -> Result<QualityMetric, FrameError> {
        stream.clear();
        let start = Instant::now();
        encoder.encode(&frame.cloud, stream)?;
        let encoding_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let layers = encoder.performance_metrics();
        let mut quality = QualityMetric {
            compressed_size: stream.len() as u64,
            encoding_time_ms,
            byte_count_octree_layer: layers.octree,
            byte_count_centroid_layer: layers.centroid,
            byte_count_color_layer: layers.color,
            ..Default::default()
        };
        debug!("octree coding {} bytes, frame {}", stream.len(), frame.index);

        let start = Instant::now();
        let decoded = decoder.decode(stream)?;
        quality.decoding_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        compute_quality_metric(&frame.cloud, &decoded, &mut quality)?;

        if let Some(artifacts) = &self.artifacts {
            artifacts.write(point, frame.index, &decoded)?;
        }
        Ok(quality)
    }
}
