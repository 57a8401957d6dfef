//! One benchmark run: load, fuse, normalise, sweep.

use crate::config::{BenchConfig, ConfigError};
use pcbench_data::{DataError, load_folder};
use pcbench_eval::{
    ArtifactWriter, BoundingBoxLog, BoxNormalizer, CancelToken, EvalError, InputError,
    NormalizationError, OctreeCodecFactory, ReportWriter, SweepEvaluator, SweepSummary,
    fuse_views,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("Failed to prepare artifact directory: {0}")]
    Artifacts(#[from] DataError),

    #[error("Failed to create {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Command line overrides on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dirs: Vec<PathBuf>,
    pub config: PathBuf,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    /// Stops the sweep before its next frame once cancelled.
    pub cancel: CancelToken,
    /// Wall-clock budget for the whole run; cancels `cancel` when exceeded.
    pub time_limit: Option<Duration>,
}

/// Cancel `token` after `limit` unless the returned sender is dropped first.
fn spawn_deadline(token: CancelToken, limit: Duration) -> mpsc::Sender<()> {
    let (done, wait) = mpsc::channel::<()>();
    thread::spawn(move || {
        if let Err(RecvTimeoutError::Timeout) = wait.recv_timeout(limit) {
            warn!(
                "Time limit of {:.1}s reached, cancelling sweep",
                limit.as_secs_f64()
            );
            token.cancel();
        }
    });
    done
}

fn output_error(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> AppError + '_ {
    move |source| AppError::Output {
        path: path.to_path_buf(),
        source,
    }
}

pub fn run(options: RunOptions) -> Result<SweepSummary, AppError> {
    let start = Instant::now();
    let _deadline = options
        .time_limit
        .map(|limit| spawn_deadline(options.cancel.clone(), limit));
    let mut config = BenchConfig::load(&options.config)?;
    if let Some(output) = options.output {
        config.output_csv_file = output;
    }
    if let Some(workers) = options.workers {
        config.workers = workers;
    }

    let dirs = if options.dirs.is_empty() {
        config.mesh_file_folders.clone()
    } else {
        options.dirs
    };
    if dirs.is_empty() {
        return Err(InputError::NoFolders.into());
    }

    // Validate the grid before spending time on loading.
    let evaluator = SweepEvaluator::new(config.grid(), OctreeCodecFactory)?
        .with_workers(config.workers)
        .with_cancel_token(options.cancel.clone());

    let mut views = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        views.push(load_folder(dir).map_err(InputError::from)?);
    }
    let fused = fuse_views(&views)?;
    drop(views);

    let log = BoundingBoxLog::create(&config.bounding_box_log)
        .map_err(output_error(&config.bounding_box_log))?;
    let mut normalizer = BoxNormalizer::new(config.bb_expand_factor)?.with_log(log);
    let sequence = normalizer.normalize_sequence(fused);
    let state = normalizer
        .finish()
        .map_err(output_error(&config.bounding_box_log))?;
    if !sequence.dropped.is_empty() {
        warn!("{} frames dropped during normalisation", sequence.dropped.len());
    }
    info!(
        "Normalised {} frames with {} bounding box initialisations",
        sequence.frames.len(),
        state.reinit_count()
    );

    let artifacts = ArtifactWriter::create(&config.artifact_dir)?;
    let csv = File::create(&config.output_csv_file).map_err(output_error(&config.output_csv_file))?;
    let mut report = ReportWriter::new(BufWriter::new(csv))
        .map_err(output_error(&config.output_csv_file))?;

    let summary = evaluator
        .with_artifacts(artifacts)
        .run(&sequence.frames, &mut report)?;

    info!(
        "Wrote {} rows ({} skipped) to {} in {:.1}s",
        summary.rows_written,
        summary.skipped,
        config.output_csv_file.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use pcbench_data::{Point, PointCloud, write_ply};
    use std::fs;
    use std::path::Path;

    fn write_view(dir: &Path, view: usize) {
        fs::create_dir_all(dir).unwrap();
        for frame in 0..3 {
            let cloud: PointCloud = (0..100)
                .map(|i| {
                    let t = i as f32 * 0.1;
                    Point::new(
                        Vec3::new(t.cos() + view as f32, t.sin(), 0.01 * frame as f32 + 0.002 * i as f32),
                        [i as u8, 50, 200],
                    )
                })
                .collect();
            write_ply(&dir.join(format!("{frame:04}.ply")), &cloud).unwrap();
        }
    }

    fn write_config(root: &Path, extra: &str) -> PathBuf {
        let path = root.join("parameter_config.txt");
        fs::write(
            &path,
            format!(
                "octree_bit_settings = 8 10\n\
                 color_bit_settings = 4\n\
                 enh_bit_settings = 2\n\
                 color_coding_types = 0\n\
                 output_csv_file = {}\n\
                 artifact_dir = {}\n\
                 bounding_box_log = {}\n{extra}",
                root.join("bench_out.csv").display(),
                root.join("artifacts").display(),
                root.join("bb.txt").display(),
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_end_to_end_run() {
        let root = tempfile::tempdir().unwrap();
        let dirs = vec![root.path().join("v0"), root.path().join("v1")];
        for (view, dir) in dirs.iter().enumerate() {
            write_view(dir, view);
        }
        let config = write_config(root.path(), "");

        let summary = run(RunOptions {
            dirs,
            config,
            output: None,
            workers: Some(2),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(summary.rows_written, 6);

        let csv = fs::read_to_string(root.path().join("bench_out.csv")).unwrap();
        assert_eq!(csv.lines().count(), 7);
        assert!(csv.lines().nth(1).unwrap().starts_with("8_4_colort-0_centroid-yes,0,ok,200,"));

        let bb = fs::read_to_string(root.path().join("bb.txt")).unwrap();
        assert_eq!(bb.lines().count(), 3);
        assert_eq!(fs::read_dir(root.path().join("artifacts")).unwrap().count(), 6);
    }

    #[test]
    fn test_folders_from_config() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("only");
        write_view(&dir, 0);
        let config = write_config(root.path(), &format!("mesh_file_folders = {}\n", dir.display()));
        let output = root.path().join("override.csv");

        let summary = run(RunOptions {
            dirs: Vec::new(),
            config,
            output: Some(output.clone()),
            workers: None,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(summary.rows_written, 6);
        assert!(output.exists());
        assert!(!root.path().join("bench_out.csv").exists());
    }

    #[test]
    fn test_cancelled_run_writes_header_only() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("v0");
        write_view(&dir, 0);
        let config = write_config(root.path(), "");
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = run(RunOptions {
            dirs: vec![dir],
            config,
            cancel,
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(AppError::Eval(EvalError::Cancelled { rows: 0 }))
        ));
        let csv = fs::read_to_string(root.path().join("bench_out.csv")).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_deadline_cancels_only_when_reached() {
        let expired = CancelToken::new();
        let _held = spawn_deadline(expired.clone(), Duration::from_millis(10));
        let waited = Instant::now();
        while !expired.is_cancelled() && waited.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(expired.is_cancelled());

        let finished = CancelToken::new();
        drop(spawn_deadline(finished.clone(), Duration::from_millis(20)));
        thread::sleep(Duration::from_millis(100));
        assert!(!finished.is_cancelled());
    }

    #[test]
    fn test_startup_errors() {
        let root = tempfile::tempdir().unwrap();
        let missing = run(RunOptions {
            dirs: vec![root.path().to_path_buf()],
            config: root.path().join("nope.txt"),
            ..Default::default()
        });
        assert!(matches!(missing, Err(AppError::Config(ConfigError::NotFound(_)))));

        let config = write_config(root.path(), "");
        let no_dirs = run(RunOptions {
            config: config.clone(),
            ..Default::default()
        });
        assert!(matches!(no_dirs, Err(AppError::Input(InputError::NoFolders))));

        let not_dir = run(RunOptions {
            dirs: vec![config.clone()],
            config,
            ..Default::default()
        });
        assert!(matches!(
            not_dir,
            Err(AppError::Input(InputError::Data(DataError::NotADirectory(_))))
        ));
    }
}
