//! Pcbench
//!
//! Benchmarks the octree point cloud codec over a grid of parameters. Each
//! positional directory holds the per-frame `.ply` captures of one camera;
//! same-index frames are fused, normalised into a shared unit cube and
//! evaluated for every configuration in `parameter_config.txt`.

mod config;
mod run;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Pcbench - Point Cloud Codec Benchmark
#[derive(Parser, Debug)]
#[command(name = "pcbench")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// View folders with one .ply file per frame
    #[arg(value_name = "DIRS")]
    dirs: Vec<PathBuf>,

    /// Parameter file
    #[arg(short, long, default_value = "parameter_config.txt")]
    config: PathBuf,

    /// Output CSV, overrides output_csv_file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker threads for the sweep, overrides workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Cancel the sweep after this many seconds; rows written so far are kept
    #[arg(long, value_name = "SECS")]
    time_limit: Option<f64>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    let options = run::RunOptions {
        dirs: args.dirs,
        config: args.config,
        output: args.output,
        workers: args.workers,
        cancel: Default::default(),
        time_limit: args.time_limit.and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
    };
    match run::run(options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pcbench error: {}", e);
            ExitCode::FAILURE
        }
    }
}
