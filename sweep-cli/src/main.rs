//! Sets a canned ACL on every object of an S3 bucket.
//!
//! The bucket is listed page by page and the ACL is applied by a fixed pool of concurrent
//! workers. The last enqueued key is periodically saved to a state file so that an interrupted
//! run continues where it stopped.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sweep_telemetry::metrics::init_metrics;
use sweep_telemetry::tracing::init_tracing;

use crate::config::load_sweeper_config;
use crate::core::start_sweep;

mod config;
mod core;

#[derive(Debug, Parser)]
#[command(
    name = "s3-set-acl",
    version,
    about = "Scans an S3 bucket and sets a canned ACL on every object"
)]
struct Args {
    /// Name of the bucket to scan.
    #[arg(long)]
    bucket: Option<String>,
    /// File to periodically save the last processed key to, used to continue operations.
    #[arg(long)]
    state: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = load_sweeper_config(args.bucket, args.state)?;

    let _log_flusher = init_tracing(
        env!("CARGO_BIN_NAME"),
        Some(config.collection.bucket.clone()),
    )?;

    if let Some(metrics_config) = &config.metrics {
        init_metrics(metrics_config, &config.collection.bucket)
            .map_err(|err| anyhow::anyhow!("failed to initialize metrics: {err}"))?;
    }

    // We start the runtime.
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_sweep(config))
}
