//! Fusion clip worker binary.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fusion_worker::{ChannelRunner, WorkerConfig};

/// Cut fusion scenes of a TikTok channel and deliver the paired clips.
#[derive(Parser, Debug)]
#[command(name = "fusion-worker")]
#[command(version)]
struct Cli {
    /// Channel name, `@name` or channel URL
    #[arg(env = "FUSION_CHANNEL")]
    channel: String,

    /// Root of all channel directories
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Fuzzy entity match threshold (0-100)
    #[arg(long)]
    threshold: Option<f64>,

    /// Only post-process clips that already exist
    #[arg(long)]
    skip_cut: bool,

    /// Threads copying paired clips
    #[arg(long)]
    copy_parallel: Option<usize>,
}

impl Cli {
    fn apply(&self, mut config: WorkerConfig) -> WorkerConfig {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(threshold) = self.threshold {
            config.fuzzy_threshold = threshold;
        }
        if let Some(threads) = self.copy_parallel {
            config.copy_parallelism = threads;
        }
        config.skip_cut |= self.skip_cut;
        config
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fusion=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    info!("Starting fusion-worker");

    let config = cli.apply(WorkerConfig::from_env());
    info!("Worker config: {:?}", config);

    let runner = match ChannelRunner::new(config, &cli.channel) {
        Ok(runner) => runner,
        Err(e) => {
            error!("Failed to start run: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = runner.run().await {
        error!(channel = %runner.layout().channel(), "Run aborted: {}", e);
        std::process::exit(e.exit_code());
    }

    info!("Worker finished");
}
