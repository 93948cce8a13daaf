//! Channel run orchestration: cut stage, then post-processing.

use std::time::Instant;

use tracing::{info, Instrument};

use fusion_catalog::{run_post_process, ChannelLayout, PostProcessOptions, PostProcessSummary, RegistryConfig};
use fusion_media::{check_ffmpeg, check_ffprobe};
use fusion_models::channel_name;

use crate::config::WorkerConfig;
use crate::cut_stage::{CutReport, CutStage};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::StageLogger;
use crate::metrics;
use crate::summary::RunSummary;

/// Runs every stage for one channel.
pub struct ChannelRunner {
    config: WorkerConfig,
    layout: ChannelLayout,
    logger: StageLogger,
}

impl ChannelRunner {
    /// `channel` may be a bare name, `@name` or a TikTok channel URL.
    pub fn new(config: WorkerConfig, channel: &str) -> WorkerResult<Self> {
        config.validate()?;
        let channel = channel_name(channel)?;
        let layout = ChannelLayout::new(&config.data_dir, &channel);
        let logger = StageLogger::new(&channel, "run");
        Ok(Self {
            config,
            layout,
            logger,
        })
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    pub async fn run(&self) -> WorkerResult<RunSummary> {
        let started = Instant::now();
        self.logger
            .log_start(&format!("channel directory {}", self.layout.root().display()));
        self.layout.ensure_dirs()?;

        let cut = self.run_cut_stage().await?;
        let post_process = self.run_post_process_stage().await?;

        let summary = RunSummary::new(
            self.layout.channel(),
            cut,
            post_process,
            started.elapsed().as_secs_f64(),
        );
        summary.write(&self.layout.summary_path())?;
        summary.log();
        self.logger.log_completion("run finished");
        Ok(summary)
    }

    async fn run_cut_stage(&self) -> WorkerResult<Option<CutReport>> {
        let logger = self.logger.for_stage("cut");
        if self.config.skip_cut {
            logger.log_progress("skipped by configuration");
            return Ok(None);
        }
        if let Err(e) = check_ffmpeg().and_then(|_| check_ffprobe()) {
            logger.log_warning(&format!("{}, cutting skipped", e));
            return Ok(None);
        }

        let started = Instant::now();
        let stage = CutStage::new(self.layout.clone(), &self.config);
        let report = stage.run().instrument(logger.create_span()).await?;

        metrics::record_stage_duration("cut", started.elapsed().as_secs_f64());
        metrics::record_cut(&report);
        Ok(Some(report))
    }

    async fn run_post_process_stage(&self) -> WorkerResult<PostProcessSummary> {
        let logger = self.logger.for_stage("post_process");
        logger.log_start("aggregating final documents");

        let started = Instant::now();
        let layout = self.layout.clone();
        let options = PostProcessOptions {
            registry: RegistryConfig::with_threshold(self.config.fuzzy_threshold),
            copy_parallelism: self.config.copy_parallelism,
        };

        let result = tokio::task::spawn_blocking(move || run_post_process(&layout, &options))
            .await
            .map_err(|e| WorkerError::processing_failed(format!("post-process task failed: {}", e)))?;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                logger.log_error(&e.to_string());
                return Err(e.into());
            }
        };

        metrics::record_stage_duration("post_process", started.elapsed().as_secs_f64());
        metrics::record_post_process(&summary);
        info!(
            channel = %self.layout.channel(),
            pairs = summary.materialize.pairs,
            "Post-processing stage done"
        );
        Ok(summary)
    }
}
