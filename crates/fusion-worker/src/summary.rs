//! Run summary written at the end of every channel run.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use fusion_catalog::fs_utils::write_atomic;
use fusion_catalog::PostProcessSummary;
use fusion_models::{CostBreakdown, TokenPricing};

use crate::cut_stage::CutReport;
use crate::error::WorkerResult;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub channel: String,
    pub cut_stage_ran: bool,
    pub cut: CutReport,
    pub post_process: PostProcessSummary,
    pub cost: CostBreakdown,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn new(
        channel: &str,
        cut: Option<CutReport>,
        post_process: PostProcessSummary,
        elapsed_secs: f64,
    ) -> Self {
        let cut_stage_ran = cut.is_some();
        let cut = cut.unwrap_or_default();
        Self {
            channel: channel.to_string(),
            cut_stage_ran,
            cost: cut.usage.cost(&TokenPricing::default()),
            cut,
            post_process,
            elapsed_secs,
        }
    }

    /// Log the headline counts.
    pub fn log(&self) {
        let aggregate = &self.post_process.aggregate;
        let registry = &self.post_process.registry;
        let materialize = &self.post_process.materialize;
        info!(
            channel = %self.channel,
            videos_cut = self.cut.videos_cut,
            videos_failed = self.cut.videos_failed,
            documents = aggregate.documents_read,
            documents_skipped = aggregate.documents_skipped,
            scenes = aggregate.scenes_kept,
            scenes_dropped = aggregate.scenes_missing_clip + aggregate.scenes_malformed,
            characters_loaded = registry.characters_loaded,
            characters_created = registry.characters_created,
            names_skipped = registry.names_skipped,
            pairs = materialize.pairs,
            copied = materialize.copied,
            already_present = materialize.already_present,
            shared = materialize.shared,
            copy_failed = materialize.failed,
            total_tokens = self.cut.usage.total_tokens,
            total_cost = self.cost.total_cost,
            elapsed_secs = self.elapsed_secs,
            "Run summary"
        );
    }

    pub fn write(&self, path: &Path) -> WorkerResult<()> {
        write_atomic(path, &serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
