//! Run metrics.
//!
//! Recorded through the `metrics` facade. Without an installed recorder every
//! call is a no-op.

use metrics::{counter, histogram};

use fusion_catalog::PostProcessSummary;

use crate::cut_stage::CutReport;

/// Metric name constants for consistency.
pub mod names {
    /// Scenes seen by aggregation, by outcome.
    pub const SCENES_TOTAL: &str = "fusion_scenes_total";

    /// Clips handled by the cut and materialization stages, by outcome.
    pub const CLIPS_TOTAL: &str = "fusion_clips_total";

    /// Characters known after a run, by kind (loaded or created).
    pub const CHARACTERS_TOTAL: &str = "fusion_characters_total";

    /// Stage wall time in seconds.
    pub const STAGE_SECONDS: &str = "fusion_stage_seconds";
}

pub fn record_stage_duration(stage: &'static str, secs: f64) {
    histogram!(names::STAGE_SECONDS, "stage" => stage).record(secs);
}

pub fn record_cut(report: &CutReport) {
    counter!(names::CLIPS_TOTAL, "outcome" => "cut").increment(report.clips_cut as u64);
    counter!(names::CLIPS_TOTAL, "outcome" => "cut_failed").increment(report.clips_failed as u64);
}

pub fn record_post_process(summary: &PostProcessSummary) {
    let aggregate = &summary.aggregate;
    counter!(names::SCENES_TOTAL, "outcome" => "kept").increment(aggregate.scenes_kept as u64);
    counter!(names::SCENES_TOTAL, "outcome" => "missing_clip")
        .increment(aggregate.scenes_missing_clip as u64);
    counter!(names::SCENES_TOTAL, "outcome" => "malformed")
        .increment(aggregate.scenes_malformed as u64);

    let registry = &summary.registry;
    counter!(names::CHARACTERS_TOTAL, "kind" => "loaded")
        .increment(registry.characters_loaded as u64);
    counter!(names::CHARACTERS_TOTAL, "kind" => "created")
        .increment(registry.characters_created as u64);

    let materialize = &summary.materialize;
    counter!(names::CLIPS_TOTAL, "outcome" => "copied").increment(materialize.copied as u64);
    counter!(names::CLIPS_TOTAL, "outcome" => "already_present")
        .increment(materialize.already_present as u64);
    counter!(names::CLIPS_TOTAL, "outcome" => "shared").increment(materialize.shared as u64);
    counter!(names::CLIPS_TOTAL, "outcome" => "copy_failed").increment(materialize.failed as u64);
}
