//! End-to-end post-processing of one channel.

use serde::Serialize;
use tracing::{info, info_span};

use crate::aggregate::{discover_final_documents, write_merged_document, AggregateReport, SceneAggregator};
use crate::error::CatalogResult;
use crate::layout::ChannelLayout;
use crate::pairing::{MaterializeReport, Materializer};
use crate::registry::{EntityRegistry, RegistryConfig, RegistryReport};
use crate::report::{build_report, write_report};
use crate::table::CharacterTable;

/// Post-processing options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessOptions {
    pub registry: RegistryConfig,
    /// Worker threads used for copying paired clips
    pub copy_parallelism: usize,
}

impl Default for PostProcessOptions {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            copy_parallelism: 4,
        }
    }
}

/// Counts of one post-processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostProcessSummary {
    pub aggregate: AggregateReport,
    pub registry: RegistryReport,
    pub table_rows_skipped: usize,
    pub materialize: MaterializeReport,
}

/// Aggregate, resolve, persist, pair and report for one channel.
///
/// A fatal registry error returns before the character table is written, so
/// the persisted table never holds a partial run.
pub fn run_post_process(
    layout: &ChannelLayout,
    options: &PostProcessOptions,
) -> CatalogResult<PostProcessSummary> {
    let span = info_span!("post_process", channel = layout.channel());
    let _guard = span.enter();

    let documents = discover_final_documents(&layout.final_dir())?;
    let aggregation = SceneAggregator::new(layout.cut_dir()).aggregate(&documents);
    write_merged_document(&layout.merged_path(), &aggregation.scenes)?;

    let characters_path = layout.characters_path();
    let persisted = CharacterTable::load_or_default(&characters_path)?;
    let mut registry = EntityRegistry::from_table(&persisted, options.registry);
    let registry_report = registry.record_scenes(&aggregation.scenes)?;
    registry.to_table().save(&characters_path)?;

    // pairing reads the table back so the file on disk is the source of truth
    let table = CharacterTable::load(&characters_path)?;
    let materialization = Materializer::new(layout.delivery_dir())
        .with_source_dir(layout.cut_dir())
        .with_parallelism(options.copy_parallelism)
        .materialize(table.rows())?;
    materialization.write_mapping(&layout.mapping_path())?;

    let report = build_report(table.rows(), &materialization.mapping());
    write_report(&layout.report_path(), &report)?;

    let summary = PostProcessSummary {
        aggregate: aggregation.report,
        registry: registry_report,
        table_rows_skipped: persisted.skipped_rows(),
        materialize: materialization.report(),
    };
    info!(
        scenes = summary.aggregate.scenes_kept,
        characters = table.len(),
        pairs = summary.materialize.pairs,
        copied = summary.materialize.copied,
        failed = summary.materialize.failed,
        "Post-processing complete"
    );
    Ok(summary)
}
