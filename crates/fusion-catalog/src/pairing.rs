//! Pairing of two-character clips and their materialization.
//!
//! Pairs are derived from the persisted character table, not from the live
//! scene list. A clip whose distinct character ids number exactly two is
//! copied into the delivery directory as `{low}_{high}{ext}`.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use fusion_models::CharacterId;

use crate::error::{CatalogError, CatalogResult};
use crate::fs_utils::{base_name, copy_if_absent, write_atomic, CopyOutcome};
use crate::table::CharacterRow;

const DEFAULT_EXTENSION: &str = ".mp4";
const DEFAULT_PARALLELISM: usize = 4;

/// A clip carrying exactly two distinct characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipPair {
    pub clip_name: String,
    pub low: CharacterId,
    pub high: CharacterId,
}

impl ClipPair {
    /// Delivery filename, `{low}_{high}` plus the clip's extension.
    pub fn destination_name(&self) -> String {
        let extension = Path::new(&self.clip_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        format!("{}_{}{}", self.low, self.high, extension)
    }
}

/// Invert the table into clip -> ids and keep the two-character clips,
/// ordered by clip name.
pub fn pair_clips(rows: &[CharacterRow]) -> Vec<ClipPair> {
    let mut by_clip: BTreeMap<&str, BTreeSet<CharacterId>> = BTreeMap::new();
    for row in rows {
        for video in &row.videos {
            by_clip.entry(video.as_str()).or_default().insert(row.id);
        }
    }

    by_clip
        .into_iter()
        .filter_map(|(clip_name, ids)| {
            let mut ids = ids.into_iter();
            match (ids.next(), ids.next(), ids.next()) {
                (Some(low), Some(high), None) => Some(ClipPair {
                    clip_name: clip_name.to_string(),
                    low,
                    high,
                }),
                _ => None,
            }
        })
        .collect()
}

/// One mapping entry and what happened to its copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingEntry {
    pub pair: ClipPair,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: CopyOutcome,
}

/// Counts of one materialization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub pairs: usize,
    pub copied: usize,
    pub already_present: usize,
    pub shared: usize,
    pub failed: usize,
}

/// Result of [`Materializer::materialize`].
#[derive(Debug, Clone, Default)]
pub struct Materialization {
    pub entries: Vec<PairingEntry>,
}

impl Materialization {
    /// Source clip name -> destination path, including failed copies.
    pub fn mapping(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| {
                (
                    e.pair.clip_name.clone(),
                    e.destination.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }

    pub fn report(&self) -> MaterializeReport {
        let mut report = MaterializeReport {
            pairs: self.entries.len(),
            ..MaterializeReport::default()
        };
        for entry in &self.entries {
            match entry.outcome {
                CopyOutcome::Copied => report.copied += 1,
                CopyOutcome::AlreadyPresent => report.already_present += 1,
                CopyOutcome::SharedDestination => report.shared += 1,
                CopyOutcome::Failed(_) => report.failed += 1,
            }
        }
        report
    }

    /// Persist the mapping as a key-sorted JSON object.
    pub fn write_mapping(&self, path: &Path) -> CatalogResult<()> {
        let json = serde_json::to_vec_pretty(&self.mapping())?;
        write_atomic(path, &json)?;
        info!(path = %path.display(), entries = self.entries.len(), "Wrote pairing mapping");
        Ok(())
    }
}

/// Copies paired clips into the delivery directory.
#[derive(Debug, Clone)]
pub struct Materializer {
    delivery_dir: PathBuf,
    source_dir: Option<PathBuf>,
    parallelism: usize,
}

impl Materializer {
    pub fn new(delivery_dir: impl Into<PathBuf>) -> Self {
        Self {
            delivery_dir: delivery_dir.into(),
            source_dir: None,
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    /// Directory to look up clips whose stored name is not a readable path.
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads.max(1);
        self
    }

    /// Pair the table's clips and copy each new destination once.
    ///
    /// Existing destinations are never overwritten. Copy failures are kept in
    /// the result with [`CopyOutcome::Failed`].
    pub fn materialize(&self, rows: &[CharacterRow]) -> CatalogResult<Materialization> {
        fs::create_dir_all(&self.delivery_dir)?;

        let mut claimed = HashSet::new();
        let planned: Vec<(ClipPair, PathBuf, PathBuf, bool)> = pair_clips(rows)
            .into_iter()
            .map(|pair| {
                let source = self.resolve_source(&pair.clip_name);
                let destination = self.delivery_dir.join(pair.destination_name());
                let owner = claimed.insert(destination.clone());
                (pair, source, destination, owner)
            })
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
            .map_err(|e| CatalogError::ThreadPool(e.to_string()))?;

        let entries: Vec<PairingEntry> = pool.install(|| {
            planned
                .into_par_iter()
                .map(|(pair, source, destination, owner)| {
                    let outcome = if owner {
                        copy_if_absent(&source, &destination)
                    } else {
                        warn!(
                            clip = %pair.clip_name,
                            destination = %destination.display(),
                            "Destination owned by another clip with the same pair"
                        );
                        CopyOutcome::SharedDestination
                    };
                    PairingEntry {
                        pair,
                        source,
                        destination,
                        outcome,
                    }
                })
                .collect()
        });

        let materialization = Materialization { entries };
        let report = materialization.report();
        info!(
            delivery_dir = %self.delivery_dir.display(),
            pairs = report.pairs,
            copied = report.copied,
            already_present = report.already_present,
            shared = report.shared,
            failed = report.failed,
            "Materialized paired clips"
        );
        Ok(materialization)
    }

    fn resolve_source(&self, clip_name: &str) -> PathBuf {
        let stored = PathBuf::from(clip_name);
        if stored.is_file() {
            return stored;
        }
        match &self.source_dir {
            Some(dir) => dir.join(base_name(clip_name)),
            None => stored,
        }
    }
}
