//! Final report table (`CHARACTERS_FINAL.csv`).

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use fusion_models::CharacterId;

use crate::error::{CatalogError, CatalogResult};
use crate::fs_utils::{base_name, write_atomic};
use crate::table::CharacterRow;

/// One character with its delivered clip names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub id: CharacterId,
    pub name: String,
    /// Renamed basename for paired clips, original basename otherwise
    pub new_videos: Vec<String>,
}

/// Rewrite every character's clip list through the pairing mapping.
pub fn build_report(rows: &[CharacterRow], mapping: &BTreeMap<String, String>) -> Vec<ReportRow> {
    rows.iter()
        .map(|row| ReportRow {
            id: row.id,
            name: row.name.clone(),
            new_videos: row
                .videos
                .iter()
                .map(|video| match mapping.get(video) {
                    Some(destination) => base_name(destination).to_string(),
                    None => base_name(video).to_string(),
                })
                .collect(),
        })
        .collect()
}

/// Write the report with columns `ID,NAME,NEW_VIDEO`.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> CatalogResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(["ID", "NAME", "NEW_VIDEO"])?;
    for row in rows {
        writer.write_record([row.id.to_string(), row.name.clone(), row.new_videos.join(", ")])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CatalogError::Io(e.into_error()))?;

    write_atomic(path, &bytes)?;
    info!(path = %path.display(), characters = rows.len(), "Wrote final report");
    Ok(())
}
