//! Persisted character table (`CHARACTERS.csv`).
//!
//! Columns are `ID,NAME,VIDEO`: the zero-padded id, the normalized display
//! name and the comma-space-joined list of clip names the character appears in.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use fusion_models::{CharacterId, CharacterIdError};

use crate::error::{CatalogError, CatalogResult};
use crate::fs_utils::write_atomic;

const ID_COLUMN: &str = "ID";
const NAME_COLUMN: &str = "NAME";
const VIDEO_COLUMN: &str = "VIDEO";
const VIDEO_SEPARATOR: &str = ", ";

/// One row of the character table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRow {
    pub id: CharacterId,
    pub name: String,
    pub videos: Vec<String>,
}

impl CharacterRow {
    pub fn new(id: CharacterId, name: impl Into<String>, videos: Vec<String>) -> Self {
        Self {
            id,
            name: name.into(),
            videos,
        }
    }
}

/// The full character table, rows ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterTable {
    rows: Vec<CharacterRow>,
    skipped_rows: usize,
}

struct Columns {
    id: usize,
    name: usize,
    video: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Option<Self> {
        let find = |wanted: &str| headers.iter().position(|h| h.trim() == wanted);
        Some(Self {
            id: find(ID_COLUMN)?,
            name: find(NAME_COLUMN)?,
            video: find(VIDEO_COLUMN),
        })
    }
}

impl CharacterTable {
    /// Build a table from rows; duplicate ids keep their first row.
    pub fn from_rows(rows: impl IntoIterator<Item = CharacterRow>) -> Self {
        let mut by_id = BTreeMap::new();
        let mut skipped_rows = 0;
        for row in rows {
            if by_id.contains_key(&row.id) {
                warn!(character_id = %row.id, "Duplicate character id, keeping first row");
                skipped_rows += 1;
                continue;
            }
            by_id.insert(row.id, row);
        }
        Self {
            rows: by_id.into_values().collect(),
            skipped_rows,
        }
    }

    /// Load the table from `path`.
    ///
    /// A missing `ID` or `NAME` header makes the whole table unreadable.
    /// Individual malformed rows are skipped with a warning.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let contents = fs::read(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(contents.as_slice());

        let headers = reader
            .headers()
            .map_err(|e| CatalogError::malformed_table(path, e.to_string()))?
            .clone();
        let columns = Columns::locate(&headers).ok_or_else(|| {
            CatalogError::malformed_table(path, "expected ID and NAME columns")
        })?;

        let mut rows = Vec::new();
        let mut skipped = 0;
        for record in reader.records() {
            match record.map_err(CatalogError::from).and_then(|r| parse_row(&r, &columns)) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!(table = %path.display(), error = %e, "Skipping character table row");
                    skipped += 1;
                }
            }
        }

        let mut table = Self::from_rows(rows);
        table.skipped_rows += skipped;

        info!(
            table = %path.display(),
            characters = table.rows.len(),
            skipped = table.skipped_rows,
            "Loaded character table"
        );
        Ok(table)
    }

    /// Load the table if the file exists, otherwise start empty.
    pub fn load_or_default(path: &Path) -> CatalogResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(table = %path.display(), "No character table yet, starting empty");
            Ok(Self::default())
        }
    }

    /// Overwrite `path` with this table.
    pub fn save(&self, path: &Path) -> CatalogResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record([ID_COLUMN, NAME_COLUMN, VIDEO_COLUMN])?;
        for row in &self.rows {
            writer.write_record([
                row.id.to_string(),
                row.name.clone(),
                row.videos.join(VIDEO_SEPARATOR),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| CatalogError::Io(e.into_error()))?;

        write_atomic(path, &bytes)?;
        info!(table = %path.display(), characters = self.rows.len(), "Saved character table");
        Ok(())
    }

    pub fn rows(&self) -> &[CharacterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows dropped while loading (malformed or duplicate ids).
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

fn parse_row(record: &StringRecord, columns: &Columns) -> CatalogResult<CharacterRow> {
    let line = record.position().map(|p| p.line()).unwrap_or_default();

    let raw_id = record
        .get(columns.id)
        .ok_or_else(|| CatalogError::malformed_row(line, "missing ID"))?;
    let id: CharacterId = raw_id
        .parse()
        .map_err(|e: CharacterIdError| CatalogError::malformed_row(line, e.to_string()))?;

    let name = record
        .get(columns.name)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| CatalogError::malformed_row(line, "missing NAME"))?;

    let videos = columns
        .video
        .and_then(|i| record.get(i))
        .map(split_videos)
        .unwrap_or_default();

    Ok(CharacterRow::new(id, name, videos))
}

fn split_videos(field: &str) -> Vec<String> {
    field
        .split(VIDEO_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(value: u16) -> CharacterId {
        CharacterId::new(value).unwrap()
    }

    #[test]
    fn test_save_and_load_preserves_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHARACTERS.csv");
        let table = CharacterTable::from_rows(vec![
            CharacterRow::new(id(2), "bear", vec!["x-1.mp4".into()]),
            CharacterRow::new(id(1), "fox", vec!["x-1.mp4".into(), "y-3.mp4".into()]),
        ]);

        table.save(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("ID,NAME,VIDEO\n001,fox,\"x-1.mp4, y-3.mp4\"\n"));

        let loaded = CharacterTable::load(&path).unwrap();
        assert_eq!(loaded.rows(), table.rows());
        assert_eq!(loaded.rows()[0].id, id(1));
    }

    #[test]
    fn test_load_accepts_legacy_unpadded_ids_and_empty_videos() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHARACTERS.csv");
        fs::write(&path, "ID,NAME,VIDEO\n7,owl,\n1,fox,a.mp4, b.mp4\n").unwrap();

        let table = CharacterTable::load(&path).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].id.to_string(), "001");
        assert_eq!(table.rows()[1].id.to_string(), "007");
        assert!(table.rows()[1].videos.is_empty());
    }

    #[test]
    fn test_clip_names_with_commas_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHARACTERS.csv");
        let videos = vec!["fox,bear-1.mp4".to_string(), "y-3.mp4".to_string()];
        CharacterTable::from_rows(vec![CharacterRow::new(id(1), "fox", videos.clone())])
            .save(&path)
            .unwrap();

        let loaded = CharacterTable::load(&path).unwrap();
        assert_eq!(loaded.rows()[0].videos, videos);
    }

    #[test]
    fn test_load_skips_malformed_and_duplicate_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHARACTERS.csv");
        fs::write(
            &path,
            "ID,NAME,VIDEO\n001,fox,a.mp4\nabc,cat,b.mp4\n001,wolf,c.mp4\n1000,eel,d.mp4\n002,,e.mp4\n",
        )
        .unwrap();

        let table = CharacterTable::load(&path).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].name, "fox");
        assert_eq!(table.skipped_rows(), 4);
    }

    #[test]
    fn test_load_without_required_headers_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHARACTERS.csv");
        fs::write(&path, "character,clips\nfox,a.mp4\n").unwrap();

        let err = CharacterTable::load(&path).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let table = CharacterTable::load_or_default(&dir.path().join("CHARACTERS.csv")).unwrap();
        assert!(table.is_empty());
    }
}
