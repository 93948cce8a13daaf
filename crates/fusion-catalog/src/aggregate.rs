//! Scene aggregation across per-video final documents.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use fusion_models::{FinalDocument, SceneRecord};

use crate::error::{CatalogError, CatalogResult};
use crate::fs_utils::write_atomic;

/// Counts gathered while aggregating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub documents_read: usize,
    pub documents_skipped: usize,
    pub scenes_kept: usize,
    /// Scenes whose clip is not present in the videos directory
    pub scenes_missing_clip: usize,
    /// Scene entries that failed to deserialize
    pub scenes_malformed: usize,
}

/// Merged, sorted scenes of a channel.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub scenes: Vec<SceneRecord>,
    pub report: AggregateReport,
}

/// Merges final documents into one corpus-wide scene list.
#[derive(Debug, Clone)]
pub struct SceneAggregator {
    videos_dir: PathBuf,
}

impl SceneAggregator {
    /// `videos_dir` is where the cut clips live; a scene survives only if
    /// its clip's base filename exists there.
    pub fn new(videos_dir: impl Into<PathBuf>) -> Self {
        Self {
            videos_dir: videos_dir.into(),
        }
    }

    /// Read every document, drop unusable scenes and sort the rest by clip name.
    pub fn aggregate<P: AsRef<Path>>(&self, documents: &[P]) -> Aggregation {
        let mut aggregation = Aggregation::default();

        for path in documents {
            let path = path.as_ref();
            let entries = match read_scene_entries(path) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(document = %path.display(), error = %e, "Skipping final document");
                    aggregation.report.documents_skipped += 1;
                    continue;
                }
            };

            aggregation.report.documents_read += 1;
            let before = aggregation.scenes.len();

            for (position, entry) in entries.into_iter().enumerate() {
                match serde_json::from_value::<SceneRecord>(entry) {
                    Ok(scene) => self.keep_if_present(scene, &mut aggregation),
                    Err(e) => {
                        warn!(
                            document = %path.display(),
                            position,
                            error = %e,
                            "Skipping malformed scene entry"
                        );
                        aggregation.report.scenes_malformed += 1;
                    }
                }
            }

            debug!(
                document = %path.display(),
                added = aggregation.scenes.len() - before,
                "Aggregated final document"
            );
        }

        aggregation
            .scenes
            .sort_by(|a, b| a.clip_name.cmp(&b.clip_name));
        aggregation.report.scenes_kept = aggregation.scenes.len();

        info!(
            documents = aggregation.report.documents_read,
            skipped_documents = aggregation.report.documents_skipped,
            scenes = aggregation.report.scenes_kept,
            missing_clips = aggregation.report.scenes_missing_clip,
            "Aggregated scenes"
        );

        aggregation
    }

    fn keep_if_present(&self, scene: SceneRecord, aggregation: &mut Aggregation) {
        let file_name = scene.file_name();
        if !file_name.is_empty() && self.videos_dir.join(file_name).is_file() {
            aggregation.scenes.push(scene);
        } else {
            warn!(
                clip = %scene.clip_name,
                videos_dir = %self.videos_dir.display(),
                "Dropping scene, clip not found"
            );
            aggregation.report.scenes_missing_clip += 1;
        }
    }
}

/// Read the raw `scenes` array of one final document.
fn read_scene_entries(path: &Path) -> CatalogResult<Vec<Value>> {
    let contents = fs::read_to_string(path)?;
    let mut document: Value = serde_json::from_str(&contents)?;

    match document.get_mut("scenes").map(Value::take) {
        Some(Value::Array(entries)) => Ok(entries),
        Some(_) => Err(CatalogError::malformed_document(path, "'scenes' is not an array")),
        None => Err(CatalogError::malformed_document(path, "missing 'scenes' array")),
    }
}

/// List the `*-final.json` documents of `final_dir`, sorted by path.
pub fn discover_final_documents(final_dir: &Path) -> CatalogResult<Vec<PathBuf>> {
    if !final_dir.is_dir() {
        warn!(final_dir = %final_dir.display(), "Final directory does not exist");
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/*-final.json",
        glob::Pattern::escape(&final_dir.to_string_lossy())
    );
    let paths = glob::glob(&pattern)
        .map_err(|e| CatalogError::malformed_document(final_dir, e.to_string()))?;

    let mut documents = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => documents.push(path),
            Err(e) => warn!(error = %e, "Unreadable entry in final directory"),
        }
    }
    documents.sort();

    Ok(documents)
}

/// Write the merged scene list as a final-document-shaped JSON file.
pub fn write_merged_document(path: &Path, scenes: &[SceneRecord]) -> CatalogResult<()> {
    let document = FinalDocument::new(scenes.to_vec());
    write_atomic(path, &serde_json::to_vec_pretty(&document)?)?;
    info!(path = %path.display(), scenes = scenes.len(), "Wrote merged scenes document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_aggregate_drops_missing_clips_and_sorts() {
        let dir = TempDir::new().unwrap();
        let cut = dir.path().join("cut");
        fs::create_dir_all(&cut).unwrap();
        write(&cut.join("b-1.mp4"), "clip");
        write(&cut.join("a-2.mp4"), "clip");

        let doc = dir.path().join("ab-final.json");
        write(
            &doc,
            r#"{"scenes": [
                {"name": "static/c/cut/b-1.mp4", "original_entities": ["Fox", "Bear"], "total time": 3, "description": "", "watermark": "no"},
                {"name": "static/c/cut/a-2.mp4", "original_entities": ["Owl", "Cat"], "total time": 3, "description": "", "watermark": "no"},
                {"name": "static/c/cut/a-9.mp4", "original_entities": ["Owl", "Eel"], "total time": 3, "description": "", "watermark": "no"}
            ]}"#,
        );

        let aggregation = SceneAggregator::new(&cut).aggregate(&[doc]);

        let names: Vec<&str> = aggregation.scenes.iter().map(|s| s.file_name()).collect();
        assert_eq!(names, vec!["a-2.mp4", "b-1.mp4"]);
        assert_eq!(aggregation.report.scenes_missing_clip, 1);
        assert_eq!(aggregation.report.scenes_kept, 2);
    }

    #[test]
    fn test_aggregate_skips_bad_documents_and_entries() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("x-1.mp4"), "clip");

        let broken = dir.path().join("broken-final.json");
        write(&broken, "{not json");
        let no_scenes = dir.path().join("empty-final.json");
        write(&no_scenes, r#"{"clips": []}"#);
        let mixed = dir.path().join("x-final.json");
        write(
            &mixed,
            r#"{"scenes": [{"original_entities": ["Fox"]}, {"name": "x-1.mp4", "original_entities": ["Fox"]}]}"#,
        );

        let aggregation = SceneAggregator::new(dir.path()).aggregate(&[broken, no_scenes, mixed]);

        assert_eq!(aggregation.report.documents_skipped, 2);
        assert_eq!(aggregation.report.documents_read, 1);
        assert_eq!(aggregation.report.scenes_malformed, 1);
        assert_eq!(aggregation.scenes.len(), 1);
    }

    #[test]
    fn test_discover_final_documents_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("b-final.json"), "{}");
        write(&dir.path().join("a-final.json"), "{}");
        write(&dir.path().join("a-result.json"), "{}");

        let documents = discover_final_documents(dir.path()).unwrap();
        let names: Vec<_> = documents
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a-final.json", "b-final.json"]);
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover_final_documents(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_merged_document_round_trips_through_final_schema() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("x-1.mp4"), "clip");
        let doc = dir.path().join("x-final.json");
        write(
            &doc,
            r#"{"scenes": [{"name": "x-1.mp4", "original_entities": ["Fox", "Bear"], "total time": 2.5, "description": "d", "watermark": "yes", "other_texts": "no"}]}"#,
        );

        let aggregation = SceneAggregator::new(dir.path()).aggregate(&[&doc]);
        let merged = dir.path().join("FUSION.json");
        write_merged_document(&merged, &aggregation.scenes).unwrap();

        let reread = SceneAggregator::new(dir.path()).aggregate(&[&merged]);
        assert_eq!(reread.scenes, aggregation.scenes);
    }
}
