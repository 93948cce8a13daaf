//! Cut stage: turn analysis documents into clips and final documents.
//!
//! For every `{video}-result.json` of the channel, locate the source video,
//! cut each detected scene into its own clip and write `{video}-final.json`.
//! A video whose clips already exist is skipped. Failures stay local to the
//! video or scene they belong to.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use fusion_catalog::fs_utils::write_atomic;
use fusion_catalog::ChannelLayout;
use fusion_media::{
    cut_clip, plan_cuts, probe_duration, CutPlan, FfmpegRunner, MediaError, MediaResult, CLIP_EXTENSION,
    INVALID_DIR,
};
use fusion_models::{AnalysisDocument, FinalDocument, SceneRecord, TokenUsage};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::StageLogger;

/// Source video extensions, tried in order.
pub const SOURCE_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "webm"];

const ANALYSIS_SUFFIX: &str = "-result.json";

/// Counts of one cut stage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CutReport {
    pub videos_cut: usize,
    pub videos_skipped: usize,
    pub videos_failed: usize,
    pub clips_cut: usize,
    pub clips_failed: usize,
    /// Scenes that could not be planned (bad timestamp, empty range)
    pub scenes_skipped: usize,
    /// Token usage summed over every readable analysis document
    pub usage: TokenUsage,
}

enum VideoOutcome {
    AlreadyCut,
    Cut { clips: usize, failed: usize, unplanned: usize },
}

pub struct CutStage {
    layout: ChannelLayout,
    runner: FfmpegRunner,
    max_parallel: usize,
    logger: StageLogger,
}

impl CutStage {
    pub fn new(layout: ChannelLayout, config: &WorkerConfig) -> Self {
        let logger = StageLogger::new(layout.channel(), "cut");
        Self {
            layout,
            runner: FfmpegRunner::new().with_timeout(config.cut_timeout.as_secs()),
            max_parallel: config.max_ffmpeg_processes.max(1),
            logger,
        }
    }

    pub async fn run(&self) -> WorkerResult<CutReport> {
        let documents = list_analysis_documents(&self.layout.analysis_dir())?;
        self.logger
            .log_start(&format!("{} analysis documents", documents.len()));

        let mut report = CutReport::default();
        for path in documents {
            let Some(stem) = video_stem(&path) else {
                continue;
            };

            let document = match read_analysis(&path).await {
                Ok(document) => document,
                Err(e) => {
                    self.logger
                        .log_warning(&format!("unreadable {}: {}", path.display(), e));
                    report.videos_failed += 1;
                    continue;
                }
            };
            report.usage += document.usage();

            match self.cut_video(&stem, &document).await {
                Ok(VideoOutcome::AlreadyCut) => {
                    debug!(video = %stem, scenes = document.scenes.len(), "All scenes already cut");
                    report.videos_skipped += 1;
                }
                Ok(VideoOutcome::Cut { clips, failed, unplanned }) => {
                    self.logger.log_progress(&format!(
                        "{}: {} clips cut, {} failed, {} unplanned",
                        stem, clips, failed, unplanned
                    ));
                    report.videos_cut += 1;
                    report.clips_cut += clips;
                    report.clips_failed += failed;
                    report.scenes_skipped += unplanned;
                }
                Err(e) => {
                    self.logger.log_error(&format!("{}: {}", stem, e));
                    report.videos_failed += 1;
                }
            }
        }

        self.logger.log_completion(&format!(
            "{} cut, {} skipped, {} failed",
            report.videos_cut, report.videos_skipped, report.videos_failed
        ));
        Ok(report)
    }

    async fn cut_video(&self, stem: &str, document: &AnalysisDocument) -> WorkerResult<VideoOutcome> {
        let source = self
            .find_source(stem)
            .ok_or_else(|| WorkerError::processing_failed(format!("no source video for {}", stem)))?;

        let existing = count_existing_cuts(&self.layout.cut_dir(), stem)?;
        if existing == document.scenes.len() {
            return Ok(VideoOutcome::AlreadyCut);
        }

        let duration = probe_duration(&source).await?;
        let schedule = plan_cuts(stem, &document.scenes, duration);
        for skipped in &schedule.skipped {
            warn!(video = %stem, scene = skipped.index, reason = %skipped.reason, "Scene not cut");
        }

        let cut_dir = self.layout.cut_dir();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let futures = schedule.plans.into_iter().map(|plan| {
            let semaphore = semaphore.clone();
            let source = source.clone();
            let output = plan.output_path(&cut_dir);
            let runner = self.runner.clone();
            async move {
                let result: MediaResult<()> = match semaphore.acquire().await {
                    Ok(_permit) => cut_clip(&source, &plan, &output, &runner).await,
                    Err(_) => Err(MediaError::ffmpeg_failed("cut queue closed", None, None)),
                };
                (plan, output, result)
            }
        });
        let results = join_all(futures).await;

        let mut records = Vec::with_capacity(results.len());
        let mut failed = 0;
        for (plan, output, result) in results {
            match result {
                Ok(()) => records.push(scene_record(&plan, &output)),
                Err(e) => {
                    warn!(video = %stem, clip = %plan.file_name, error = %e, "Failed to cut clip");
                    failed += 1;
                }
            }
        }

        let final_path = self.layout.final_path(stem);
        let clips = records.len();
        write_atomic(&final_path, &serde_json::to_vec_pretty(&FinalDocument::new(records))?)?;
        debug!(video = %stem, path = %final_path.display(), "Wrote final document");

        Ok(VideoOutcome::Cut {
            clips,
            failed,
            unplanned: schedule.skipped.len(),
        })
    }

    /// Look for the source video in the source directory, then next to the
    /// analysis documents.
    fn find_source(&self, stem: &str) -> Option<PathBuf> {
        [self.layout.source_dir(), self.layout.analysis_dir()]
            .iter()
            .flat_map(|dir| {
                SOURCE_EXTENSIONS
                    .iter()
                    .map(move |ext| dir.join(format!("{}.{}", stem, ext)))
            })
            .find(|path| path.is_file())
    }
}

fn scene_record(plan: &CutPlan, output: &Path) -> SceneRecord {
    let scene = &plan.scene;
    SceneRecord {
        clip_name: output.to_string_lossy().into_owned(),
        entities: scene.original_entities.clone(),
        fused_result: Some(scene.fused_result.clone()).filter(|f| !f.is_empty()),
        duration: plan.duration(),
        description: scene.text.clone(),
        watermark_flag: scene.watermark,
        extra_text_flag: scene.other_texts,
    }
}

fn video_stem(analysis_path: &Path) -> Option<String> {
    analysis_path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(ANALYSIS_SUFFIX))
        .filter(|stem| !stem.is_empty())
        .map(String::from)
}

async fn read_analysis(path: &Path) -> WorkerResult<AnalysisDocument> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

fn glob_sorted(dir: &Path, file_pattern: &str) -> WorkerResult<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        file_pattern
    );
    let paths = glob::glob(&pattern).map_err(|e| WorkerError::processing_failed(e.to_string()))?;
    let mut found: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
    found.sort();
    Ok(found)
}

/// `*-result.json` documents of the analysis directory, sorted.
pub fn list_analysis_documents(analysis_dir: &Path) -> WorkerResult<Vec<PathBuf>> {
    glob_sorted(analysis_dir, &format!("*{}", ANALYSIS_SUFFIX))
}

/// Clips of `stem` already present in the cut directory and its invalid
/// subdirectory.
pub fn count_existing_cuts(cut_dir: &Path, stem: &str) -> WorkerResult<usize> {
    let file_pattern = format!("{}-*.{}", glob::Pattern::escape(stem), CLIP_EXTENSION);
    let regular = glob_sorted(cut_dir, &file_pattern)?.len();
    let invalid = glob_sorted(&cut_dir.join(INVALID_DIR), &file_pattern)?.len();
    Ok(regular + invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_models::{DetectedScene, Flag};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_video_stem() {
        assert_eq!(video_stem(Path::new("json/7301-result.json")).as_deref(), Some("7301"));
        assert_eq!(video_stem(Path::new("json/-result.json")), None);
        assert_eq!(video_stem(Path::new("json/7301-final.json")), None);
    }

    #[test]
    fn test_count_existing_cuts_includes_invalid() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(INVALID_DIR)).unwrap();
        fs::write(dir.path().join("v1-1.mp4"), "").unwrap();
        fs::write(dir.path().join(INVALID_DIR).join("v1-2.mp4"), "").unwrap();
        fs::write(dir.path().join("v2-1.mp4"), "").unwrap();

        assert_eq!(count_existing_cuts(dir.path(), "v1").unwrap(), 2);
        assert_eq!(count_existing_cuts(dir.path(), "v3").unwrap(), 0);
    }

    #[test]
    fn test_list_analysis_documents_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b-result.json"), "{}").unwrap();
        fs::write(dir.path().join("a-result.json"), "{}").unwrap();
        fs::write(dir.path().join("a.mp4"), "").unwrap();

        let docs = list_analysis_documents(dir.path()).unwrap();
        let stems: Vec<_> = docs.iter().filter_map(|p| video_stem(p)).collect();
        assert_eq!(stems, vec!["a", "b"]);
    }

    #[test]
    fn test_scene_record_from_plan() {
        let plan = CutPlan {
            index: 2,
            scene: DetectedScene {
                text: "A fox turns into a bear".into(),
                time: "00:05".into(),
                original_entities: vec!["Fox".into(), "Bear".into()],
                fused_result: String::new(),
                watermark: Flag::No,
                other_texts: Flag::Yes,
            },
            start_secs: 5.5,
            end_secs: 9.0,
            file_name: "v-2.mp4".into(),
        };
        let output = plan.output_path(Path::new("cut"));
        let record = scene_record(&plan, &output);

        assert_eq!(record.clip_name, Path::new("cut").join("invalid").join("v-2.mp4").to_string_lossy());
        assert_eq!(record.duration, 3.5);
        assert_eq!(record.fused_result, None);
        assert_eq!(record.description, "A fox turns into a bear");
        assert!(record.extra_text_flag.is_yes());
    }

    #[tokio::test]
    async fn test_video_without_source_is_counted_as_failed() {
        let dir = TempDir::new().unwrap();
        let layout = ChannelLayout::new(dir.path(), "chan");
        layout.ensure_dirs().unwrap();
        fs::write(
            layout.analysis_path("v1"),
            r#"{"scenes": [{"time": "00:01", "original_entities": ["Fox", "Bear"]}], "prompt_token_count": 100, "candidates_token_count": 20, "total_token_count": 120}"#,
        )
        .unwrap();
        fs::write(layout.analysis_path("broken"), "not json").unwrap();

        let report = CutStage::new(layout, &WorkerConfig::default()).run().await.unwrap();

        assert_eq!(report.videos_failed, 2);
        assert_eq!(report.usage.total_tokens, 120);
    }

    #[tokio::test]
    async fn test_video_with_all_cuts_present_is_skipped() {
        let dir = TempDir::new().unwrap();
        let layout = ChannelLayout::new(dir.path(), "chan");
        layout.ensure_dirs().unwrap();
        fs::write(layout.source_dir().join("v1.mp4"), "").unwrap();
        fs::write(layout.cut_dir().join("v1-1.mp4"), "").unwrap();
        fs::write(
            layout.analysis_path("v1"),
            r#"{"scenes": [{"time": "00:01", "original_entities": ["Fox", "Bear"]}]}"#,
        )
        .unwrap();

        let report = CutStage::new(layout, &WorkerConfig::default()).run().await.unwrap();

        assert_eq!(report.videos_skipped, 1);
        assert_eq!(report.videos_failed, 0);
    }
}
