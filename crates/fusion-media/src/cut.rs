//! Cut planning and clip extraction.
//!
//! The model reports one start timestamp per fusion scene. A scene runs until
//! shortly before the next scene starts; the last scene runs to the end of
//! the source. Start times of later scenes are nudged forward because the
//! model tends to report the moment the two entities first appear, a beat
//! before the cut.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fusion_models::{format_seconds, parse_timestamp, DetectedScene, TimestampError};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Sources shorter than this get no start offset.
pub const SHORT_VIDEO_SECS: f64 = 30.0;

/// Offset added to the start of every scene after the first.
pub const SCENE_START_OFFSET_SECS: f64 = 0.5;

/// Gap left between a scene's end and the next scene's start.
pub const SCENE_END_GAP_SECS: f64 = 1.0;

/// Container extension of every cut clip.
pub const CLIP_EXTENSION: &str = "mp4";

/// Subdirectory of the cut directory for clips with on-screen text.
pub const INVALID_DIR: &str = "invalid";

/// One clip to extract from a source video.
#[derive(Debug, Clone, PartialEq)]
pub struct CutPlan {
    /// 1-based position of the scene in the analysis document
    pub index: usize,
    pub scene: DetectedScene,
    pub start_secs: f64,
    pub end_secs: f64,
    /// File name of the clip, `{video}-{index}.mp4`
    pub file_name: String,
}

impl CutPlan {
    pub fn duration(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Scenes flagged with on-screen text are kept out of the main cut directory.
    pub fn is_invalid(&self) -> bool {
        self.scene.other_texts.is_yes()
    }

    /// Where this clip is written below `cut_dir`.
    pub fn output_path(&self, cut_dir: &Path) -> PathBuf {
        if self.is_invalid() {
            cut_dir.join(INVALID_DIR).join(&self.file_name)
        } else {
            cut_dir.join(&self.file_name)
        }
    }
}

/// Why a scene could not be planned.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    InvalidTimestamp(TimestampError),
    EmptyRange { start_secs: f64, end_secs: f64 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidTimestamp(e) => write!(f, "invalid timestamp: {}", e),
            SkipReason::EmptyRange { start_secs, end_secs } => {
                write!(
                    f,
                    "empty range {}..{}",
                    format_seconds(*start_secs),
                    format_seconds(*end_secs)
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedScene {
    pub index: usize,
    pub reason: SkipReason,
}

/// Result of planning one source video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutSchedule {
    pub plans: Vec<CutPlan>,
    pub skipped: Vec<SkippedScene>,
}

/// Clip file name for scene `index` (1-based) of `video_stem`.
pub fn clip_file_name(video_stem: &str, index: usize) -> String {
    format!("{}-{}.{}", video_stem, index, CLIP_EXTENSION)
}

/// Plan the clips of one source video.
///
/// Scenes with an unparsable timestamp are skipped and do not bound their
/// neighbours; scenes whose range collapses are skipped too.
pub fn plan_cuts(video_stem: &str, scenes: &[DetectedScene], video_duration: f64) -> CutSchedule {
    let mut schedule = CutSchedule::default();
    let apply_offset = video_duration >= SHORT_VIDEO_SECS;

    let mut starts: Vec<(usize, f64)> = Vec::with_capacity(scenes.len());
    for (idx, scene) in scenes.iter().enumerate() {
        match parse_timestamp(&scene.time) {
            Ok(raw) => {
                let start = if apply_offset && idx > 0 {
                    raw + SCENE_START_OFFSET_SECS
                } else {
                    raw
                };
                starts.push((idx, start));
            }
            Err(e) => schedule.skipped.push(SkippedScene {
                index: idx + 1,
                reason: SkipReason::InvalidTimestamp(e),
            }),
        }
    }

    for (pos, &(idx, start_secs)) in starts.iter().enumerate() {
        let end_secs = match starts.get(pos + 1) {
            Some(&(_, next_start)) => (next_start - SCENE_END_GAP_SECS).min(video_duration),
            None => video_duration,
        };

        if end_secs <= start_secs {
            schedule.skipped.push(SkippedScene {
                index: idx + 1,
                reason: SkipReason::EmptyRange { start_secs, end_secs },
            });
            continue;
        }

        schedule.plans.push(CutPlan {
            index: idx + 1,
            scene: scenes[idx].clone(),
            start_secs,
            end_secs,
            file_name: clip_file_name(video_stem, idx + 1),
        });
    }

    schedule.skipped.sort_by_key(|s| s.index);
    schedule
}

/// Extract one planned clip from `source` into `output`, re-encoding with
/// H.264/AAC.
pub async fn cut_clip(
    source: &Path,
    plan: &CutPlan,
    output: &Path,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!(
        source = %source.display(),
        output = %output.display(),
        start = %format_seconds(plan.start_secs),
        duration_secs = plan.duration(),
        "Cutting clip"
    );

    let cmd = FfmpegCommand::new(source, output)
        .seek(plan.start_secs)
        .duration(plan.duration())
        .video_codec("libx264")
        .audio_codec("aac");

    let total_ms = (plan.duration() * 1000.0) as i64;
    let clip = plan.file_name.clone();
    runner
        .run_with_progress(&cmd, move |progress| {
            debug!(clip = %clip, percent = progress.percentage(total_ms), "Cut progress");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_models::Flag;

    fn scene(time: &str) -> DetectedScene {
        DetectedScene {
            text: String::new(),
            time: time.to_string(),
            original_entities: vec!["Fox".to_string(), "Bear".to_string()],
            fused_result: String::new(),
            watermark: Flag::No,
            other_texts: Flag::No,
        }
    }

    #[test]
    fn test_plan_long_video_applies_offsets() {
        let scenes = vec![scene("00:00"), scene("00:10"), scene("00:20.500")];
        let schedule = plan_cuts("7301", &scenes, 40.0);

        assert!(schedule.skipped.is_empty());
        let plans = &schedule.plans;
        assert_eq!(plans.len(), 3);

        assert_eq!(plans[0].start_secs, 0.0);
        assert_eq!(plans[0].end_secs, 9.5);
        assert_eq!(plans[1].start_secs, 10.5);
        assert_eq!(plans[1].end_secs, 20.0);
        assert_eq!(plans[2].start_secs, 21.0);
        assert_eq!(plans[2].end_secs, 40.0);
        assert_eq!(plans[2].file_name, "7301-3.mp4");
    }

    #[test]
    fn test_plan_short_video_has_no_offset() {
        let scenes = vec![scene("00:00"), scene("00:08")];
        let schedule = plan_cuts("short", &scenes, 20.0);

        assert_eq!(schedule.plans[1].start_secs, 8.0);
        assert_eq!(schedule.plans[0].end_secs, 7.0);
    }

    #[test]
    fn test_plan_skips_bad_timestamp_and_keeps_numbering() {
        let scenes = vec![scene("00:00"), scene("soon"), scene("00:12")];
        let schedule = plan_cuts("v", &scenes, 35.0);

        assert_eq!(schedule.skipped.len(), 1);
        assert_eq!(schedule.skipped[0].index, 2);
        assert!(matches!(schedule.skipped[0].reason, SkipReason::InvalidTimestamp(_)));

        assert_eq!(schedule.plans.len(), 2);
        assert_eq!(schedule.plans[0].end_secs, 11.5);
        assert_eq!(schedule.plans[1].file_name, "v-3.mp4");
    }

    #[test]
    fn test_plan_skips_collapsed_range() {
        let scenes = vec![scene("00:05"), scene("00:05.200")];
        let schedule = plan_cuts("v", &scenes, 10.0);

        assert_eq!(schedule.plans.len(), 1);
        assert_eq!(schedule.plans[0].index, 2);
        assert!(matches!(schedule.skipped[0].reason, SkipReason::EmptyRange { .. }));
    }

    #[test]
    fn test_skip_reason_shows_clock_times() {
        let reason = SkipReason::EmptyRange {
            start_secs: 65.0,
            end_secs: 64.5,
        };
        assert_eq!(reason.to_string(), "empty range 00:01:05..00:01:04.500");
    }

    #[test]
    fn test_invalid_scene_goes_to_invalid_dir() {
        let mut flagged = scene("00:00");
        flagged.other_texts = Flag::Yes;
        let schedule = plan_cuts("v", &[flagged], 10.0);

        let path = schedule.plans[0].output_path(Path::new("/data/cut"));
        assert_eq!(path, Path::new("/data/cut/invalid/v-1.mp4"));
    }
}
