//! FFmpeg CLI wrapper for cutting fusion scenes into clips.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Timeout support via tokio
//! - Source video probing
//! - Cut planning from model timestamps and clip extraction

pub mod command;
pub mod cut;
pub mod error;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use cut::{
    clip_file_name, cut_clip, plan_cuts, CutPlan, CutSchedule, SkipReason, SkippedScene,
    CLIP_EXTENSION, INVALID_DIR, SHORT_VIDEO_SECS,
};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_duration, probe_video, VideoInfo};
pub use progress::FfmpegProgress;
