//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use fusion_catalog::DEFAULT_FUZZY_THRESHOLD;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Root of all channel directories
    pub data_dir: PathBuf,
    /// Fuzzy entity match threshold (0..=100)
    pub fuzzy_threshold: f64,
    /// Threads copying paired clips into the delivery directory
    pub copy_parallelism: usize,
    /// Maximum concurrent FFmpeg processes while cutting
    pub max_ffmpeg_processes: usize,
    /// Timeout of a single FFmpeg invocation
    pub cut_timeout: Duration,
    /// Skip the cut stage and only post-process existing clips
    pub skip_cut: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("static"),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            copy_parallelism: 4,
            max_ffmpeg_processes: 2,
            cut_timeout: Duration::from_secs(600),
            skip_cut: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("FUSION_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            fuzzy_threshold: std::env::var("FUSION_FUZZY_THRESHOLD")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|t| t.is_finite())
                .map(|t| t.clamp(0.0, 100.0))
                .unwrap_or(defaults.fuzzy_threshold),
            copy_parallelism: std::env::var("FUSION_COPY_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.copy_parallelism),
            max_ffmpeg_processes: std::env::var("FUSION_MAX_FFMPEG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_ffmpeg_processes),
            cut_timeout: std::env::var("FUSION_CUT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cut_timeout),
            skip_cut: std::env::var("FUSION_SKIP_CUT")
                .ok()
                .map(|s| parse_flag(&s))
                .unwrap_or(defaults.skip_cut),
        }
    }

    /// Reject values no run can work with.
    pub fn validate(&self) -> WorkerResult<()> {
        if !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(WorkerError::config_error(format!(
                "fuzzy threshold {} is outside 0..=100",
                self.fuzzy_threshold
            )));
        }
        if self.copy_parallelism == 0 {
            return Err(WorkerError::config_error("copy parallelism must be at least 1"));
        }
        if self.max_ffmpeg_processes == 0 {
            return Err(WorkerError::config_error("max ffmpeg processes must be at least 1"));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "FUSION_DATA_DIR",
        "FUSION_FUZZY_THRESHOLD",
        "FUSION_COPY_PARALLEL",
        "FUSION_MAX_FFMPEG",
        "FUSION_CUT_TIMEOUT",
        "FUSION_SKIP_CUT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        assert_eq!(WorkerConfig::from_env(), WorkerConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("FUSION_DATA_DIR", "/data");
        std::env::set_var("FUSION_FUZZY_THRESHOLD", "85");
        std::env::set_var("FUSION_COPY_PARALLEL", "8");
        std::env::set_var("FUSION_SKIP_CUT", "true");

        let config = WorkerConfig::from_env();
        clear_env();

        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(config.fuzzy_threshold, 85.0);
        assert_eq!(config.copy_parallelism, 8);
        assert!(config.skip_cut);
        assert_eq!(config.max_ffmpeg_processes, 2);
    }

    #[test]
    #[serial]
    fn test_threshold_clamped_and_garbage_ignored() {
        clear_env();
        std::env::set_var("FUSION_FUZZY_THRESHOLD", "140");
        std::env::set_var("FUSION_COPY_PARALLEL", "many");

        let config = WorkerConfig::from_env();
        clear_env();

        assert_eq!(config.fuzzy_threshold, 100.0);
        assert_eq!(config.copy_parallelism, 4);
    }

    #[test]
    fn test_validate_rejects_zero_parallelism() {
        let config = WorkerConfig {
            copy_parallelism: 0,
            ..WorkerConfig::default()
        };
        assert!(config.validate().unwrap_err().is_usage_error());
        assert!(WorkerConfig::default().validate().is_ok());
    }
}
