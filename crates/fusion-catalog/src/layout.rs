//! On-disk layout of one channel.

use std::io;
use std::path::{Path, PathBuf};

/// Paths of every stage's inputs and outputs for one channel.
///
/// ```text
/// {root}/{channel}/src/                   source videos
/// {root}/{channel}/json/{v}-result.json   analysis documents
/// {root}/{channel}/cut/{v}-{n}.mp4        cut clips
/// {root}/{channel}/final/{v}-final.json   final documents
/// {root}/{channel}/FUSION.json            merged scenes
/// {root}/{channel}/CHARACTERS.csv         character table
/// {root}/{channel}/CHARACTERS_FINAL.csv   report table
/// {root}/{channel}/FUSION/                delivery directory
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    channel: String,
    root: PathBuf,
}

impl ChannelLayout {
    pub fn new(data_dir: impl AsRef<Path>, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        let root = data_dir.as_ref().join(&channel);
        Self { channel, root }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.root.join("json")
    }

    pub fn cut_dir(&self) -> PathBuf {
        self.root.join("cut")
    }

    pub fn final_dir(&self) -> PathBuf {
        self.root.join("final")
    }

    pub fn delivery_dir(&self) -> PathBuf {
        self.root.join("FUSION")
    }

    pub fn merged_path(&self) -> PathBuf {
        self.root.join("FUSION.json")
    }

    pub fn characters_path(&self) -> PathBuf {
        self.root.join("CHARACTERS.csv")
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join("CHARACTERS_FINAL.csv")
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.delivery_dir().join("MAPPING.json")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join("RUN_SUMMARY.json")
    }

    pub fn analysis_path(&self, video_stem: &str) -> PathBuf {
        self.analysis_dir().join(format!("{}-result.json", video_stem))
    }

    pub fn final_path(&self, video_stem: &str) -> PathBuf {
        self.final_dir().join(format!("{}-final.json", video_stem))
    }

    /// Create every directory of the layout. Idempotent.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.source_dir(),
            self.analysis_dir(),
            self.cut_dir(),
            self.final_dir(),
            self.delivery_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = ChannelLayout::new("static", "wildfusionai");

        assert_eq!(layout.cut_dir(), Path::new("static/wildfusionai/cut"));
        assert_eq!(
            layout.final_path("7301"),
            Path::new("static/wildfusionai/final/7301-final.json")
        );
        assert_eq!(
            layout.mapping_path(),
            Path::new("static/wildfusionai/FUSION/MAPPING.json")
        );
    }

    #[test]
    fn test_ensure_dirs_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let layout = ChannelLayout::new(dir.path(), "chan");

        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();

        assert!(layout.final_dir().is_dir());
        assert!(layout.delivery_dir().is_dir());
    }
}
