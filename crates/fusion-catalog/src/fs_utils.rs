//! Filesystem helpers for idempotent, crash-safe writes.
//!
//! Every artifact is first written to a `.tmp` sibling and then renamed into
//! place, so an interrupted run never leaves a half-written clip or table
//! under its final name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// What happened to one materialization copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The file was copied in this run
    Copied,
    /// The destination already existed; nothing was written
    AlreadyPresent,
    /// Another clip with the same pair owns this destination
    SharedDestination,
    /// The copy failed; the mapping entry is kept regardless
    Failed(String),
}

impl CopyOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, CopyOutcome::Failed(_))
    }
}

/// Final path component of a clip name, or the name itself if it has none.
pub fn base_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `contents` via a temporary sibling and a rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

/// Copy `src` to `dst` unless `dst` already exists.
///
/// Never overwrites. Errors are folded into [`CopyOutcome::Failed`] so one
/// bad clip cannot stop the others.
pub fn copy_if_absent(src: &Path, dst: &Path) -> CopyOutcome {
    if dst.exists() {
        debug!(destination = %dst.display(), "Destination already present, skipping copy");
        return CopyOutcome::AlreadyPresent;
    }

    match copy_via_tmp(src, dst) {
        Ok(()) => {
            debug!(source = %src.display(), destination = %dst.display(), "Copied clip");
            CopyOutcome::Copied
        }
        Err(e) => {
            warn!(
                source = %src.display(),
                destination = %dst.display(),
                error = %e,
                "Failed to copy clip"
            );
            CopyOutcome::Failed(e.to_string())
        }
    }
}

fn copy_via_tmp(src: &Path, dst: &Path) -> io::Result<()> {
    let tmp = tmp_path(dst);
    fs::copy(src, &tmp)?;
    fs::rename(&tmp, dst).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("static/chan/cut/x-1.mp4"), "x-1.mp4");
        assert_eq!(base_name("x-1.mp4"), "x-1.mp4");
    }

    #[test]
    fn test_copy_if_absent_copies_then_skips() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("x-1.mp4");
        let dst = dir.path().join("001_002.mp4");
        fs::write(&src, b"clip").unwrap();

        assert_eq!(copy_if_absent(&src, &dst), CopyOutcome::Copied);
        assert_eq!(fs::read(&dst).unwrap(), b"clip");
        assert!(!dir.path().join("001_002.mp4.tmp").exists());

        fs::write(&src, b"changed").unwrap();
        assert_eq!(copy_if_absent(&src, &dst), CopyOutcome::AlreadyPresent);
        assert_eq!(fs::read(&dst).unwrap(), b"clip");
    }

    #[test]
    fn test_copy_missing_source_fails_without_destination() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("001_002.mp4");

        let outcome = copy_if_absent(&dir.path().join("missing.mp4"), &dst);
        assert!(outcome.is_failed());
        assert!(!dst.exists());
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("MAPPING.json");

        write_atomic(&path, b"{}").unwrap();
        write_atomic(&path, b"{\"a\": 1}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\": 1}");
        assert!(!dir.path().join("nested").join("MAPPING.json.tmp").exists());
    }
}
