//! Input reclamation after a successful task
//!
//! Localized task inputs are frequently symlinks into a shared cache. Once a
//! step has succeeded, the real file behind each link and the link itself can
//! be removed to free disk for the next step.

use crate::errors::Result;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What a reclamation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReclaimSummary {
    /// Nothing was touched because reclamation was disabled or the step failed
    pub skipped: bool,
    pub targets_removed: Vec<PathBuf>,
    pub links_removed: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

/// Delete inputs, and the files they link to, if the previous step succeeded
pub fn reclaim_inputs<P: AsRef<Path>>(
    enabled: bool,
    previous_exit_code: i32,
    paths: &[P],
) -> Result<ReclaimSummary> {
    let mut summary = ReclaimSummary::default();
    if !enabled || previous_exit_code != 0 {
        tracing::debug!(
            target: "jvmbudget",
            enabled,
            previous_exit_code,
            "input reclamation skipped"
        );
        summary.skipped = true;
        return Ok(summary);
    }

    for path in paths {
        reclaim_one(path.as_ref(), &mut summary)?;
    }

    tracing::info!(
        target: "jvmbudget",
        targets = summary.targets_removed.len(),
        links = summary.links_removed.len(),
        missing = summary.missing.len(),
        "reclaimed task inputs"
    );
    Ok(summary)
}

fn reclaim_one(path: &Path, summary: &mut ReclaimSummary) -> Result<()> {
    let is_link = match fs::symlink_metadata(path) {
        Ok(meta) => meta.file_type().is_symlink(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            summary.missing.push(path.to_path_buf());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // A dangling link has no target left to remove.
    match fs::canonicalize(path) {
        Ok(target) => {
            remove_path(&target)?;
            tracing::debug!(target: "jvmbudget", path = %target.display(), "removed input target");
            summary.targets_removed.push(target);
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            summary.missing.push(path.to_path_buf());
        }
        Err(e) => return Err(e.into()),
    }

    if is_link {
        fs::remove_file(path)?;
        tracing::debug!(target: "jvmbudget", path = %path.display(), "removed input link");
        summary.links_removed.push(path.to_path_buf());
    }

    Ok(())
}

fn remove_path(path: &Path) -> io::Result<()> {
    if fs::metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("input.bam");
        fs::write(&file, b"reads").unwrap();

        let summary = reclaim_inputs(false, 0, &[&file]).unwrap();
        assert!(summary.skipped);
        assert!(file.exists());
    }

    #[test]
    fn test_failed_step_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("input.bam");
        fs::write(&file, b"reads").unwrap();

        let summary = reclaim_inputs(true, 1, &[&file]).unwrap();
        assert!(summary.skipped);
        assert!(file.exists());
    }

    #[test]
    fn test_plain_file_removed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("input.bam");
        fs::write(&file, b"reads").unwrap();

        let summary = reclaim_inputs(true, 0, &[&file]).unwrap();
        assert!(!summary.skipped);
        assert!(!file.exists());
        assert_eq!(summary.targets_removed.len(), 1);
        assert!(summary.links_removed.is_empty());
    }

    #[test]
    fn test_missing_path_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.bam");

        let summary = reclaim_inputs(true, 0, &[&missing]).unwrap();
        assert_eq!(summary.missing, vec![missing]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_and_target_removed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cache.bam");
        let link = dir.path().join("input.bam");
        fs::write(&target, b"reads").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let summary = reclaim_inputs(true, 0, &[&link]).unwrap();
        assert!(!target.exists());
        assert!(fs::symlink_metadata(&link).is_err());
        assert_eq!(summary.links_removed, vec![link]);
        assert_eq!(summary.targets_removed.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_removed() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("input.bam");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), &link).unwrap();

        let summary = reclaim_inputs(true, 0, &[&link]).unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
        assert_eq!(summary.missing, vec![link.clone()]);
        assert_eq!(summary.links_removed, vec![link]);
    }
}
