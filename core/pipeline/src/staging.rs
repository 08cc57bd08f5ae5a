//! Private staging directory for one pipeline run.
//!
//! The directory is created next to the real output so the final move is a
//! same-filesystem rename. It is removed when the run ends, whether the run
//! succeeded, failed, or unwound.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

use zcrypt_common::Result;

const STAGING_PREFIX: &str = ".zcrypt-staging-";

/// Temporary directory owned by a single pipeline invocation.
pub struct StagingDirectory {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl StagingDirectory {
    /// Create a staging directory in the same parent directory as `target`.
    pub fn beside(target: &Path) -> Result<Self> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Created staging directory");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Path of the staging directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything left in it, reporting failures.
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => remove(dir, &self.path).map_err(Into::into),
            None => Ok(()),
        }
    }
}

impl Drop for StagingDirectory {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = remove(dir, &self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staging directory");
            }
        }
    }
}

fn remove(dir: TempDir, path: &Path) -> io::Result<()> {
    if dir.close().is_ok() {
        debug!(path = %path.display(), "Removed staging directory");
        return Ok(());
    }

    // Extracted read-only directories block removal of their contents.
    make_writable(path);
    fs::remove_dir_all(path)?;
    debug!(path = %path.display(), "Removed staging directory");
    Ok(())
}

#[cfg(unix)]
fn make_writable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_dir() {
            let _ = fs::set_permissions(entry.path(), fs::Permissions::from_mode(0o700));
        }
    }
}

#[cfg(not(unix))]
fn make_writable(path: &Path) {
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if let Ok(metadata) = entry.metadata() {
            let mut perms = metadata.permissions();
            perms.set_readonly(false);
            let _ = fs::set_permissions(entry.path(), perms);
        }
    }
}
