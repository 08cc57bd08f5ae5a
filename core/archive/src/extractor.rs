//! Unpack a zip archive under a destination root.
//!
//! Extraction runs in two passes. The first pass normalizes every entry name
//! and checks it against the destination root; nothing touches the
//! filesystem until every entry has passed. The second pass writes.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;
use zip::ZipArchive;

use crate::entry::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, MODE_MASK};
use crate::path::{contained_path, normalize_entry_name};
use zcrypt_common::{Error, Result};

/// What an extraction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Name of the archive's single top-level directory.
    pub root_name: String,
    /// Absolute path of that directory under the destination root.
    pub root_path: PathBuf,
    /// Stored mode of the top-level directory. Not applied by extraction;
    /// see [`ExtractSummary::apply_root_mode`].
    pub root_mode: Option<u32>,
    pub directories: usize,
    pub files: usize,
}

impl ExtractSummary {
    /// Apply the archived top-level directory mode to `root`, the directory's
    /// final location.
    ///
    /// Extraction leaves the top-level directory writable so it can still be
    /// renamed to another parent. Call this once it is in place.
    pub fn apply_root_mode(&self, root: &Path) -> Result<()> {
        match self.root_mode {
            Some(mode) => set_mode(root, mode),
            None => Ok(()),
        }
    }
}

/// Upper bound on the buffer reserved up front for one file.
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

struct PlannedEntry {
    index: usize,
    target: PathBuf,
    depth: usize,
    is_directory: bool,
    mode: u32,
}

/// Extract `archive` under `dest_root`.
///
/// `dest_root` must exist. The archive must hold exactly one top-level
/// directory; every other entry must live beneath it.
///
/// # Errors
/// - `Error::PathSecurity` if any entry would resolve outside `dest_root`.
///   Raised before anything is written.
/// - `Error::Archive` if the bytes are not a zip archive or do not have a
///   single top-level directory
/// - `Error::Io` on write failures
pub fn extract_archive(archive: &[u8], dest_root: &Path) -> Result<ExtractSummary> {
    let root = fs::canonicalize(dest_root)?;
    let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(invalid_archive)?;

    let (plan, root_name) = plan_entries(&mut zip, &root)?;

    let mut directories = 0;
    let mut files = 0;
    for entry in &plan {
        if entry.is_directory {
            fs::create_dir_all(&entry.target)?;
            ensure_within(&root, &entry.target)?;
            directories += 1;
            debug!(path = %entry.target.display(), "Created directory");
            continue;
        }

        if let Some(parent) = entry.target.parent() {
            fs::create_dir_all(parent)?;
            ensure_within(&root, parent)?;
        }

        let mut file = zip.by_index(entry.index).map_err(invalid_archive)?;
        let mut contents = Zeroizing::new(Vec::with_capacity(capacity_hint(file.size())));
        file.read_to_end(&mut contents).map_err(invalid_archive)?;
        drop(file);

        fs::write(&entry.target, contents.as_slice())?;
        set_mode(&entry.target, entry.mode)?;
        files += 1;
        debug!(path = %entry.target.display(), size = contents.len(), "Wrote file");
    }

    // Directory modes go on last, deepest first, so a read-only directory
    // does not block writes into it. The top-level mode is left to the caller.
    let mut dirs: Vec<&PlannedEntry> = plan
        .iter()
        .filter(|e| e.is_directory && e.depth > 1)
        .collect();
    dirs.sort_by(|a, b| b.depth.cmp(&a.depth));
    for dir in dirs {
        set_mode(&dir.target, dir.mode)?;
    }
    let root_mode = plan
        .iter()
        .find(|e| e.is_directory && e.depth == 1)
        .map(|e| e.mode);

    Ok(ExtractSummary {
        root_path: root.join(&root_name),
        root_name,
        root_mode,
        directories,
        files,
    })
}

fn plan_entries(
    zip: &mut ZipArchive<Cursor<&[u8]>>,
    root: &Path,
) -> Result<(Vec<PlannedEntry>, String)> {
    if zip.len() == 0 {
        return Err(Error::Archive("archive is empty".to_string()));
    }

    let mut plan = Vec::with_capacity(zip.len());
    let mut top: Option<String> = None;

    for index in 0..zip.len() {
        let file = zip.by_index(index).map_err(invalid_archive)?;
        let name = file.name().to_string();
        let is_directory = file.is_dir();
        let stored_mode = file.unix_mode();
        drop(file);

        let components = normalize_entry_name(&name)?;
        let target = contained_path(root, &components)?;

        if components.len() == 1 && !is_directory {
            return Err(Error::Archive(format!(
                "{:?} is a file at the archive top level",
                name
            )));
        }
        match &top {
            None => top = Some(components[0].clone()),
            Some(existing) if *existing != components[0] => {
                return Err(Error::Archive(format!(
                    "archive has more than one top-level directory ({:?} and {:?})",
                    existing, components[0]
                )));
            }
            Some(_) => {}
        }

        let default_mode = if is_directory {
            DEFAULT_DIR_MODE
        } else {
            DEFAULT_FILE_MODE
        };
        plan.push(PlannedEntry {
            index,
            depth: components.len(),
            target,
            is_directory,
            mode: stored_mode.map_or(default_mode, |m| m & MODE_MASK),
        });
    }

    let root_name = top.ok_or_else(|| Error::Archive("archive is empty".to_string()))?;
    Ok((plan, root_name))
}

// Sizes come from the archive's own headers and are only trusted up to a cap.
fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOCATION, |n| n.min(MAX_PREALLOCATION))
}

// The archive lives in memory, so reader failures are format errors.
fn invalid_archive(err: impl std::fmt::Display) -> Error {
    Error::Archive(err.to_string())
}

// Re-check containment against the real filesystem once a path exists.
fn ensure_within(root: &Path, path: &Path) -> Result<()> {
    let canonical = fs::canonicalize(path)?;
    if !canonical.starts_with(root) {
        return Err(Error::PathSecurity(format!(
            "{} resolves outside {}",
            canonical.display(),
            root.display()
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
