//! Pack a directory tree into a zip archive.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;
use zeroize::Zeroizing;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::entry::{ArchiveEntry, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};
use crate::zip_error;
use zcrypt_common::{Error, Result};

/// Walk `root` and produce one entry per file and directory, root included.
///
/// Entries are in lexical walk order. Paths are relative to the parent of
/// `root`, so every path starts with the root directory's own name. Symbolic
/// links are skipped.
///
/// # Errors
/// - `Error::Input` if `root` has no final path component or a name is not
///   valid UTF-8
/// - `Error::Io` on any read failure; no partial result is returned
pub fn collect_entries(root: &Path) -> Result<Vec<ArchiveEntry>> {
    let base = match (root.parent(), root.file_name()) {
        (Some(parent), Some(_)) => parent,
        _ => {
            return Err(Error::Input(format!(
                "{} has no directory name to archive under",
                root.display()
            )))
        }
    };

    let mut entries = Vec::new();
    for item in WalkDir::new(root).sort_by_file_name() {
        let item = item.map_err(|e| Error::Io(e.into()))?;

        // The root itself may be a link to the directory being sealed.
        let metadata = if item.depth() == 0 {
            fs::metadata(item.path())?
        } else if item.file_type().is_symlink() {
            warn!(path = %item.path().display(), "Skipping symbolic link");
            continue;
        } else {
            item.metadata().map_err(|e| Error::Io(e.into()))?
        };
        let file_type = metadata.file_type();

        let name = entry_name(base, item.path())?;

        if file_type.is_dir() {
            debug!(entry = %name, "Packing directory");
            entries.push(ArchiveEntry::directory(
                name,
                mode_of(&metadata, DEFAULT_DIR_MODE),
            ));
        } else if file_type.is_file() {
            let contents = fs::read(item.path())?;
            debug!(entry = %name, size = contents.len(), "Packing file");
            entries.push(ArchiveEntry::file(
                name,
                mode_of(&metadata, DEFAULT_FILE_MODE),
                contents,
            ));
        } else {
            warn!(path = %item.path().display(), "Skipping special file");
        }
    }

    Ok(entries)
}

/// Serialize entries into zip bytes. Files are deflated, directories stored.
pub fn write_archive(entries: &[ArchiveEntry]) -> Result<Zeroizing<Vec<u8>>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in entries {
        let options = SimpleFileOptions::default().unix_permissions(entry.mode);
        match &entry.contents {
            None => {
                writer
                    .add_directory(entry.path.as_str(), options)
                    .map_err(zip_error)?;
            }
            Some(contents) => {
                let options = options.compression_method(CompressionMethod::Deflated);
                writer
                    .start_file(entry.path.as_str(), options)
                    .map_err(zip_error)?;
                writer.write_all(contents)?;
            }
        }
    }

    let cursor = writer.finish().map_err(zip_error)?;
    Ok(Zeroizing::new(cursor.into_inner()))
}

/// Collect and serialize the tree under `root`.
pub fn pack_directory(root: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let entries = collect_entries(root)?;
    let bytes = write_archive(&entries)?;
    debug!(entries = entries.len(), size = bytes.len(), "Archive built");
    Ok(bytes)
}

fn entry_name(base: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(base)
        .map_err(|_| Error::Input(format!("{} is outside {}", path.display(), base.display())))?;

    let mut parts = Vec::new();
    for comp in relative.components() {
        let part = comp.as_os_str().to_str().ok_or_else(|| {
            Error::Input(format!("{} is not valid UTF-8", path.display()))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata, _default: u32) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata, default: u32) -> u32 {
    default
}
