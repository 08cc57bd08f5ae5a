//! Filesystem helpers for moving staged output into place.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Write `bytes` to a new file and flush it to disk.
pub fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Atomically rename a staged file over `destination`.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination
/// already exists. In that case an existing regular file is removed and the
/// rename retried.
pub fn rename_with_fallback(staged: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(staged, destination) {
        let is_file = fs::symlink_metadata(destination)
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(initial_err);
        }

        fs::remove_file(destination)?;
        fs::rename(staged, destination).map_err(|retry_err| {
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}
