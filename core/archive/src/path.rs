//! Entry name normalization for extraction.
//!
//! # Invariants
//! - Output is always relative and never contains `.` or `..` components.
//! - `..` that would climb above the archive root is an error, not clamped.
//! - Absolute names, drive prefixes and NUL bytes are rejected.
//!
//! # Algorithm
//! - Treat `\` and `/` as separators and split into components.
//! - Drop empty and `.` components; `..` pops the previous component.

use std::path::{Component, Path, PathBuf};

use zcrypt_common::{Error, Result};

/// Normalize a stored entry name into components under the archive root.
///
/// Returns the normalized components in order. The result is never empty.
pub fn normalize_entry_name(name: &str) -> Result<Vec<String>> {
    if name.starts_with('/') || name.starts_with('\\') {
        return Err(unsafe_entry(name, "absolute path"));
    }
    if name.contains('\0') {
        return Err(unsafe_entry(name, "NUL byte in name"));
    }

    let mut stack: Vec<String> = Vec::new();
    for comp in name.split(|c: char| c == '/' || c == '\\') {
        match comp {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return Err(unsafe_entry(name, "escapes the destination root"));
                }
            }
            _ => {
                if !is_plain_component(comp) {
                    return Err(unsafe_entry(name, "invalid path component"));
                }
                stack.push(comp.to_string());
            }
        }
    }

    if stack.is_empty() {
        return Err(unsafe_entry(name, "empty path"));
    }
    Ok(stack)
}

/// Join normalized components onto `root` and verify containment.
pub fn contained_path(root: &Path, components: &[String]) -> Result<PathBuf> {
    let mut candidate = root.to_path_buf();
    for comp in components {
        candidate.push(comp);
    }

    if !candidate.starts_with(root) || candidate == root {
        return Err(Error::PathSecurity(format!(
            "{} resolves outside {}",
            candidate.display(),
            root.display()
        )));
    }
    Ok(candidate)
}

// A component must parse as exactly one normal path segment on this platform.
// Catches drive prefixes such as `C:` on Windows.
fn is_plain_component(comp: &str) -> bool {
    let mut parts = Path::new(comp).components();
    matches!(
        (parts.next(), parts.next()),
        (Some(Component::Normal(_)), None)
    ) && !is_drive_prefix(comp)
}

fn is_drive_prefix(comp: &str) -> bool {
    let bytes = comp.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn unsafe_entry(name: &str, reason: &str) -> Error {
    Error::PathSecurity(format!("{:?}: {}", name, reason))
}
