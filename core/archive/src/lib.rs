//! Directory archiving for zcrypt.
//!
//! This module provides:
//! - Packing a directory tree into zip bytes rooted at the directory's name
//! - Extracting those bytes with destination-root containment checks
//!
//! # Security
//! - Every entry name is normalized and checked before anything is written
//! - Symbolic links are never archived and never created
//! - Archive and file contents are wiped from memory after use

pub mod builder;
pub mod entry;
pub mod extractor;
pub mod path;

pub use builder::{collect_entries, pack_directory, write_archive};
pub use entry::ArchiveEntry;
pub use extractor::{extract_archive, ExtractSummary};

use zcrypt_common::Error;

pub(crate) fn zip_error(err: zip::result::ZipError) -> Error {
    match err {
        zip::result::ZipError::Io(e) => Error::Io(e),
        other => Error::Archive(other.to_string()),
    }
}
