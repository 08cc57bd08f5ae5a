//! Archive entry model.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default mode for files whose source carries no Unix permissions.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Default mode for directories whose source carries no Unix permissions.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Permission bits carried through an archive.
pub const MODE_MASK: u32 = 0o777;

/// One file or directory inside an archive.
///
/// `path` is `/`-separated and starts with the archive's top-level directory
/// name. Directory paths end with `/`. File contents are wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ArchiveEntry {
    pub path: String,
    pub is_directory: bool,
    pub mode: u32,
    pub contents: Option<Vec<u8>>,
}

impl ArchiveEntry {
    pub fn directory(path: impl Into<String>, mode: u32) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self {
            path,
            is_directory: true,
            mode: mode & MODE_MASK,
            contents: None,
        }
    }

    pub fn file(path: impl Into<String>, mode: u32, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            mode: mode & MODE_MASK,
            contents: Some(contents),
        }
    }

    /// Content length; zero for directories.
    pub fn size(&self) -> usize {
        self.contents.as_ref().map_or(0, Vec::len)
    }
}

impl fmt::Debug for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("path", &self.path)
            .field("is_directory", &self.is_directory)
            .field("mode", &format_args!("{:o}", self.mode))
            .field("size", &self.size())
            .finish()
    }
}
