//! Common error types for zcrypt.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for zcrypt operations.
///
/// Every pipeline stage reports one of these; the orchestrator cleans up and
/// hands exactly one of them back to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Input path is missing, has the wrong type, or has the wrong suffix.
    #[error("Invalid input: {0}")]
    Input(String),

    /// The destination of a decryption already exists.
    #[error("Output already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Container is shorter than its fixed header.
    #[error("Malformed container: {len} bytes, expected at least {min}")]
    MalformedContainer { len: usize, min: usize },

    /// Wrong password, or the container was corrupted or tampered with.
    ///
    /// The two causes are never distinguished.
    #[error("Authentication failed: wrong password or corrupted container")]
    Authentication,

    /// An archive entry would land outside the extraction root.
    #[error("Unsafe archive entry: {0}")]
    PathSecurity(String),

    /// Decrypted payload is not a usable archive.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Invalid key derivation parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the user-input class of failures (bad path, existing output).
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Input(_) | Error::OutputExists(_))
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
