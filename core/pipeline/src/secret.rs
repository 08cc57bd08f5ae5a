//! Password collection seam.
//!
//! The pipeline never reads a terminal. Front ends hand it a
//! [`SecretSource`] and the orchestrator asks for the password only after the
//! input path has been validated.

use zcrypt_common::{Result, SecretBytes};

/// Why a password is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPurpose {
    /// Sealing a new container. Interactive sources should confirm the entry.
    Encrypt,
    /// Opening an existing container.
    Decrypt,
}

/// Supplies password bytes to the pipeline.
pub trait SecretSource {
    /// Produce the password. The returned buffer is owned by the caller and
    /// wiped when dropped.
    fn collect(&mut self, purpose: SecretPurpose) -> Result<SecretBytes>;
}

/// A password that is already known, e.g. read by an embedding application.
impl SecretSource for SecretBytes {
    fn collect(&mut self, _purpose: SecretPurpose) -> Result<SecretBytes> {
        Ok(self.clone())
    }
}
