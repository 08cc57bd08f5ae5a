//! Fixed-layout container codec.
//!
//! ```text
//! [0, 32)    salt
//! [32, 44)   nonce
//! [44, end)  ciphertext || 16-byte tag
//! ```
//!
//! There is no magic number and no version field; containers are recognised
//! by file name suffix only. Salt and nonce sizes are fixed, so everything
//! after the header is ciphertext and no length prefix is needed.

use crate::keys::{Nonce, Salt, NONCE_SIZE, SALT_SIZE};
use zcrypt_common::{Error, Result};

/// Size of the fixed header (salt + nonce).
pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE;

/// A parsed container. Borrows the ciphertext from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container<'a> {
    pub salt: Salt,
    pub nonce: Nonce,
    pub ciphertext: &'a [u8],
}

impl<'a> Container<'a> {
    pub fn new(salt: Salt, nonce: Nonce, ciphertext: &'a [u8]) -> Self {
        Self {
            salt,
            nonce,
            ciphertext,
        }
    }

    /// Concatenate `salt || nonce || ciphertext`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(self.salt.as_bytes());
        out.extend_from_slice(self.nonce.as_bytes());
        out.extend_from_slice(self.ciphertext);
        out
    }

    /// Slice a container at its fixed offsets.
    ///
    /// # Errors
    /// - `Error::MalformedContainer` if `bytes` is shorter than [`HEADER_SIZE`]
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::MalformedContainer {
                len: bytes.len(),
                min: HEADER_SIZE,
            });
        }

        let (salt, rest) = bytes.split_at(SALT_SIZE);
        let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

        let mut salt_bytes = [0u8; SALT_SIZE];
        salt_bytes.copy_from_slice(salt);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);

        Ok(Self {
            salt: Salt::from_bytes(salt_bytes),
            nonce: Nonce::from_bytes(nonce_bytes),
            ciphertext,
        })
    }
}
