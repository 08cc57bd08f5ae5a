//! Authenticated encryption using AES-256-GCM.
//!
//! No associated data is bound. The 16-byte tag is appended to the
//! ciphertext by `seal` and verified by `open` before any plaintext is
//! released.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key};
use zeroize::Zeroizing;

use crate::keys::{DerivedKey, Nonce};
use zcrypt_common::{Error, Result};

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

fn cipher(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt plaintext, returning `ciphertext || tag`.
///
/// # Preconditions
/// - `nonce` has never been used with `key` (callers draw a fresh one with
///   [`Nonce::generate`])
///
/// # Postconditions
/// - Output length is `plaintext.len() + TAG_SIZE`
pub fn seal(key: &DerivedKey, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|_| Error::Configuration("AES-GCM refused the plaintext length".to_string()))
}

/// Decrypt and authenticate `ciphertext || tag`.
///
/// # Errors
/// - `Error::Authentication` for any failure: wrong key, modified ciphertext,
///   modified tag or truncated input all look the same to the caller.
pub fn open(key: &DerivedKey, nonce: &Nonce, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(Error::Authentication);
    }

    cipher(key)
        .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| Error::Authentication)
}
