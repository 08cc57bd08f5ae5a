//! Key derivation using scrypt.
//!
//! scrypt is memory-hard: every derivation costs `128 * r * N` bytes of RAM
//! and a proportional amount of CPU. That cost is paid on every decryption
//! attempt and is the tool's only brute-force resistance.

use serde::{Deserialize, Serialize};

use crate::keys::{DerivedKey, Salt, KEY_LENGTH};
use zcrypt_common::{Error, Result};

/// Parameters for scrypt key derivation.
///
/// Containers do not record these values, so encryption and decryption must
/// use the same profile. Production code uses [`DerivationConfig::standard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationConfig {
    /// CPU/memory cost N. Must be a power of two greater than one.
    pub cost: u64,
    /// Block size r.
    pub block_size: u32,
    /// Parallelism p.
    pub parallelism: u32,
    /// Output key length in bytes. Must equal the cipher key size.
    pub key_length: usize,
}

impl DerivationConfig {
    /// N = 2^20, r = 8, p = 1: about 1 GiB of memory per derivation.
    pub const fn standard() -> Self {
        Self {
            cost: 1 << 20,
            block_size: 8,
            parallelism: 1,
            key_length: KEY_LENGTH,
        }
    }

    /// Create a custom profile with the cipher's key length.
    pub const fn new(cost: u64, block_size: u32, parallelism: u32) -> Self {
        Self {
            cost,
            block_size,
            parallelism,
            key_length: KEY_LENGTH,
        }
    }

    /// Validate and convert to scrypt's parameter type.
    fn to_scrypt_params(self) -> Result<scrypt::Params> {
        if self.cost < 2 || !self.cost.is_power_of_two() {
            return Err(Error::Configuration(format!(
                "scrypt cost must be a power of two greater than 1, got {}",
                self.cost
            )));
        }
        if self.block_size == 0 || self.parallelism == 0 {
            return Err(Error::Configuration(format!(
                "scrypt block size and parallelism must be positive, got r={} p={}",
                self.block_size, self.parallelism
            )));
        }
        if self.key_length != KEY_LENGTH {
            return Err(Error::Configuration(format!(
                "key length must be {} bytes, got {}",
                KEY_LENGTH, self.key_length
            )));
        }

        let log_n = self.cost.trailing_zeros() as u8;
        scrypt::Params::new(log_n, self.block_size, self.parallelism, self.key_length)
            .map_err(|e| Error::Configuration(format!("Invalid scrypt parameters: {}", e)))
    }
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derive a symmetric key from a password and salt using scrypt.
///
/// Empty passwords are accepted.
///
/// # Errors
/// - `Error::Configuration` if `config` is not a valid scrypt profile. This is
///   a programming error, never a condition to retry.
///
/// # Security
/// - The key is written straight into a zeroize-on-drop buffer
/// - The result is deterministic for a given password, salt and config
pub fn derive_key(password: &[u8], salt: &Salt, config: &DerivationConfig) -> Result<DerivedKey> {
    let params = config.to_scrypt_params()?;

    let mut key = DerivedKey::zeroed();
    scrypt::scrypt(password, salt.as_bytes(), &params, key.as_mut_bytes())
        .map_err(|e| Error::Configuration(format!("Key derivation failed: {}", e)))?;

    Ok(key)
}
