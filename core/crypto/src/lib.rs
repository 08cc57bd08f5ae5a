//! Cryptographic primitives for zcrypt.
//!
//! This module provides:
//! - Key derivation using scrypt
//! - Authenticated encryption using AES-256-GCM
//! - The `salt | nonce | ciphertext` container codec
//! - Key types with automatic zeroization
//!
//! # Security Guarantees
//! - Derived keys are zeroized on drop
//! - Decrypted plaintext is returned in a zeroizing buffer
//! - Authentication failures are never classified by cause

pub mod aead;
pub mod container;
pub mod kdf;
pub mod keys;

pub use aead::{open, seal, TAG_SIZE};
pub use container::{Container, HEADER_SIZE};
pub use kdf::{derive_key, DerivationConfig};
pub use keys::{DerivedKey, Nonce, Salt, KEY_LENGTH, NONCE_SIZE, SALT_SIZE};
