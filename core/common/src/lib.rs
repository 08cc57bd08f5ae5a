//! Common utilities and types shared across zcrypt crates.
//!
//! This crate holds the error taxonomy every pipeline stage reports into and
//! the secret buffer type used for passwords.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::SecretBytes;
