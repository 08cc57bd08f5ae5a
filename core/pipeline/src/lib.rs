//! Encrypt/decrypt orchestration for zcrypt.
//!
//! This crate ties the archive and crypto layers together. It validates the
//! input path, asks a [`SecretSource`] for the password, stages all output in
//! a private directory and moves the finished result into place.

pub mod config;
pub mod fs;
pub mod orchestrator;
pub mod secret;
pub mod staging;
pub mod state;

pub use config::{PipelineConfig, CONTAINER_SUFFIX};
pub use orchestrator::{Direction, Orchestrator, Outcome, Plan};
pub use secret::{SecretPurpose, SecretSource};
pub use staging::StagingDirectory;
pub use state::PipelineState;
