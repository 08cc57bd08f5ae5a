//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use zcrypt_crypto::DerivationConfig;

/// File name suffix that marks a container.
pub const CONTAINER_SUFFIX: &str = ".zip.enc";

/// Settings for one orchestrator.
///
/// Containers do not record their derivation parameters, so a container can
/// only be opened with the profile it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Key derivation profile.
    pub derivation: DerivationConfig,
    /// Container file name suffix.
    pub suffix: String,
}

impl PipelineConfig {
    /// Replace the derivation profile.
    pub fn with_derivation(mut self, derivation: DerivationConfig) -> Self {
        self.derivation = derivation;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            derivation: DerivationConfig::standard(),
            suffix: CONTAINER_SUFFIX.to_string(),
        }
    }
}
