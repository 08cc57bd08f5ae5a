//! Pipeline states.

use std::fmt;

/// Where an orchestrator run currently is.
///
/// Encrypt runs pass through `Building → KeyDeriving → Sealing →
/// ContainerWritten`; decrypt runs through `ContainerParsed → KeyDeriving →
/// Opening → Extracted`. Both end in `Cleaned` and then `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    InputValidated,
    PasswordCollected,
    Building,
    KeyDeriving,
    Sealing,
    ContainerWritten,
    ContainerParsed,
    Opening,
    Extracted,
    Cleaned,
    Done,
    Failed,
}

impl PipelineState {
    /// True once a run has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::InputValidated => "input-validated",
            PipelineState::PasswordCollected => "password-collected",
            PipelineState::Building => "building",
            PipelineState::KeyDeriving => "key-deriving",
            PipelineState::Sealing => "sealing",
            PipelineState::ContainerWritten => "container-written",
            PipelineState::ContainerParsed => "container-parsed",
            PipelineState::Opening => "opening",
            PipelineState::Extracted => "extracted",
            PipelineState::Cleaned => "cleaned",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}
