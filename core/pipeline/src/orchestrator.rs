//! Encrypt and decrypt pipelines.
//!
//! One [`Orchestrator::run`] call processes one input path start to finish:
//!
//! ```text
//! directory        -> pack -> derive -> seal -> write  -> <dir>.zip.enc
//! <name>.zip.enc   -> read -> derive -> open -> extract -> <name>/
//! ```
//!
//! All intermediate output goes into a [`StagingDirectory`] beside the real
//! destination and is renamed into place only after every stage succeeded.
//! The staging directory is removed on every exit path.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::fs::{rename_with_fallback, write_synced};
use crate::secret::{SecretPurpose, SecretSource};
use crate::staging::StagingDirectory;
use crate::state::PipelineState;
use zcrypt_archive::{extract_archive, pack_directory};
use zcrypt_common::{Error, Result};
use zcrypt_crypto::{derive_key, open, seal, Container, Nonce, Salt};

/// Which way a run transforms its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// A validated input, with the output it will produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Encrypt { source: PathBuf, output: PathBuf },
    Decrypt { container: PathBuf, output: PathBuf },
}

impl Plan {
    pub fn direction(&self) -> Direction {
        match self {
            Plan::Encrypt { .. } => Direction::Encrypt,
            Plan::Decrypt { .. } => Direction::Decrypt,
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            Plan::Encrypt { output, .. } | Plan::Decrypt { output, .. } => output,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub direction: Direction,
    pub output: PathBuf,
}

/// Drives one pipeline run at a time.
pub struct Orchestrator {
    config: PipelineConfig,
    state: PipelineState,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: PipelineState::Idle,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// State reached by the most recent run.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Validate `input` and decide what the run will produce.
    ///
    /// # Errors
    /// - `Error::Input` if `input` is missing, or is neither a directory nor a
    ///   file carrying the container suffix
    /// - `Error::OutputExists` if a decryption target is already present
    pub fn plan(&self, input: &Path) -> Result<Plan> {
        let metadata = fs::metadata(input).map_err(|e| {
            Error::Input(format!("cannot access {}: {}", input.display(), e))
        })?;

        if metadata.is_dir() {
            // Keep the name as given so a symlinked directory seals beside the
            // link, under the link's name. `.` and `..` have no name to keep.
            let source = match input.file_name() {
                Some(name) => absolute_parent(input)?.join(name),
                None => fs::canonicalize(input)?,
            };
            let name = source.file_name().ok_or_else(|| {
                Error::Input(format!("cannot encrypt {}", source.display()))
            })?;
            let mut file_name = OsString::from(name);
            file_name.push(&self.config.suffix);
            let output = source.with_file_name(file_name);
            return Ok(Plan::Encrypt { source, output });
        }

        let name = input.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let stem = match name.strip_suffix(self.config.suffix.as_str()) {
            Some(stem) if metadata.is_file() => stem,
            _ => {
                return Err(Error::Input(format!(
                    "{} is neither a directory nor a {} container",
                    input.display(),
                    self.config.suffix
                )))
            }
        };
        if stem.is_empty() {
            return Err(Error::Input(format!(
                "{} has no name before the {} suffix",
                input.display(),
                self.config.suffix
            )));
        }

        let container = absolute_parent(input)?.join(name);
        let output = container.with_file_name(stem);
        if fs::symlink_metadata(&output).is_ok() {
            return Err(Error::OutputExists(output));
        }

        Ok(Plan::Decrypt { container, output })
    }

    /// Run the pipeline selected by `input`.
    ///
    /// Input errors are reported before any state transition. Any later
    /// failure leaves nothing at the output location.
    pub fn run(&mut self, input: &Path, secrets: &mut dyn SecretSource) -> Result<Outcome> {
        self.state = PipelineState::Idle;
        let plan = self.plan(input)?;
        self.transition(PipelineState::InputValidated);

        let result = StagingDirectory::beside(plan.output()).and_then(|staging| {
            let result = match &plan {
                Plan::Encrypt { source, output } => {
                    self.encrypt(source, output, &staging, secrets)
                }
                Plan::Decrypt { container, output } => {
                    self.decrypt(container, output, &staging, secrets)
                }
            };
            if let Err(e) = staging.close() {
                warn!(error = %e, "Staging cleanup failed");
            }
            result
        });
        self.transition(PipelineState::Cleaned);

        match result {
            Ok(()) => {
                self.transition(PipelineState::Done);
                info!(output = %plan.output().display(), "{:?} complete", plan.direction());
                Ok(Outcome {
                    direction: plan.direction(),
                    output: plan.output().to_path_buf(),
                })
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                warn!(error = %e, "{:?} failed", plan.direction());
                Err(e)
            }
        }
    }

    fn encrypt(
        &mut self,
        source: &Path,
        output: &Path,
        staging: &StagingDirectory,
        secrets: &mut dyn SecretSource,
    ) -> Result<()> {
        let password = secrets.collect(SecretPurpose::Encrypt)?;
        self.transition(PipelineState::PasswordCollected);

        self.transition(PipelineState::Building);
        let archive = pack_directory(source)?;

        self.transition(PipelineState::KeyDeriving);
        let salt = Salt::generate();
        let key = derive_key(password.as_bytes(), &salt, &self.config.derivation)?;
        drop(password);

        self.transition(PipelineState::Sealing);
        let nonce = Nonce::generate();
        let ciphertext = seal(&key, &nonce, &archive)?;
        drop(key);
        drop(archive);

        let bytes = Container::new(salt, nonce, &ciphertext).serialize();
        let staged = staging.path().join(file_name(output)?);
        write_synced(&staged, &bytes)?;
        rename_with_fallback(&staged, output)?;
        self.transition(PipelineState::ContainerWritten);
        debug!(size = bytes.len(), "Container written");

        Ok(())
    }

    fn decrypt(
        &mut self,
        container: &Path,
        output: &Path,
        staging: &StagingDirectory,
        secrets: &mut dyn SecretSource,
    ) -> Result<()> {
        let password = secrets.collect(SecretPurpose::Decrypt)?;
        self.transition(PipelineState::PasswordCollected);

        let bytes = fs::read(container)?;
        let parsed = Container::parse(&bytes)?;
        self.transition(PipelineState::ContainerParsed);

        self.transition(PipelineState::KeyDeriving);
        let key = derive_key(password.as_bytes(), &parsed.salt, &self.config.derivation)?;
        drop(password);

        self.transition(PipelineState::Opening);
        let archive = open(&key, &parsed.nonce, parsed.ciphertext)?;
        drop(key);

        let extract_root = staging.path().join("extract");
        fs::create_dir(&extract_root)?;
        let summary = extract_archive(&archive, &extract_root)?;
        drop(archive);

        // Someone may have created the output while we were working.
        if fs::symlink_metadata(output).is_ok() {
            return Err(Error::OutputExists(output.to_path_buf()));
        }
        fs::rename(&summary.root_path, output)?;
        summary.apply_root_mode(output)?;
        self.transition(PipelineState::Extracted);
        debug!(
            directories = summary.directories,
            files = summary.files,
            archived_as = %summary.root_name,
            "Archive extracted"
        );

        Ok(())
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "Pipeline transition");
        self.state = next;
    }
}

fn absolute_parent(path: &Path) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok(fs::canonicalize(parent)?)
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| Error::Input(format!("{} has no file name", path.display())))
}
