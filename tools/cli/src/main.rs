//! zcrypt CLI - encrypt a folder into a single container, or open one again.
//!
//! Pass a directory to produce `<dir>.zip.enc`; pass a `.zip.enc` file to
//! restore the directory next to it.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use zcrypt_common::{Error, SecretBytes};
use zcrypt_pipeline::{
    Direction, Orchestrator, PipelineConfig, SecretPurpose, SecretSource,
};

#[derive(Parser)]
#[command(name = "zcrypt")]
#[command(about = "zcrypt - Password-based folder encryption")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Directory to encrypt, or `.zip.enc` container to decrypt.
    path: PathBuf,
}

/// Reads the password from the controlling terminal without echo.
struct TerminalPrompt;

impl TerminalPrompt {
    fn read(prompt: &str) -> zcrypt_common::Result<Zeroizing<String>> {
        let password = rpassword::prompt_password(prompt)?;
        Ok(Zeroizing::new(password))
    }
}

impl SecretSource for TerminalPrompt {
    fn collect(&mut self, purpose: SecretPurpose) -> zcrypt_common::Result<SecretBytes> {
        let password = Self::read("Enter password: ")?;

        if purpose == SecretPurpose::Encrypt {
            let confirm = Self::read("Confirm password: ")?;
            check_confirmation(&password, &confirm)?;
        }

        Ok(SecretBytes::new(password.as_bytes().to_vec()))
    }
}

/// Empty passwords are allowed; only a mismatch is rejected.
fn check_confirmation(password: &str, confirm: &str) -> zcrypt_common::Result<()> {
    if password != confirm {
        return Err(Error::Input("Passwords do not match".to_string()));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut orchestrator = Orchestrator::new(PipelineConfig::default());
    let outcome = orchestrator
        .run(&cli.path, &mut TerminalPrompt)
        .with_context(|| format!("Failed to process {}", cli.path.display()))?;

    match outcome.direction {
        Direction::Encrypt => {
            println!("Encrypted to {}", outcome.output.display());
        }
        Direction::Decrypt => {
            println!("Decrypted to {}", outcome.output.display());
        }
    }

    Ok(())
}
