//! The `validate` command

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use warden_policy::PolicyBundle;

/// Arguments for the validate command
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to a JSON bundle of RBAC objects
    #[clap(long)]
    pub file: PathBuf,
}

/// Implementation of the validate command
pub fn execute(args: &ValidateArgs) -> Result<ExitCode> {
    let bundle = PolicyBundle::from_file(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let invalid = bundle.validate();
    if invalid.is_empty() {
        println!("valid");
        return Ok(ExitCode::SUCCESS);
    }

    for (object, errors) in &invalid {
        for error in errors.as_slice() {
            println!("{}: {}", object, error);
        }
    }

    Ok(ExitCode::FAILURE)
}
