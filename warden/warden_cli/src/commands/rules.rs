//! The `rules` command

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use warden_core::Context;
use warden_policy::{AuthorizationConfig, RbacAuthorizer};

/// Arguments for the rules command
#[derive(Args)]
pub struct RulesArgs {
    /// Path to the configuration file
    #[clap(long)]
    pub config: PathBuf,

    /// User to list rules for
    #[clap(long)]
    pub user: String,

    /// Group of the user; repeatable
    #[clap(long = "group")]
    pub groups: Vec<String>,

    /// Namespace; cluster-wide grants are always included
    #[clap(long, default_value = "")]
    pub namespace: String,

    /// Print the rules as JSON
    #[clap(long)]
    pub json: bool,
}

/// Implementation of the rules command
pub fn execute(args: &RulesArgs, config: &AuthorizationConfig) -> Result<ExitCode> {
    let store = super::load_store(config)?;
    let rbac = RbacAuthorizer::new(super::listers(&store));
    let user = super::user_info(&args.user, &args.groups);

    let mut ctx = Context::background();
    if let Some(timeout) = config.timeout() {
        ctx = ctx.child_with_timeout(timeout);
    }

    let resolution = rbac.rules_for(&ctx, &user, &args.namespace)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution.rules)?);
    } else if resolution.rules.is_empty() {
        println!("no rules");
    } else {
        for rule in &resolution.rules {
            println!("{}", rule);
        }
    }

    for error in &resolution.errors {
        eprintln!("warning: {}", error);
    }

    Ok(if resolution.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
