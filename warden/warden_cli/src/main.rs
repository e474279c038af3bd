use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use warden_core::LogLevel;

mod commands;

use commands::{check, rules, validate};

/// Warden Command Line Interface
///
/// Evaluates authorization requests against RBAC and ABAC policy files.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Log level; overrides the configuration file. `RUST_LOG` wins over both.
    #[clap(long, global = true)]
    log_level: Option<LogLevel>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide on one request. Exits 0 on ALLOW and 1 on DENY
    Check(check::CheckArgs),

    /// Validate a bundle of RBAC objects
    Validate(validate::ValidateArgs),

    /// List the RBAC rules granted to a user
    Rules(rules::RulesArgs),
}

/// Exit code for failures that prevented a decision.
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Check(args) => {
            let config = commands::load_config(&args.config)?;
            init_logging(cli.log_level.unwrap_or(config.log_level));
            check::execute(&args, &config)
        }
        Commands::Validate(args) => {
            init_logging(cli.log_level.unwrap_or_default());
            validate::execute(&args)
        }
        Commands::Rules(args) => {
            let config = commands::load_config(&args.config)?;
            init_logging(cli.log_level.unwrap_or(config.log_level));
            rules::execute(&args, &config)
        }
    }
}

/// Install a stderr subscriber filtered at `level` unless `RUST_LOG` is set.
fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
