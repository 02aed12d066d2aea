//! pbiship - Power BI report deployment
//!
//! Usage:
//!   pbiship deploy <MANIFEST> <PROFILE> <ENVIRONMENT>     # Deploy one environment
//!   pbiship deploy ... --what-if                         # Preview without uploading
//!   pbiship discover <MANIFEST> <PROFILE> <ENVIRONMENT>   # List resolved artifacts
//!   pbiship info                                         # Show settings

mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use pbiship_core::commands::{DeployCommand, DeployOptions, DiscoverCommand, DiscoverOptions};
use pbiship_core::config::Settings;

#[derive(Parser)]
#[command(name = "pbiship")]
#[command(version, about = "Deploy Power BI reports to workspaces", long_about = None)]
struct Cli {
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy every artifact of one environment
    Deploy(DeployArgs),

    /// Resolve artifacts, names and workspaces without contacting the service
    Discover {
        #[command(flatten)]
        target: TargetArgs,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show recognized environment variables and their current values
    Info {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Manifest file (.json or .toml)
    manifest: PathBuf,
    /// Deployment profile label
    profile: String,
    /// Environment name
    environment: String,
    /// Folder the source pattern is evaluated against (defaults to the manifest's folder)
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,
}

#[derive(Args)]
struct DeployArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Log what would be deployed without compiling or uploading
    #[arg(long)]
    what_if: bool,

    /// Keep deploying after an artifact fails (overrides the manifest)
    #[arg(long, conflicts_with = "fail_fast")]
    continue_on_error: bool,

    /// Stop at the first failing artifact (overrides the manifest)
    #[arg(long)]
    fail_fast: bool,

    /// Maximum seconds to wait for one import
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = logging::init(cli.verbose);

    match run(cli.command, verbosity).await {
        Ok(code) => code,
        Err(err) => {
            output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, verbosity: logging::ReloadControl) -> Result<ExitCode> {
    match command {
        Commands::Deploy(args) => run_deploy(args, verbosity).await,
        Commands::Discover { target, format } => run_discover(target, format),
        Commands::Info { format } => run_info(format),
    }
}

async fn run_deploy(args: DeployArgs, verbosity: logging::ReloadControl) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling deployment");
            trigger.cancel();
        }
    });

    let command = DeployCommand::with_defaults()?
        .with_verbosity_control(Arc::new(verbosity))
        .with_cancellation(cancel);

    let mut options = DeployOptions::new(
        args.target.manifest,
        args.target.profile,
        args.target.environment,
    )
    .with_what_if(args.what_if);
    if let Some(base_dir) = args.target.base_dir {
        options = options.with_base_dir(base_dir);
    }
    if args.continue_on_error {
        options = options.with_continue_on_error(true);
    } else if args.fail_fast {
        options = options.with_continue_on_error(false);
    }
    if let Some(secs) = args.timeout {
        options = options.with_poll_timeout(Duration::from_secs(secs));
    }

    let report = command.execute(&options).await?;
    match args.format {
        OutputFormat::Table => output::print_deploy_table(&report),
        OutputFormat::Json => output::print_json(&report)?,
    }

    report.ensure_success()?;
    Ok(ExitCode::SUCCESS)
}

fn run_discover(target: TargetArgs, format: OutputFormat) -> Result<ExitCode> {
    let command = DiscoverCommand::with_defaults()?;
    let mut options = DiscoverOptions::new(target.manifest, target.profile, target.environment);
    if let Some(base_dir) = target.base_dir {
        options = options.with_base_dir(base_dir);
    }

    let report = command.execute(&options)?;
    match format {
        OutputFormat::Table => output::print_discover_table(&report),
        OutputFormat::Json => output::print_json(&report)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn run_info(format: OutputFormat) -> Result<ExitCode> {
    let settings = Settings::from_env()?;
    match format {
        OutputFormat::Table => output::print_info_table(&settings),
        OutputFormat::Json => output::print_info_json(&settings)?,
    }
    Ok(ExitCode::SUCCESS)
}
