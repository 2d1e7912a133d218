//! FIR Assist control CLI
//!
//! A command-line tool for deploying and stopping the FIR Assist stack,
//! checking service status, and analyzing incident narratives.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, info, lifecycle, status};
use console_lib::{ControlPlane, LifecycleCommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// FIR Assist control CLI
#[derive(Parser)]
#[command(name = "firctl")]
#[command(author, version, about = "Control console for the FIR Assist stack", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to ~/.config/firctl/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Frontend base URL
    #[arg(long, global = true)]
    pub frontend_url: Option<String>,

    /// Directory holding the deployment descriptor
    #[arg(long, global = true)]
    pub deployment_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every service and show its status
    Status,

    /// Deploy (build and start) the stack
    Deploy,

    /// Stop the stack
    Stop,

    /// Analyze an incident narrative
    Analyze {
        /// Narrative text
        narrative: Option<String>,

        /// Use one of the sample narratives (1-based, see `samples`)
        #[arg(long, conflicts_with_all = ["narrative", "file"])]
        sample: Option<usize>,

        /// Read the narrative from a file ("-" for stdin)
        #[arg(long, conflicts_with = "narrative")]
        file: Option<PathBuf>,

        /// Only show recommendations at or above the confidence threshold
        #[arg(long)]
        above_threshold: bool,

        /// Skip the backend status check before submitting
        #[arg(long)]
        skip_status_check: bool,
    },

    /// List the sample narratives
    Samples,

    /// Show the effective settings
    Info,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = cli.format;
    let overrides = config::Overrides {
        backend_url: cli.backend_url,
        frontend_url: cli.frontend_url,
        deployment_dir: cli.deployment_dir,
    };
    let config_file = cli.config;
    let plane = || -> Result<ControlPlane> {
        let settings = config::load_settings(config_file.as_deref(), overrides.clone())?;
        ControlPlane::from_settings(settings)
    };

    match cli.command {
        Commands::Status => status::show_status(&plane()?, format).await?,
        Commands::Deploy => lifecycle::run(&plane()?, LifecycleCommand::Deploy, format).await?,
        Commands::Stop => lifecycle::run(&plane()?, LifecycleCommand::Stop, format).await?,
        Commands::Analyze {
            narrative,
            sample,
            file,
            above_threshold,
            skip_status_check,
        } => {
            let narrative = analyze::resolve_narrative(narrative, sample, file)?;
            let options = analyze::AnalyzeOptions {
                above_threshold,
                skip_status_check,
            };
            analyze::analyze(&plane()?, &narrative, options, format).await?;
        }
        // Samples need no settings or services
        Commands::Samples => analyze::list_samples(format)?,
        Commands::Info => info::show_info(&plane()?, format)?,
    }

    Ok(())
}
