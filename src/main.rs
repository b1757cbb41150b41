use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::RunArgs;
use haul::config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(
    name = "haul",
    version,
    about = "Sequential multi-site game asset harvester",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format, overriding the configured one
    #[arg(long, global = true, value_parser = ["text", "json"])]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect every configured site in order
    Run {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// TOML configuration file (defaults to HAUL_* environment variables)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for snapshots and the final artifact
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pause between sites in seconds
        #[arg(long)]
        delay: Option<u64>,

        /// Per-site collection budget in seconds (0 = unlimited)
        #[arg(long)]
        site_timeout: Option<u64>,

        /// Only run the named site (repeatable)
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,
    },

    /// List the configured sites
    Sites {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the ranked report of a saved final artifact
    Report {
        /// Path to a final results artifact
        artifact: PathBuf,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Run { config, .. } | Commands::Sites { config } => config.as_deref(),
            Commands::Report { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::load(cli.command.config_path())?;
    config.validate().context("Invalid configuration")?;

    // Initialize tracing/logging
    setup_tracing(&config.logging, cli.log_format.as_deref(), cli.verbose)?;

    tracing::info!("haul starting");

    let status = match cli.command {
        Commands::Run {
            yes,
            config: config_path,
            output,
            delay,
            site_timeout,
            only,
        } => {
            tracing::info!(
                config = ?config_path,
                output = ?output,
                delay = ?delay,
                site_timeout = ?site_timeout,
                only = ?only,
                "Starting run command"
            );
            commands::run(
                config,
                RunArgs {
                    yes,
                    output,
                    delay,
                    site_timeout,
                    only,
                },
            )
            .await?
        }

        Commands::Sites { .. } => {
            commands::sites(&config)?;
            0
        }

        Commands::Report { artifact } => {
            commands::report(&artifact)?;
            0
        }
    };

    Ok(ExitCode::from(status))
}

fn setup_tracing(logging: &LoggingConfig, format: Option<&str>, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(logging.filter_directive(verbose))
        .context("Invalid log level")?;

    match format.unwrap_or(logging.format.as_str()) {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
