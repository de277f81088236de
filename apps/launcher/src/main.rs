//! slashlaunch command-line entry point.

mod app;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slashlaunch",
    version,
    about = "Keeps Slashdiablo game installs patched and launches them"
)]
struct Cli {
    /// Configuration file to use instead of the per-user default.
    #[arg(long, global = true, env = "SLASHLAUNCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bring every configured install up to date.
    Patch,
    /// Check whether every install is up to date without changing anything.
    Validate,
    /// Start the configured number of instances and track them until they exit.
    Launch,
    /// Apply the data execution prevention fix to an install.
    Dep { path: PathBuf },
    /// Select the realm gateway and remember it.
    Gateway { name: String },
    /// List configured installs.
    Games,
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::config_path);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "starting slashlaunch"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(cli.command, config_path))
}
