use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;
mod prompts;

use mrmsbuild_lib::consts::DEFAULT_CONFIG_FILE;

/// mrmsbuild - MRMS distribution build orchestrator
#[derive(Parser)]
#[command(name = "mrmsbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the full build pipeline
  Build {
    /// Path to the configuration file
    #[arg(default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Answer every question with its default (non-interactive)
    #[arg(short, long)]
    batch: bool,

    /// Install target directory (skips the target menu)
    #[arg(short, long)]
    target: Option<PathBuf>,
  },

  /// Resolve the configuration and show what would be built
  Plan {
    /// Path to the configuration file
    #[arg(default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Answer every question with its default (non-interactive)
    #[arg(short, long)]
    batch: bool,
  },

  /// Show operator, host and build capacity
  Info {
    /// Emit machine-readable JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt().with_env_filter(filter).without_time().init();

  match cli.command {
    Commands::Build { config, batch, target } => cmd::cmd_build(&config, batch, target),
    Commands::Plan { config, batch } => cmd::cmd_plan(&config, batch),
    Commands::Info { json } => cmd::cmd_info(json),
  }
}
