//! Command-line tools for keybridge partition keys.
//!
//! Usage:
//! ```bash
//! keybridge key AAPL IBM                # Print keys for symbols
//! keybridge symbols --file symbols.txt  # Print keys in a symbol list
//! keybridge check IBM MSFT              # Exit non-zero if a symbol is unlisted
//! ```

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keybridge_core::Config;
use tracing::debug;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "keybridge", author, version, about)]
struct Cli {
    /// Config file to use instead of searching for keybridge.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the partition key of each symbol
    Key(commands::key::KeyArgs),

    /// Print the keys in a symbol list
    Symbols(commands::symbols::SymbolsArgs),

    /// Check symbols against a symbol list
    Check(commands::check::CheckArgs),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(_) => f.debug_tuple("Key").finish(),
            Self::Symbols(_) => f.debug_tuple("Symbols").finish(),
            Self::Check(_) => f.debug_tuple("Check").finish(),
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }

    let resolved = Config::load_resolved().context("failed to resolve keybridge.toml")?;
    Ok(resolved.unwrap_or_default())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    keybridge::init_logging(&config.logging).context("failed to initialize logging")?;
    debug!(command = ?cli.command, "Starting");

    match &cli.command {
        Command::Key(args) => commands::key::run(args).map(|()| ExitCode::SUCCESS),
        Command::Symbols(args) => {
            commands::symbols::run(args, &config).map(|()| ExitCode::SUCCESS)
        }
        Command::Check(args) => commands::check::run(args, &config),
    }
}
