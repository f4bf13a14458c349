//! Check whether symbols are present in a symbol list.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use keybridge_core::{Config, PartitionKey, SymbolSet, derive_key};
use serde::Serialize;

use super::{OutputFormat, symbols_path};

/// Command-line arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Symbol list to check against (defaults to the configured path)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Symbols to look up
    #[arg(required = true)]
    pub symbols: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRow {
    pub symbol: String,
    pub key: PartitionKey,
    pub listed: bool,
}

/// Looks each symbol up by its derived key.
pub fn check(set: &SymbolSet, symbols: &[String]) -> Vec<CheckRow> {
    symbols
        .iter()
        .map(|symbol| {
            let key = derive_key(symbol);
            CheckRow {
                symbol: symbol.clone(),
                key,
                listed: set.contains_key(key),
            }
        })
        .collect()
}

/// Runs the check; fails the process if any symbol is not listed.
pub fn run(args: &CheckArgs, config: &Config) -> Result<ExitCode> {
    let path = symbols_path(args.file.as_deref(), config);
    let set = SymbolSet::load(&path)
        .with_context(|| format!("failed to load symbol list {}", path.display()))?;

    let rows = check(&set, &args.symbols);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => {
            for row in &rows {
                let mark = if row.listed {
                    style("✓").green().bold()
                } else {
                    style("✗").red().bold()
                };
                println!("{mark} {:<12} {:#010X}", row.symbol, row.key);
            }
        }
    }

    if rows.iter().all(|row| row.listed) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_matches_by_derived_key() {
        let mut set = SymbolSet::new();
        set.insert_symbol("AAPL");
        set.insert_symbol("GOOGL");

        let rows = check(
            &set,
            &["AAPL".to_string(), "GOOG".to_string(), "MSFT".to_string()],
        );

        let listed: Vec<_> = rows.iter().map(|row| row.listed).collect();
        assert_eq!(listed, vec![true, true, false]);
        assert_eq!(rows[2].key, derive_key("MSFT"));
    }

    #[test]
    fn test_check_empty_set_lists_nothing() {
        let rows = check(&SymbolSet::new(), &["IBM".to_string()]);

        assert!(!rows[0].listed);
    }
}
