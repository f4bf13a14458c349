//! CLI command implementations.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::ValueEnum;
use console::style;
use keybridge_core::{Config, KEY_WIDTH, PartitionKey, derive_key};
use serde::Serialize;

pub mod check;
pub mod key;
pub mod symbols;

/// Output format for commands that print keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

/// One symbol and its derived key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyRow {
    pub symbol: String,
    pub key: PartitionKey,
    pub hex: String,
}

impl KeyRow {
    pub fn for_symbol(symbol: &str) -> Self {
        Self::from_key(symbol.to_string(), derive_key(symbol))
    }

    pub fn from_key(symbol: String, key: PartitionKey) -> Self {
        Self {
            symbol,
            key,
            hex: format!("{key:#010X}"),
        }
    }
}

/// Recovers the symbol prefix a key was derived from, without padding.
pub fn key_prefix(key: PartitionKey) -> String {
    let bytes = key.to_be_bytes();
    let prefix = &bytes[bytes.len() - KEY_WIDTH..];
    String::from_utf8_lossy(prefix).trim_end().to_string()
}

/// Symbol list to read: `--file` if given, else the configured path.
pub fn symbols_path(file: Option<&Path>, config: &Config) -> PathBuf {
    file.map_or_else(|| config.symbols_path(), Path::to_path_buf)
}

pub fn print_key_rows(rows: &[KeyRow], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => {
            println!(
                "{:<12} {:>12} {}",
                style("SYMBOL").bold(),
                style("KEY").bold(),
                style("HEX").bold()
            );
            println!("{}", "-".repeat(40));
            for row in rows {
                println!("{:<12} {:>12} {}", row.symbol, row.key, row.hex);
            }
        }
    }
    Ok(())
}
