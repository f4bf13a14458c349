//! Load a symbol list and print the keys it contains.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use keybridge_core::{Config, load_symbol_keys};
use tracing::info;

use super::{KeyRow, OutputFormat, key_prefix, print_key_rows, symbols_path};

/// Command-line arguments for the symbols command.
#[derive(Args)]
pub struct SymbolsArgs {
    /// Symbol list to read (defaults to the configured path)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Loads the list at `path` as rows, one per line, in file order.
///
/// Symbols longer than the key width are shown by the prefix that forms
/// their key.
pub fn rows(path: &Path) -> Result<Vec<KeyRow>> {
    let keys = load_symbol_keys(path)
        .with_context(|| format!("failed to load symbol list {}", path.display()))?;

    Ok(keys
        .into_iter()
        .map(|key| KeyRow::from_key(key_prefix(key), key))
        .collect())
}

pub fn run(args: &SymbolsArgs, config: &Config) -> Result<()> {
    let path = symbols_path(args.file.as_deref(), config);
    let rows = rows(&path)?;
    info!(path = %path.display(), count = rows.len(), "Read symbol list");

    print_key_rows(&rows, args.format)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_rows_follow_file_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("symbols.txt");
        fs::write(&path, "MSFT\r\n\nA\nGOOGL\n").unwrap();

        let rows = rows(&path).unwrap();

        let symbols: Vec<_> = rows.iter().map(|row| row.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MSFT", "A", "GOOG"]);
        assert_eq!(rows[1].hex, "0x41202020");
    }

    #[test]
    fn test_rows_missing_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.txt");

        let err = rows(&path).unwrap_err();

        assert!(format!("{err:#}").contains("absent.txt"));
    }
}
