//! Print the partition key of each symbol given on the command line.

use anyhow::Result;
use clap::Args;

use super::{KeyRow, OutputFormat, print_key_rows};

/// Command-line arguments for the key command.
#[derive(Args)]
pub struct KeyArgs {
    /// Symbols to derive keys for
    #[arg(required = true)]
    pub symbols: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn rows(symbols: &[String]) -> Vec<KeyRow> {
    symbols.iter().map(|symbol| KeyRow::for_symbol(symbol)).collect()
}

pub fn run(args: &KeyArgs) -> Result<()> {
    print_key_rows(&rows(&args.symbols), args.format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keep_argument_order() {
        let symbols = vec!["IBM".to_string(), "AAPL".to_string(), String::new()];

        let rows = rows(&symbols);

        let keys: Vec<_> = rows.iter().map(|row| row.key).collect();
        assert_eq!(keys, vec![0x4942_4D20, 0x4141_504C, 0x2020_2020]);
        assert_eq!(rows[0].symbol, "IBM");
    }
}
