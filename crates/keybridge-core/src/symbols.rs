//! Symbol list loading for validity filtering.
//!
//! A symbol list is a text file with one symbol per line (conventionally
//! [`DEFAULT_SYMBOLS_FILE`]). Each symbol is turned into a key with
//! [`derive_key`], the same rule the partition function routes by, so a key
//! that passes the filter always routes to the worker that owns it.
//!
//! Blank and whitespace-only lines are skipped, so they never contribute a
//! valid key. In particular the all-spaces key `0x20202020`, which an
//! empty-symbol message routes to, is only valid if a line actually holds
//! a symbol that pads to it.

use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::partition::{PartitionKey, derive_key};

/// Conventional file name for a symbol list.
pub const DEFAULT_SYMBOLS_FILE: &str = "symbols.txt";

/// Errors that can occur while loading a symbol list.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SymbolsError {
    /// The symbol file could not be opened or read.
    #[error("failed to read symbol list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from an in-memory or streamed source failed.
    #[error("failed to read symbol list: {0}")]
    Read(#[from] io::Error),
}

/// Parses one symbol per line from `reader` and derives each key.
///
/// A trailing `\r` is stripped from every line and blank lines are skipped.
/// Keys are returned in file order; duplicates are kept.
///
/// # Errors
///
/// Returns [`SymbolsError::Read`] if reading a line fails.
pub fn parse_symbol_keys(reader: impl BufRead) -> Result<Vec<PartitionKey>, SymbolsError> {
    let mut keys = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let symbol = line.strip_suffix('\r').unwrap_or(&line);
        if symbol.trim().is_empty() {
            continue;
        }
        keys.push(derive_key(symbol));
    }
    Ok(keys)
}

/// Loads a symbol list from `path` and derives each key.
///
/// # Errors
///
/// Returns [`SymbolsError::Io`] if the file cannot be opened or read.
pub fn load_symbol_keys(path: impl AsRef<Path>) -> Result<Vec<PartitionKey>, SymbolsError> {
    let path = path.as_ref();
    let io_error = |source| SymbolsError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let keys = parse_symbol_keys(BufReader::new(file)).map_err(|err| match err {
        SymbolsError::Read(source) => io_error(source),
        other => other,
    })?;

    info!(path = %path.display(), count = keys.len(), "Loaded symbol list");
    Ok(keys)
}

/// Set of valid partition keys, for filtering incoming messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSet {
    keys: HashSet<PartitionKey>,
}

impl SymbolSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a set from a symbol list file.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolsError::Io`] if the file cannot be opened or read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SymbolsError> {
        let keys = load_symbol_keys(path)?;
        let set: Self = keys.into_iter().collect();
        debug!(distinct = set.len(), "Built symbol set");
        Ok(set)
    }

    /// Adds a symbol's key to the set.
    pub fn insert_symbol(&mut self, symbol: &str) -> bool {
        self.keys.insert(derive_key(symbol))
    }

    /// Returns `true` if `key` is in the set.
    #[must_use]
    pub fn contains_key(&self, key: PartitionKey) -> bool {
        self.keys.contains(&key)
    }

    /// Returns `true` if the key of `symbol` is in the set.
    #[must_use]
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.contains_key(derive_key(symbol))
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over the keys in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = PartitionKey> + '_ {
        self.keys.iter().copied()
    }
}

impl FromIterator<PartitionKey> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = PartitionKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
