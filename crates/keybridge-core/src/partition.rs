//! Partition keys for routing symbol-bearing messages to workers.
//!
//! # Key Derivation
//!
//! [`derive_key`] maps a symbol to a fixed-width key:
//!
//! 1. Take the UTF-8 bytes of the symbol.
//! 2. If there are at least [`KEY_WIDTH`] bytes, keep the first [`KEY_WIDTH`].
//!    Otherwise right-pad with [`PAD_BYTE`] to [`KEY_WIDTH`].
//! 3. Read the four bytes as a big-endian `u32` and widen to `u64`.
//!
//! Producers and consumers of keys compute them independently, so this rule
//! is part of the wire contract. [`KEY_DERIVATION_VERSION`] changes if it
//! ever does.
//!
//! | symbol   | bytes         | key          |
//! |----------|---------------|--------------|
//! | `"AAPL"` | `41 41 50 4C` | `0x4141504C` |
//! | `"A"`    | `41 20 20 20` | `0x41202020` |
//! | `""`     | `20 20 20 20` | `0x20202020` |

use std::any::Any;

use tracing::trace;

use crate::component::Component;

/// Deterministic routing key derived from a symbol.
pub type PartitionKey = u64;

/// Number of symbol bytes that contribute to a key.
pub const KEY_WIDTH: usize = 4;

/// Byte used to right-pad short symbols.
pub const PAD_BYTE: u8 = b' ';

/// Version of the derivation rule implemented by [`derive_key`].
pub const KEY_DERIVATION_VERSION: u32 = 1;

/// Derives the partition key for `symbol`.
///
/// Total and pure: every input yields a key, and equal inputs yield equal
/// keys.
///
/// # Example
///
/// ```
/// use keybridge_core::derive_key;
///
/// assert_eq!(derive_key("AAPL"), 0x4141_504C);
/// assert_eq!(derive_key("A"), 0x4120_2020);
/// assert_eq!(derive_key("GOOGL"), derive_key("GOOG"));
/// ```
#[must_use]
pub fn derive_key(symbol: &str) -> PartitionKey {
    derive_key_from_bytes(symbol.as_bytes())
}

/// Derives the partition key from raw symbol bytes.
///
/// Same rule as [`derive_key`], for callers that hold bytes which were never
/// validated as UTF-8 (such as a host across the boundary).
#[must_use]
pub fn derive_key_from_bytes(symbol: &[u8]) -> PartitionKey {
    let mut padded = [PAD_BYTE; KEY_WIDTH];
    for (slot, byte) in padded.iter_mut().zip(symbol) {
        *slot = *byte;
    }
    PartitionKey::from(u32::from_be_bytes(padded))
}

/// A message that carries a routing symbol.
pub trait HasSymbol: Send + Sync {
    /// The symbol the message should be routed by.
    fn symbol(&self) -> &str;
}

/// Maps a message to the key of the worker that should handle it.
pub trait PartitionFunction: Send + Sync {
    /// Computes the key for `data`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::UnsupportedMessageType`] when `data` is not a
    /// message this function can route.
    fn partition(&self, data: &dyn Component) -> Result<PartitionKey, PartitionError>;
}

/// Errors that can occur while partitioning a message.
///
/// These reject one message; they are never fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PartitionError {
    /// The message does not expose a symbol.
    #[error("message type {type_name} carries no symbol")]
    UnsupportedMessageType { type_name: &'static str },
}

/// Routes symbol-bearing messages by [`derive_key`] of their symbol.
///
/// Stateless; one instance can be shared by any number of threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolPartitionFunction;

impl SymbolPartitionFunction {
    /// Creates a new partition function.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PartitionFunction for SymbolPartitionFunction {
    fn partition(&self, data: &dyn Component) -> Result<PartitionKey, PartitionError> {
        let message =
            data.as_symbol_bearing()
                .ok_or(PartitionError::UnsupportedMessageType {
                    type_name: data.type_name(),
                })?;

        let symbol = message.symbol();
        let key = derive_key(symbol);
        trace!(symbol, key, "Partitioned message");
        Ok(key)
    }
}

impl Component for SymbolPartitionFunction {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_partition_function(&self) -> Option<&dyn PartitionFunction> {
        Some(self)
    }
}
