//! Core types for the keybridge interop boundary.
//!
//! This crate holds everything on the Rust side of the boundary that does not
//! touch raw pointers: the component model, the handle registry, encoder
//! dispatch and the partition key rule. The `keybridge` crate wraps these in
//! `extern "C"` entry points.
//!
//! # Key Components
//!
//! - **Components**: values the host refers to by handle, with optional
//!   capabilities via [`Component`]
//! - **Registry**: [`ComponentRegistry`] maps handles to shared components
//! - **Dispatch**: [`dispatch::encode`] resolves an encoder and a data
//!   component and returns owned bytes
//! - **Partitioning**: [`derive_key`] and [`SymbolPartitionFunction`] route
//!   messages by symbol
//! - **Symbol lists**: [`SymbolSet`] loads valid keys from a file
//! - **Configuration**: [`Config`] reads `keybridge.toml`
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use keybridge_core::{ComponentRegistry, SymbolPartitionFunction, derive_key};
//!
//! let registry = ComponentRegistry::new();
//! let handle = registry.register(Arc::new(SymbolPartitionFunction::new()))?;
//!
//! assert!(registry.partition_function(handle).is_ok());
//! assert_eq!(derive_key("IBM"), 0x4942_4D20);
//! # Ok::<(), keybridge_core::RegistryError>(())
//! ```

mod component;
mod partition;
mod registry;
mod symbols;

pub mod config;
pub mod dispatch;

pub use component::{Capability, Component, Opaque};
pub use config::{Config, ConfigError, LogFormat, LoggingConfig, SymbolsConfig};
pub use dispatch::{DispatchError, EncodeError, Encoder};
pub use keybridge_abi::{Handle, NULL_HANDLE};
pub use partition::{
    HasSymbol, KEY_DERIVATION_VERSION, KEY_WIDTH, PAD_BYTE, PartitionError, PartitionFunction,
    PartitionKey, SymbolPartitionFunction, derive_key, derive_key_from_bytes,
};
pub use registry::{ComponentRegistry, RegistryError};
pub use symbols::{
    DEFAULT_SYMBOLS_FILE, SymbolSet, SymbolsError, load_symbol_keys, parse_symbol_keys,
};
