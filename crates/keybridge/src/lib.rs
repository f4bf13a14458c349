//! C ABI entry points for the keybridge component bridge.
//!
//! A host process links this crate (as a `cdylib` or `staticlib`) and talks
//! to Rust components through the functions in [`ffi`]. Rust code in the same
//! process registers components with [`register`] and hands the resulting
//! [`Handle`]s to the host; the host passes them back on every call.
//!
//! # Boundary Contract
//!
//! - Handles are resolved and capabilities checked before any raw pointer is
//!   written. A bad handle is reported, never dereferenced.
//! - Encoded bytes cross as one buffer owned by the host until it calls
//!   [`ffi::keybridge_buffer_free`] with the same pointer and length.
//! - Panics are not caught. The release profile aborts on panic, so a panic
//!   inside an encoder terminates the process instead of unwinding into
//!   foreign frames.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use keybridge::SymbolPartitionFunction;
//!
//! let handle = keybridge::register(Arc::new(SymbolPartitionFunction::new()))?;
//! assert!(keybridge::registry().contains(handle));
//! keybridge::release(handle)?;
//! # Ok::<(), keybridge::RegistryError>(())
//! ```

use std::sync::{Arc, LazyLock};

pub use keybridge_abi::{BRIDGE_ABI_VERSION, BridgeStatus, Handle, NULL_HANDLE, OwnedBuffer};
pub use keybridge_core::{
    Capability, Component, ComponentRegistry, Config, DispatchError, EncodeError, Encoder,
    HasSymbol, LogFormat, LoggingConfig, Opaque, PartitionError, PartitionFunction, PartitionKey,
    RegistryError, SymbolPartitionFunction, derive_key,
};

pub mod ffi;
mod logging;
mod status;

pub use logging::{LoggingError, init_logging};
pub use status::StatusCode;

static REGISTRY: LazyLock<ComponentRegistry> = LazyLock::new(ComponentRegistry::new);

/// The process-wide registry every exported function resolves handles in.
pub fn registry() -> &'static ComponentRegistry {
    &REGISTRY
}

/// Registers `component` in the process-wide registry.
///
/// # Errors
///
/// Returns [`RegistryError::HandlesExhausted`] if no handle values remain.
pub fn register(component: Arc<dyn Component>) -> Result<Handle, RegistryError> {
    registry().register(component)
}

/// Removes the component under `handle` from the process-wide registry.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownHandle`] if nothing is registered under
/// `handle`.
pub fn release(handle: Handle) -> Result<(), RegistryError> {
    registry().remove(handle).map(drop)
}
