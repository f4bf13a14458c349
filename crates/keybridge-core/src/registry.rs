//! Process-wide component registry keyed by opaque numeric handles.
//!
//! This module provides the table the host side of the bridge uses to refer to
//! Rust values it cannot hold directly. A component is stored once and named
//! by a [`Handle`]; every later call resolves that handle back to the value.
//!
//! # Architecture
//!
//! - [`ComponentRegistry`]: the guarded mapping from handle to component
//! - [`RegistryError`]: typed lookup failures (unknown handle, missing
//!   capability)
//!
//! # Handle Issuance
//!
//! Handles come from a monotonically increasing atomic counter starting at 1.
//! A value is never issued twice, even after its component is removed, so a
//! stale handle can only ever fail with [`RegistryError::UnknownHandle`]; it
//! can never silently resolve to a newer component. `0` is
//! [`NULL_HANDLE`](keybridge_abi::NULL_HANDLE) and is never issued.
//!
//! # Thread Safety
//!
//! The mapping lives behind one [`RwLock`]. Registrations and removals take
//! the write lock; lookups take the read lock. Lookups return an [`Arc`]
//! clone, so the lock is always released before any component code runs.
//! A component that calls back into the registry from its own `encode` or
//! `partition` therefore cannot deadlock.

use std::{
    collections::HashMap,
    sync::{
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicU64, Ordering},
    },
};

use keybridge_abi::{Handle, NULL_HANDLE};
use tracing::debug;

use crate::component::{Capability, Component};

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// No component is registered under the handle.
    #[error("unknown handle: {0}")]
    UnknownHandle(Handle),

    /// The component exists but does not provide the required capability.
    #[error("component {handle} ({type_name}) does not support capability `{capability}`")]
    CapabilityMismatch {
        handle: Handle,
        capability: Capability,
        type_name: &'static str,
    },

    /// The handle counter has no values left to issue.
    #[error("component handles exhausted")]
    HandlesExhausted,
}

/// Guarded mapping from [`Handle`] to a shared component.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use keybridge_core::{ComponentRegistry, Opaque};
///
/// let registry = ComponentRegistry::new();
/// let handle = registry.register(Arc::new(Opaque(42_u32)))?;
///
/// let component = registry.get(handle)?;
/// assert_eq!(component.downcast_ref::<u32>(), Some(&42));
/// # Ok::<(), keybridge_core::RegistryError>(())
/// ```
pub struct ComponentRegistry {
    components: RwLock<HashMap<Handle, Arc<dyn Component>>>,
    next_handle: AtomicU64,
}

impl ComponentRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(NULL_HANDLE + 1),
        }
    }

    /// Stores `component` and returns a fresh handle for it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::HandlesExhausted`] once every `u64` handle
    /// has been issued.
    pub fn register(&self, component: Arc<dyn Component>) -> Result<Handle, RegistryError> {
        let handle = self.issue_handle()?;
        let type_name = component.type_name();

        self.write().insert(handle, component);

        debug!(handle, type_name, "Registered component");
        Ok(handle)
    }

    /// Returns the component stored under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] if nothing is registered under
    /// `handle`.
    pub fn get(&self, handle: Handle) -> Result<Arc<dyn Component>, RegistryError> {
        self.read()
            .get(&handle)
            .cloned()
            .ok_or(RegistryError::UnknownHandle(handle))
    }

    /// Returns the component under `handle` after checking it can encode.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unregistered handle and
    /// [`RegistryError::CapabilityMismatch`] if the component is not an
    /// encoder.
    pub fn encoder(&self, handle: Handle) -> Result<Arc<dyn Component>, RegistryError> {
        self.get_with(handle, Capability::Encode)
    }

    /// Returns the component under `handle` after checking it is a partition
    /// function.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unregistered handle and
    /// [`RegistryError::CapabilityMismatch`] if the component cannot partition.
    pub fn partition_function(&self, handle: Handle) -> Result<Arc<dyn Component>, RegistryError> {
        self.get_with(handle, Capability::Partition)
    }

    /// Returns the component under `handle` if it supports `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for an unregistered handle and
    /// [`RegistryError::CapabilityMismatch`] if the capability is absent.
    pub fn get_with(
        &self,
        handle: Handle,
        capability: Capability,
    ) -> Result<Arc<dyn Component>, RegistryError> {
        let component = self.get(handle)?;
        if component.supports(capability) {
            Ok(component)
        } else {
            Err(RegistryError::CapabilityMismatch {
                handle,
                capability,
                type_name: component.type_name(),
            })
        }
    }

    /// Removes the component stored under `handle` and returns it.
    ///
    /// The handle value is retired; it will not be issued again.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] if nothing is registered under
    /// `handle`.
    pub fn remove(&self, handle: Handle) -> Result<Arc<dyn Component>, RegistryError> {
        let component = self
            .write()
            .remove(&handle)
            .ok_or(RegistryError::UnknownHandle(handle))?;

        debug!(handle, type_name = component.type_name(), "Removed component");
        Ok(component)
    }

    /// Returns `true` if a component is registered under `handle`.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.read().contains_key(&handle)
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if no components are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns a sorted snapshot of the live handles.
    #[must_use]
    pub fn handles(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = self.read().keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    fn issue_handle(&self) -> Result<Handle, RegistryError> {
        self.next_handle
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(1)
            })
            .map_err(|_| RegistryError::HandlesExhausted)
    }

    // The map has no multi-step invariants, so a panic in another thread
    // cannot leave it half-updated; recover from poisoning.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Handle, Arc<dyn Component>>> {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Handle, Arc<dyn Component>>> {
        self.components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ComponentRegistry {
    /// Creates a new empty registry, same as [`ComponentRegistry::new`].
    fn default() -> Self {
        Self::new()
    }
}
