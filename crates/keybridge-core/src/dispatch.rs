//! Handle dispatch: resolve two handles, run one capability, return an owned
//! result.
//!
//! [`encode`] is the Rust half of the boundary's encode entry point and
//! [`partition`] the half of its partition entry point. Both stay in ordinary
//! ownership: results are plain values and every failure is a typed
//! [`DispatchError`]. Copying bytes into host-owned memory happens later, at
//! the literal `extern "C"` edge.

use keybridge_abi::Handle;
use tracing::{debug, instrument};

use crate::{
    component::{Capability, Component},
    partition::{PartitionError, PartitionKey},
    registry::{ComponentRegistry, RegistryError},
};

/// Turns a data component into bytes.
///
/// `data` is whatever was registered under the data handle. Implementations
/// usually recover a concrete type with
/// [`downcast_ref`](crate::Component::downcast_ref) and report
/// [`EncodeError::UnexpectedData`] when the type is not one they understand.
pub trait Encoder: Send + Sync {
    /// Encodes `data`.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when `data` cannot be encoded.
    fn encode(&self, data: &dyn Component) -> Result<Vec<u8>, EncodeError>;
}

/// Failures reported by an [`Encoder`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// The data component is not of a type the encoder handles.
    #[error("encoder expected {expected}, got {actual}")]
    UnexpectedData {
        expected: &'static str,
        actual: &'static str,
    },

    /// The encoder failed for its own reasons.
    #[error("encode failed: {0}")]
    Failed(String),
}

impl EncodeError {
    /// Builds an [`EncodeError::UnexpectedData`] for an encoder that wanted a
    /// `T` but was handed `data`.
    #[must_use]
    pub fn unexpected_data<T>(data: &dyn Component) -> Self {
        Self::UnexpectedData {
            expected: std::any::type_name::<T>(),
            actual: data.type_name(),
        }
    }
}

/// Errors that can occur while dispatching a call by handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// A handle did not resolve, or the encoder handle is not an encoder.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The encoder ran and failed.
    #[error("encoder {encoder} failed: {source}")]
    Encode {
        encoder: Handle,
        #[source]
        source: EncodeError,
    },

    /// The partition function rejected the message.
    #[error("partition function {partition_fn} rejected message: {source}")]
    Partition {
        partition_fn: Handle,
        #[source]
        source: PartitionError,
    },
}

/// Resolves `encoder` and `data` in `registry` and encodes.
///
/// Both components are cloned out of the registry before `encode` runs, so no
/// registry lock is held while encoder code executes.
///
/// # Errors
///
/// - [`RegistryError::UnknownHandle`] if either handle is not registered
/// - [`RegistryError::CapabilityMismatch`] if `encoder` cannot encode
/// - [`DispatchError::Encode`] if the encoder itself fails
#[instrument(skip(registry), level = "debug")]
pub fn encode(
    registry: &ComponentRegistry,
    encoder: Handle,
    data: Handle,
) -> Result<Vec<u8>, DispatchError> {
    let encoder_component = registry.encoder(encoder)?;
    let data_component = registry.get(data)?;

    let bytes = run_encoder(encoder, encoder_component.as_ref(), data_component.as_ref())?;

    debug!(encoder, data, len = bytes.len(), "Encoded component");
    Ok(bytes)
}

/// Resolves `partition_fn` and `data` in `registry` and computes the
/// partition key of the message.
///
/// # Errors
///
/// - [`RegistryError::UnknownHandle`] if either handle is not registered
/// - [`RegistryError::CapabilityMismatch`] if `partition_fn` cannot partition
/// - [`DispatchError::Partition`] if the message carries no symbol
#[instrument(skip(registry), level = "trace")]
pub fn partition(
    registry: &ComponentRegistry,
    partition_fn: Handle,
    data: Handle,
) -> Result<PartitionKey, DispatchError> {
    let function_component = registry.partition_function(partition_fn)?;
    let data_component = registry.get(data)?;

    let function = function_component.as_partition_function().ok_or_else(|| {
        RegistryError::CapabilityMismatch {
            handle: partition_fn,
            capability: Capability::Partition,
            type_name: function_component.type_name(),
        }
    })?;

    function
        .partition(data_component.as_ref())
        .map_err(|source| DispatchError::Partition {
            partition_fn,
            source,
        })
}

fn run_encoder(
    handle: Handle,
    component: &dyn Component,
    data: &dyn Component,
) -> Result<Vec<u8>, DispatchError> {
    // `encoder()` already checked the capability; a component whose accessor
    // changes its answer between calls is reported the same way.
    let encoder = component
        .as_encoder()
        .ok_or_else(|| RegistryError::CapabilityMismatch {
            handle,
            capability: Capability::Encode,
            type_name: component.type_name(),
        })?;

    encoder
        .encode(data)
        .map_err(|source| DispatchError::Encode {
            encoder: handle,
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::{
        any::Any,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::{
        component::Opaque,
        partition::{HasSymbol, SymbolPartitionFunction, derive_key},
    };

    struct FixedEncoder;

    impl Encoder for FixedEncoder {
        fn encode(&self, _data: &dyn Component) -> Result<Vec<u8>, EncodeError> {
            Ok(vec![0xCA, 0xFE, 0x01])
        }
    }

    impl Component for FixedEncoder {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_encoder(&self) -> Option<&dyn Encoder> {
            Some(self)
        }
    }

    struct Votes {
        letter: char,
        votes: u32,
    }

    struct VotesEncoder;

    impl Encoder for VotesEncoder {
        fn encode(&self, data: &dyn Component) -> Result<Vec<u8>, EncodeError> {
            let votes = data
                .downcast_ref::<Votes>()
                .ok_or_else(|| EncodeError::unexpected_data::<Votes>(data))?;
            let mut out = votes.letter.to_string().into_bytes();
            out.extend_from_slice(&votes.votes.to_be_bytes());
            Ok(out)
        }
    }

    impl Component for VotesEncoder {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_encoder(&self) -> Option<&dyn Encoder> {
            Some(self)
        }
    }

    struct FailingEncoder;

    impl Encoder for FailingEncoder {
        fn encode(&self, _data: &dyn Component) -> Result<Vec<u8>, EncodeError> {
            Err(EncodeError::Failed("boom".to_string()))
        }
    }

    impl Component for FailingEncoder {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_encoder(&self) -> Option<&dyn Encoder> {
            Some(self)
        }
    }

    /// Registers a new component from inside `encode`.
    struct ReentrantEncoder {
        registry: Arc<ComponentRegistry>,
        registered: Mutex<Vec<Handle>>,
    }

    impl Encoder for ReentrantEncoder {
        fn encode(&self, _data: &dyn Component) -> Result<Vec<u8>, EncodeError> {
            let handle = self
                .registry
                .register(Arc::new(Opaque(())))
                .map_err(|e| EncodeError::Failed(e.to_string()))?;
            self.registered
                .lock()
                .map_err(|e| EncodeError::Failed(e.to_string()))?
                .push(handle);
            Ok(handle.to_be_bytes().to_vec())
        }
    }

    impl Component for ReentrantEncoder {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_encoder(&self) -> Option<&dyn Encoder> {
            Some(self)
        }
    }

    struct Trade {
        symbol: &'static str,
    }

    impl HasSymbol for Trade {
        fn symbol(&self) -> &str {
            self.symbol
        }
    }

    impl Component for Trade {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_symbol_bearing(&self) -> Option<&dyn HasSymbol> {
            Some(self)
        }
    }

    #[test]
    fn test_encode_returns_encoder_output() {
        let registry = ComponentRegistry::new();
        let encoder = registry.register(Arc::new(FixedEncoder)).unwrap();
        let data = registry.register(Arc::new(Opaque("anything"))).unwrap();

        let bytes = encode(&registry, encoder, data).unwrap();

        assert_eq!(bytes, vec![0xCA, 0xFE, 0x01]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_encode_passes_resolved_data_to_encoder() {
        let registry = ComponentRegistry::new();
        let encoder = registry.register(Arc::new(VotesEncoder)).unwrap();
        let data = registry
            .register(Arc::new(Opaque(Votes {
                letter: 'q',
                votes: 258,
            })))
            .unwrap();

        let bytes = encode(&registry, encoder, data).unwrap();

        assert_eq!(bytes, vec![b'q', 0, 0, 1, 2]);
    }

    #[test]
    fn test_encode_unknown_encoder_handle() {
        let registry = ComponentRegistry::new();
        let data = registry.register(Arc::new(Opaque(1_u8))).unwrap();

        let err = encode(&registry, 777, data).unwrap_err();

        assert_eq!(
            err,
            DispatchError::Registry(RegistryError::UnknownHandle(777))
        );
    }

    #[test]
    fn test_encode_unknown_data_handle() {
        let registry = ComponentRegistry::new();
        let encoder = registry.register(Arc::new(FixedEncoder)).unwrap();

        let err = encode(&registry, encoder, 888).unwrap_err();

        assert_eq!(
            err,
            DispatchError::Registry(RegistryError::UnknownHandle(888))
        );
    }

    #[test]
    fn test_encode_rejects_component_without_encode_capability() {
        let registry = ComponentRegistry::new();
        let not_an_encoder = registry.register(Arc::new(Opaque(5_u16))).unwrap();
        let data = registry.register(Arc::new(Opaque(1_u8))).unwrap();

        let err = encode(&registry, not_an_encoder, data).unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Registry(RegistryError::CapabilityMismatch {
                capability: Capability::Encode,
                type_name: "u16",
                ..
            })
        ));
    }

    #[test]
    fn test_encode_surfaces_encoder_failure() {
        let registry = ComponentRegistry::new();
        let encoder = registry.register(Arc::new(FailingEncoder)).unwrap();
        let data = registry.register(Arc::new(Opaque(1_u8))).unwrap();

        let err = encode(&registry, encoder, data).unwrap_err();

        assert_eq!(
            err,
            DispatchError::Encode {
                encoder,
                source: EncodeError::Failed("boom".to_string()),
            }
        );
        assert_eq!(err.to_string(), format!("encoder {encoder} failed: encode failed: boom"));
    }

    #[test]
    fn test_encode_reports_unexpected_data_type() {
        let registry = ComponentRegistry::new();
        let encoder = registry.register(Arc::new(VotesEncoder)).unwrap();
        let data = registry.register(Arc::new(Opaque(3_i32))).unwrap();

        let err = encode(&registry, encoder, data).unwrap_err();

        let DispatchError::Encode {
            source: EncodeError::UnexpectedData { expected, actual },
            ..
        } = err
        else {
            panic!("expected UnexpectedData, got {err:?}");
        };
        assert!(expected.ends_with("Votes"));
        assert_eq!(actual, "i32");
    }

    #[test]
    fn test_encoder_may_use_registry_during_encode() {
        let registry = Arc::new(ComponentRegistry::new());
        let reentrant = Arc::new(ReentrantEncoder {
            registry: Arc::clone(&registry),
            registered: Mutex::new(Vec::new()),
        });
        let encoder = registry.register(Arc::clone(&reentrant) as Arc<dyn Component>).unwrap();
        let data = registry.register(Arc::new(Opaque(()))).unwrap();

        let bytes = encode(&registry, encoder, data).unwrap();

        let registered = reentrant.registered.lock().unwrap();
        assert_eq!(registered.len(), 1);
        assert_eq!(bytes, registered[0].to_be_bytes().to_vec());
        assert!(registry.contains(registered[0]));
    }

    #[test]
    fn test_partition_resolves_both_handles() {
        let registry = ComponentRegistry::new();
        let function = registry
            .register(Arc::new(SymbolPartitionFunction::new()))
            .unwrap();
        let trade = registry.register(Arc::new(Trade { symbol: "AAPL" })).unwrap();

        let key = partition(&registry, function, trade).unwrap();

        assert_eq!(key, derive_key("AAPL"));
    }

    #[test]
    fn test_partition_rejects_message_without_symbol() {
        let registry = ComponentRegistry::new();
        let function = registry
            .register(Arc::new(SymbolPartitionFunction::new()))
            .unwrap();
        let data = registry.register(Arc::new(Opaque(9_u8))).unwrap();

        let err = partition(&registry, function, data).unwrap_err();

        assert_eq!(
            err,
            DispatchError::Partition {
                partition_fn: function,
                source: PartitionError::UnsupportedMessageType { type_name: "u8" },
            }
        );
    }

    #[test]
    fn test_partition_rejects_component_without_partition_capability() {
        let registry = ComponentRegistry::new();
        let encoder = registry.register(Arc::new(FixedEncoder)).unwrap();
        let trade = registry.register(Arc::new(Trade { symbol: "IBM" })).unwrap();

        let err = partition(&registry, encoder, trade).unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Registry(RegistryError::CapabilityMismatch {
                capability: Capability::Partition,
                ..
            })
        ));
    }

    #[test]
    fn test_partition_unknown_data_handle() {
        let registry = ComponentRegistry::new();
        let function = registry
            .register(Arc::new(SymbolPartitionFunction::new()))
            .unwrap();

        let err = partition(&registry, function, 4_242).unwrap_err();

        assert_eq!(
            err,
            DispatchError::Registry(RegistryError::UnknownHandle(4_242))
        );
    }
}
