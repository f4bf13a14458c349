//! Components and the capabilities they may expose.
//!
//! A component is any value the embedding side wants to name by handle. The
//! bridge never guesses what a component is: each call site asks for one
//! [`Capability`] through the matching accessor on [`Component`], and a
//! component that does not provide it answers `None`. That answer becomes a
//! typed [`RegistryError::CapabilityMismatch`](crate::RegistryError) instead
//! of a failed cast.

use std::{any::Any, fmt};

use crate::{dispatch::Encoder, partition::HasSymbol, partition::PartitionFunction};

/// A named operation a component may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `encode(data) -> bytes`, see [`Encoder`].
    Encode,
    /// `symbol() -> &str`, see [`HasSymbol`].
    Symbol,
    /// `partition(data) -> key`, see [`PartitionFunction`].
    Partition,
}

impl Capability {
    /// Stable string id used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Encode => "encode",
            Self::Symbol => "symbol",
            Self::Partition => "partition",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that can be stored in a [`ComponentRegistry`](crate::ComponentRegistry).
///
/// Only [`Component::as_any`] is required. Every capability accessor defaults
/// to `None`; implementors override the ones they actually provide, usually
/// by returning `Some(self)`.
///
/// # Example
///
/// ```
/// use std::any::Any;
///
/// use keybridge_core::{Component, EncodeError, Encoder};
///
/// struct Upper;
///
/// impl Encoder for Upper {
///     fn encode(&self, data: &dyn Component) -> Result<Vec<u8>, EncodeError> {
///         let text = data.downcast_ref::<String>().ok_or_else(|| {
///             EncodeError::unexpected_data::<String>(data)
///         })?;
///         Ok(text.to_uppercase().into_bytes())
///     }
/// }
///
/// impl Component for Upper {
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///
///     fn as_encoder(&self) -> Option<&dyn Encoder> {
///         Some(self)
///     }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// Returns the value encoders should inspect when this component is
    /// passed to them as data.
    fn as_any(&self) -> &dyn Any;

    /// Human-readable type name for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The encoder view of this component, if it can encode.
    fn as_encoder(&self) -> Option<&dyn Encoder> {
        None
    }

    /// The symbol accessor of this component, if it is a symbol-bearing
    /// message.
    fn as_symbol_bearing(&self) -> Option<&dyn HasSymbol> {
        None
    }

    /// The partition function view of this component, if it routes messages.
    fn as_partition_function(&self) -> Option<&dyn PartitionFunction> {
        None
    }

    /// Returns `true` if the component provides `capability`.
    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Encode => self.as_encoder().is_some(),
            Capability::Symbol => self.as_symbol_bearing().is_some(),
            Capability::Partition => self.as_partition_function().is_some(),
        }
    }
}

impl dyn Component {
    /// Recovers the concrete data value behind a component.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type", &self.type_name())
            .finish_non_exhaustive()
    }
}

/// Wraps an arbitrary value so it can be registered as plain data.
///
/// `Opaque<T>` exposes no capabilities. [`Component::as_any`] returns the
/// inner `T`, so encoders recover it with `downcast_ref::<T>()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Opaque<T>(pub T);

impl<T: Send + Sync + 'static> Component for Opaque<T> {
    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EncodeError, PartitionError, partition::PartitionKey};

    struct Ticker(String);

    impl HasSymbol for Ticker {
        fn symbol(&self) -> &str {
            &self.0
        }
    }

    impl Component for Ticker {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_symbol_bearing(&self) -> Option<&dyn HasSymbol> {
            Some(self)
        }
    }

    struct Everything;

    impl Encoder for Everything {
        fn encode(&self, _data: &dyn Component) -> Result<Vec<u8>, EncodeError> {
            Ok(Vec::new())
        }
    }

    impl PartitionFunction for Everything {
        fn partition(&self, _data: &dyn Component) -> Result<PartitionKey, PartitionError> {
            Ok(0)
        }
    }

    impl Component for Everything {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_encoder(&self) -> Option<&dyn Encoder> {
            Some(self)
        }

        fn as_partition_function(&self) -> Option<&dyn PartitionFunction> {
            Some(self)
        }
    }

    #[test]
    fn test_capability_ids_are_stable() {
        assert_eq!(Capability::Encode.as_str(), "encode");
        assert_eq!(Capability::Symbol.as_str(), "symbol");
        assert_eq!(Capability::Partition.as_str(), "partition");
        assert_eq!(Capability::Encode.to_string(), "encode");
    }

    #[test]
    fn test_opaque_exposes_no_capabilities() {
        let data = Opaque(42_u32);

        assert!(!data.supports(Capability::Encode));
        assert!(!data.supports(Capability::Symbol));
        assert!(!data.supports(Capability::Partition));
    }

    #[test]
    fn test_opaque_downcasts_to_inner_value() {
        let data: Box<dyn Component> = Box::new(Opaque(String::from("payload")));

        assert_eq!(
            data.downcast_ref::<String>().map(String::as_str),
            Some("payload")
        );
        assert!(data.downcast_ref::<u32>().is_none());
        assert_eq!(data.type_name(), std::any::type_name::<String>());
    }

    #[test]
    fn test_symbol_bearing_component_reports_symbol_capability() {
        let ticker = Ticker("IBM".to_string());

        assert!(ticker.supports(Capability::Symbol));
        assert!(!ticker.supports(Capability::Encode));
        assert_eq!(ticker.as_symbol_bearing().map(|m| m.symbol()), Some("IBM"));
    }

    #[test]
    fn test_component_with_several_capabilities() {
        let component = Everything;

        assert!(component.supports(Capability::Encode));
        assert!(component.supports(Capability::Partition));
        assert!(!component.supports(Capability::Symbol));
    }

    #[test]
    fn test_debug_shows_type_name() {
        let component: Box<dyn Component> = Box::new(Opaque(1_u8));
        assert!(format!("{component:?}").contains("u8"));
    }
}
