//! Mapping from typed Rust errors to boundary status codes.

use keybridge_abi::BridgeStatus;
use keybridge_core::{DispatchError, PartitionError, RegistryError};

/// Errors that have a [`BridgeStatus`] at the boundary.
pub trait StatusCode {
    /// The status code a host sees for this error.
    fn status(&self) -> BridgeStatus;
}

impl StatusCode for RegistryError {
    fn status(&self) -> BridgeStatus {
        match self {
            Self::UnknownHandle(_) => BridgeStatus::UnknownHandle,
            Self::CapabilityMismatch { .. } => BridgeStatus::CapabilityMismatch,
            _ => BridgeStatus::Internal,
        }
    }
}

impl StatusCode for PartitionError {
    fn status(&self) -> BridgeStatus {
        match self {
            Self::UnsupportedMessageType { .. } => BridgeStatus::UnsupportedMessageType,
            _ => BridgeStatus::Internal,
        }
    }
}

impl StatusCode for DispatchError {
    fn status(&self) -> BridgeStatus {
        match self {
            Self::Registry(err) => err.status(),
            Self::Encode { .. } => BridgeStatus::EncodeFailed,
            Self::Partition { source, .. } => source.status(),
            _ => BridgeStatus::Internal,
        }
    }
}
