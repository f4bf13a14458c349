//! Stable ABI types for the keybridge boundary.
//!
//! This crate defines the values that cross the foreign-function edge between
//! the Rust side of the bridge and the host process calling into it. Nothing
//! here knows about components or encoders; it only fixes the shapes the
//! exported `extern "C"` functions speak in.
//!
//! # Ownership Philosophy
//!
//! Buffers produced on the Rust side stay ordinary owned values
//! ([`OwnedBuffer`]) until the very last step of a boundary call. At that
//! point [`OwnedBuffer::into_raw_parts`] hands the allocation to the host,
//! which must give it back exactly once through the bridge's release entry
//! point. [`OwnedBuffer::from_raw_parts`] is the only way back in.
//!
//! - **Handles** ([`Handle`]): plain `u64` identities. `0` is reserved as
//!   [`NULL_HANDLE`] and is never issued by a registry.
//!
//! - **Status codes** ([`BridgeStatus`]): one byte, stable discriminants, one
//!   code per typed failure on the Rust side.

pub use abi_stable;
use abi_stable::StableAbi;

/// Current ABI version. Incremented when breaking changes are made to any
/// exported signature or status discriminant.
pub const BRIDGE_ABI_VERSION: u32 = 1;

/// Opaque identity of a registered component.
pub type Handle = u64;

/// Reserved handle value that never names a component.
pub const NULL_HANDLE: Handle = 0;

/// Result codes for boundary operations.
#[repr(u8)]
#[derive(StableAbi, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BridgeStatus {
    /// Operation completed successfully.
    Ok = 0,
    /// No component is registered under the supplied handle.
    UnknownHandle = 1,
    /// The component exists but lacks the capability the call needs.
    CapabilityMismatch = 2,
    /// The encoder ran and reported a failure.
    EncodeFailed = 3,
    /// The message given to a partition function carries no symbol.
    UnsupportedMessageType = 4,
    /// A required out-parameter was null.
    NullPointer = 5,
    /// Any other failure; details are in the log.
    Internal = 6,
}

impl BridgeStatus {
    /// Returns `true` for [`BridgeStatus::Ok`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// A byte buffer that is about to cross, or has just come back across, the
/// boundary.
///
/// On the Rust side this is an ordinary owned allocation and is freed on drop.
/// Converting it with [`OwnedBuffer::into_raw_parts`] transfers ownership to
/// the host; the host must return the same pointer and length exactly once,
/// which is rebuilt with [`OwnedBuffer::from_raw_parts`] and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedBuffer {
    bytes: Box<[u8]>,
}

impl OwnedBuffer {
    /// Takes ownership of encoded bytes.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Number of bytes in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrows the buffer contents.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Hands the allocation to the host.
    ///
    /// The returned pointer is never null, even for an empty buffer. After
    /// this call nothing on the Rust side frees the memory; the host owns it
    /// until it passes both values back to the bridge's release function.
    #[must_use = "dropping the raw parts leaks the buffer"]
    pub fn into_raw_parts(self) -> (*mut u8, u64) {
        let len = self.bytes.len() as u64;
        let ptr = Box::into_raw(self.bytes).cast::<u8>();
        (ptr, len)
    }

    /// Takes back a buffer previously released with
    /// [`OwnedBuffer::into_raw_parts`].
    ///
    /// Returns `None` for a null pointer or a length that does not fit in
    /// `usize`.
    ///
    /// # Safety
    ///
    /// `ptr` and `len` must be exactly the pair returned by one call to
    /// [`OwnedBuffer::into_raw_parts`], and that pair must not have been
    /// passed to this function before. Passing any other pointer, a different
    /// length, or the same pair twice is undefined behavior.
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: u64) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        let len = usize::try_from(len).ok()?;
        let slice = std::ptr::slice_from_raw_parts_mut(ptr, len);
        // SAFETY: the caller guarantees the pair came from `into_raw_parts`,
        // which produced it from a `Box<[u8]>` of exactly `len` bytes.
        let bytes = unsafe { Box::from_raw(slice) };
        Some(Self { bytes })
    }
}

impl From<Vec<u8>> for OwnedBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}
