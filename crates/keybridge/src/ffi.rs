//! Exported `extern "C"` functions.
//!
//! Every function resolves handles in [`registry`](crate::registry) and checks
//! capabilities before it writes through any pointer it was given. Failures
//! never touch host memory beyond zeroing the caller's out-parameters.
//!
//! ```c
//! uint32_t keybridge_abi_version(void);
//! uint8_t *keybridge_encoder_encode(uint64_t encoder, uint64_t data, uint64_t *out_size);
//! uint8_t  keybridge_encoder_try_encode(uint64_t encoder, uint64_t data,
//!                                       uint8_t **out_ptr, uint64_t *out_size);
//! void     keybridge_buffer_free(uint8_t *ptr, uint64_t len);  /* not free() */
//! uint64_t keybridge_symbol_key(const uint8_t *symbol, uint64_t len);
//! uint8_t  keybridge_partition(uint64_t partition_fn, uint64_t data, uint64_t *out_key);
//! uint8_t  keybridge_component_release(uint64_t handle);
//! bool     keybridge_component_exists(uint64_t handle);
//! uint8_t  keybridge_init_logging(void);
//! ```
//!
//! `uint8_t` results are [`BridgeStatus`] codes.
//!
//! Buffers returned by the encode functions are Rust allocations. Release
//! them only with `keybridge_buffer_free`, never with C `free()`: an empty
//! encoding is a non-null dangling pointer that owns no heap memory.

use std::{ptr, slice};

use keybridge_abi::{BRIDGE_ABI_VERSION, BridgeStatus, Handle, OwnedBuffer};
use keybridge_core::{
    Config, KEY_WIDTH, LoggingConfig, PartitionError, PartitionKey, derive_key_from_bytes,
    dispatch::{self, DispatchError},
};
use tracing::{debug, error, warn};

use crate::{StatusCode, init_logging, registry};

/// Returns [`BRIDGE_ABI_VERSION`] so a host can refuse a mismatched library.
#[unsafe(no_mangle)]
pub extern "C" fn keybridge_abi_version() -> u32 {
    BRIDGE_ABI_VERSION
}

/// Encodes the component under `data` with the encoder under `encoder`.
///
/// On success writes the length to `*out_size` and returns a pointer to that
/// many bytes, which the caller must release with [`keybridge_buffer_free`].
/// The buffer is not from the C allocator; passing it to `free()` is
/// undefined behavior. An empty encoding still returns a non-null pointer,
/// which is dangling and must also go through [`keybridge_buffer_free`].
///
/// On any failure (unknown handle, a component that is not an encoder, an
/// encoder error, or a null `out_size`) the typed cause is logged at `error`
/// level, `*out_size` is set to 0 when it is writable, and null is returned.
/// Use [`keybridge_encoder_try_encode`] to receive the cause as a status code.
///
/// # Safety
///
/// `out_size` must be null or valid for writing one `u64`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn keybridge_encoder_encode(
    encoder: Handle,
    data: Handle,
    out_size: *mut u64,
) -> *mut u8 {
    if out_size.is_null() {
        error!(encoder, data, "Encode called with null out_size");
        return ptr::null_mut();
    }

    match dispatch::encode(registry(), encoder, data) {
        Ok(bytes) => {
            let (buffer, len) = OwnedBuffer::from_vec(bytes).into_raw_parts();
            // SAFETY: `out_size` is non-null and the caller guarantees it is
            // writable.
            unsafe { out_size.write(len) };
            buffer
        }
        Err(err) => {
            error!(encoder, data, status = ?err.status(), error = %err, "Encode failed");
            // SAFETY: as above.
            unsafe { out_size.write(0) };
            ptr::null_mut()
        }
    }
}

/// Encodes like [`keybridge_encoder_encode`] but reports the outcome as a
/// [`BridgeStatus`].
///
/// On [`BridgeStatus::Ok`], `*out_ptr` and `*out_size` describe a buffer the
/// caller must release with [`keybridge_buffer_free`]. On any other status
/// they are set to null and 0. Returns [`BridgeStatus::NullPointer`] without
/// writing anything if either out-parameter is null.
///
/// # Safety
///
/// `out_ptr` and `out_size` must each be null or valid for one write of
/// their pointee type.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn keybridge_encoder_try_encode(
    encoder: Handle,
    data: Handle,
    out_ptr: *mut *mut u8,
    out_size: *mut u64,
) -> BridgeStatus {
    if out_ptr.is_null() || out_size.is_null() {
        return BridgeStatus::NullPointer;
    }

    let (buffer, len, status) = match dispatch::encode(registry(), encoder, data) {
        Ok(bytes) => {
            let (buffer, len) = OwnedBuffer::from_vec(bytes).into_raw_parts();
            (buffer, len, BridgeStatus::Ok)
        }
        Err(err) => {
            warn!(encoder, data, error = %err, "Encode failed");
            (ptr::null_mut(), 0, err.status())
        }
    };

    // SAFETY: both pointers are non-null and the caller guarantees they are
    // writable.
    unsafe {
        out_ptr.write(buffer);
        out_size.write(len);
    }
    status
}

/// Releases a buffer returned by an encode function.
///
/// Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a pointer returned by [`keybridge_encoder_encode`]
/// or [`keybridge_encoder_try_encode`], `len` must be the size reported with
/// it, and each buffer must be released exactly once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn keybridge_buffer_free(ptr: *mut u8, len: u64) {
    // SAFETY: forwarded from this function's contract.
    let buffer = unsafe { OwnedBuffer::from_raw_parts(ptr, len) };
    drop(buffer);
}

/// Computes the partition key of `len` symbol bytes at `symbol`.
///
/// Uses the same derivation as the partition function, so a host can
/// precompute keys. A null `symbol` is treated as the empty symbol.
///
/// # Safety
///
/// `symbol` must be null or valid for reading `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn keybridge_symbol_key(symbol: *const u8, len: u64) -> PartitionKey {
    if symbol.is_null() {
        return derive_key_from_bytes(&[]);
    }

    // Bytes past the key width never contribute, so only those are read.
    let readable = usize::try_from(len).map_or(KEY_WIDTH, |len| len.min(KEY_WIDTH));
    // SAFETY: the caller guarantees `len` readable bytes and `readable <= len`.
    let bytes = unsafe { slice::from_raw_parts(symbol, readable) };
    derive_key_from_bytes(bytes)
}

/// Partitions the message under `data` with the partition function under
/// `partition_fn`, writing the key to `*out_key`.
///
/// A message without a symbol is rejected with
/// [`BridgeStatus::UnsupportedMessageType`]; the process keeps running.
/// `*out_key` is only written on [`BridgeStatus::Ok`].
///
/// # Safety
///
/// `out_key` must be null or valid for writing one `u64`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn keybridge_partition(
    partition_fn: Handle,
    data: Handle,
    out_key: *mut u64,
) -> BridgeStatus {
    if out_key.is_null() {
        return BridgeStatus::NullPointer;
    }

    match dispatch::partition(registry(), partition_fn, data) {
        Ok(key) => {
            // SAFETY: `out_key` is non-null and the caller guarantees it is
            // writable.
            unsafe { out_key.write(key) };
            BridgeStatus::Ok
        }
        Err(
            err @ DispatchError::Partition {
                source: PartitionError::UnsupportedMessageType { .. },
                ..
            },
        ) => {
            debug!(partition_fn, data, error = %err, "Rejected message");
            err.status()
        }
        Err(err) => {
            warn!(partition_fn, data, error = %err, "Partition failed");
            err.status()
        }
    }
}

/// Removes the component under `handle`. The handle is never reissued.
#[unsafe(no_mangle)]
pub extern "C" fn keybridge_component_release(handle: Handle) -> BridgeStatus {
    match registry().remove(handle) {
        Ok(_) => BridgeStatus::Ok,
        Err(err) => {
            warn!(handle, error = %err, "Release failed");
            err.status()
        }
    }
}

/// Returns `true` if a component is registered under `handle`.
#[unsafe(no_mangle)]
pub extern "C" fn keybridge_component_exists(handle: Handle) -> bool {
    registry().contains(handle)
}

/// Installs the log subscriber from the resolved `keybridge.toml`.
///
/// Safe to call repeatedly. An unreadable config or an invalid level falls
/// back to the defaults, is logged, and returns [`BridgeStatus::Internal`].
#[unsafe(no_mangle)]
pub extern "C" fn keybridge_init_logging() -> BridgeStatus {
    let (logging, config_error) = match Config::load_resolved() {
        Ok(config) => (config.unwrap_or_default().logging, None),
        Err(err) => (LoggingConfig::default(), Some(err.to_string())),
    };

    let level_error = match init_logging(&logging) {
        Ok(_) => None,
        Err(err) => {
            let _ = init_logging(&LoggingConfig::default());
            Some(err.to_string())
        }
    };

    match config_error.or(level_error) {
        None => BridgeStatus::Ok,
        Some(error) => {
            warn!(error = %error, "Logging initialized with defaults");
            BridgeStatus::Internal
        }
    }
}
