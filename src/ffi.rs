//! C ABI surface (spec §6.3), mirroring the teacher's `ffi.rs`: an opaque
//! handle plus a stable integer sentinel return, generalized from
//! channel-messaging (`dmxp_producer_new`/`dmxp_consumer_receive`) to the
//! generic claim/publish queue. The active specialization (SPSC or MPMC)
//! is chosen at compile time by the `spsc`/`mpmc` Cargo features (spec §6.4).

use crate::alloc::SystemAllocator;
use crate::error::{PopError, PushError, QueueError};
use crate::queue::{MpmcQueue, SpscQueue};
use std::ptr;

#[cfg(all(feature = "mpmc", not(feature = "spsc")))]
type ActiveQueue = MpmcQueue<SystemAllocator>;
#[cfg(all(feature = "spsc", not(feature = "mpmc")))]
type ActiveQueue = SpscQueue<SystemAllocator>;
#[cfg(all(feature = "spsc", feature = "mpmc"))]
type ActiveQueue = MpmcQueue<SystemAllocator>;

pub const SEQRING_OK: i32 = 0;
pub const SEQRING_ERR_NULL_POINTER: i32 = -1;
pub const SEQRING_ERR_INVALID_ARG: i32 = -2;
pub const SEQRING_ERR_ALLOC_FAILED: i32 = -3;
pub const SEQRING_ERR_FULL: i32 = -4;
pub const SEQRING_ERR_EMPTY: i32 = -5;
pub const SEQRING_ERR_INTERNAL: i32 = -6;

/// Opaque handle to a queue instance, owned by the caller across the FFI
/// boundary until passed to [`seqring_free`].
pub struct QueueHandle {
    inner: ActiveQueue,
}

/// Creates a queue with `capacity` slots of `slot_size` bytes each.
///
/// # Returns
/// A pointer to a [`QueueHandle`], or null on invalid arguments or
/// allocation failure (spec §7 "Out of memory").
#[no_mangle]
pub extern "C" fn seqring_init(capacity: u32, slot_size: u32) -> *mut QueueHandle {
    match ActiveQueue::init(SystemAllocator, capacity, slot_size) {
        Ok(inner) => Box::into_raw(Box::new(QueueHandle { inner })),
        Err(QueueError::InvalidCapacity(_)) | Err(QueueError::ZeroSlotSize) => {
            tracing::error!(capacity, slot_size, "seqring_init: invalid argument");
            ptr::null_mut()
        }
        Err(QueueError::OutOfMemory { .. }) => {
            tracing::error!(capacity, slot_size, "seqring_init: allocation failed");
            ptr::null_mut()
        }
    }
}

/// Copies `len` bytes from `data` into the queue and publishes them (spec
/// §4.5 `push`).
///
/// # Safety
/// `handle` must be a live pointer from [`seqring_init`]; `data` must be
/// valid for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn seqring_push(handle: *mut QueueHandle, data: *const u8, len: usize) -> i32 {
    if handle.is_null() || data.is_null() {
        return SEQRING_ERR_NULL_POINTER;
    }
    let handle = &*handle;
    let slice = std::slice::from_raw_parts(data, len);
    match handle.inner.push(slice) {
        Ok(()) => SEQRING_OK,
        Err(PushError::Full) => SEQRING_ERR_FULL,
        Err(PushError::SourceTooLarge { .. }) => SEQRING_ERR_INVALID_ARG,
    }
}

/// Claims a published slot, copies up to `*out_len` bytes into `out_buf`,
/// and releases it (spec §4.5 `pop`). On entry `*out_len` is the capacity
/// of `out_buf`; on success it is set to the number of bytes written.
///
/// # Safety
/// `handle` must be a live pointer from [`seqring_init`]; `out_buf` must
/// be valid for `*out_len` bytes; `out_len` must be valid for one read
/// and one write.
#[no_mangle]
pub unsafe extern "C" fn seqring_pop(
    handle: *mut QueueHandle,
    out_buf: *mut u8,
    out_len: *mut usize,
) -> i32 {
    if handle.is_null() || out_len.is_null() || out_buf.is_null() {
        return SEQRING_ERR_NULL_POINTER;
    }
    let handle = &*handle;
    let cap = *out_len;
    let slot_size = handle.inner.slot_size() as usize;
    let to_read = cap.min(slot_size);
    let dst = std::slice::from_raw_parts_mut(out_buf, to_read);
    match handle.inner.pop(dst) {
        Ok(()) => {
            *out_len = to_read;
            SEQRING_OK
        }
        Err(PopError::Empty) => SEQRING_ERR_EMPTY,
        Err(PopError::DestTooLarge { .. }) => SEQRING_ERR_INVALID_ARG,
    }
}

/// Releases a queue handle and its backing slot array.
///
/// # Safety
/// `handle` must be a live pointer from [`seqring_init`], or null.
#[no_mangle]
pub unsafe extern "C" fn seqring_free(handle: *mut QueueHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}
