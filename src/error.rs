//! Error taxonomy (spec §7). `QueueError` covers `init`-time failures.
//! `QueueSignal` covers the non-error `Full`/`Empty` flow-control returns.
//! `PushError`/`PopError` cover the programmer-error argument checks on the
//! copy-in/copy-out convenience API, kept distinct from `QueueSignal` so a
//! caller can never mistake a contract violation for ordinary backpressure.

use thiserror::Error;

/// Failures that can occur while constructing a queue.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("capacity {0} is not a power of two >= 2")]
    InvalidCapacity(u32),

    #[error("slot_size must be nonzero")]
    ZeroSlotSize,

    #[error("allocator returned null for a {size}-byte, {align}-align request")]
    OutOfMemory { size: usize, align: usize },
}

/// Non-error flow-control signal from a claim attempt (spec §4.5, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSignal {
    /// No free slot is currently available to a producer.
    Full,
    /// No published slot is currently available to a consumer.
    Empty,
}

/// Errors from the `push` convenience wrapper.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("source buffer of {len} bytes exceeds slot_size {slot_size}")]
    SourceTooLarge { len: usize, slot_size: u32 },

    #[error("queue is full")]
    Full,
}

/// Errors from the `pop` convenience wrapper.
#[derive(Error, Debug)]
pub enum PopError {
    #[error("destination buffer of {len} bytes exceeds slot_size {slot_size}")]
    DestTooLarge { len: usize, slot_size: u32 },

    #[error("queue is empty")]
    Empty,
}

impl From<QueueSignal> for PushError {
    fn from(signal: QueueSignal) -> Self {
        debug_assert_eq!(signal, QueueSignal::Full);
        PushError::Full
    }
}

impl From<QueueSignal> for PopError {
    fn from(signal: QueueSignal) -> Self {
        debug_assert_eq!(signal, QueueSignal::Empty);
        PopError::Empty
    }
}
