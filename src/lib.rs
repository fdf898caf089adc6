//! `seqring`: a bounded, lock-free circular queue that transfers
//! fixed-size byte records between producers and consumers by value.
//!
//! The core is the per-slot sequence-number protocol implemented in
//! [`queue`]; [`queue::Spsc`] and [`queue::Mpmc`] select the claim
//! algorithm at compile time. [`alloc::Allocator`] is the pluggable
//! memory provider backing the slot array.
//!
//! ```
//! use seqring::alloc::SystemAllocator;
//! use seqring::queue::SpscQueue;
//!
//! let q = SpscQueue::init(SystemAllocator, 4, 8).unwrap();
//! q.push(b"hello").unwrap();
//! let mut out = [0u8; 5];
//! q.pop(&mut out).unwrap();
//! assert_eq!(&out, b"hello");
//! ```

pub mod alloc;
pub mod error;
pub mod ffi;
pub mod queue;
pub mod slot;

pub use error::{PopError, PushError, QueueError, QueueSignal};
pub use queue::{ConsumerClaim, MpmcQueue, ProducerClaim, Queue, SpscQueue};
