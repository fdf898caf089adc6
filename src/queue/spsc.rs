//! Single-producer/single-consumer claim logic (spec §4.3). With exactly
//! one thread per role the cursor has no contention: load relaxed, check
//! the slot's `seq` acquire, and on match advance the cursor with a
//! relaxed store — no CAS loop. The per-slot acquire/release pair is the
//! same as MPMC; only the cursor update is simplified.

use super::{RawQueue, Variant};
use crate::alloc::Allocator;
use crate::error::QueueSignal;
use std::sync::atomic::Ordering::{Acquire, Relaxed};

/// Build-time marker selecting the SPSC claim algorithm.
pub struct Spsc;

impl Variant for Spsc {
    fn claim_producer<A: Allocator>(raw: &RawQueue<A>) -> Result<u32, QueueSignal> {
        let pos = raw.head.load(Relaxed);
        let seq = unsafe { &*raw.header(pos) }.seq.load(Acquire);
        let diff = (seq as i32).wrapping_sub(pos as i32);
        if diff == 0 {
            // The cursor store is not ordered relative to the in-slot
            // payload write that follows: the cursor is only a hint, and
            // fullness/emptiness is gated by `seq`, not by this store
            // (spec §9 open question).
            raw.head.store(pos.wrapping_add(1), Relaxed);
            Ok(pos)
        } else {
            // diff < 0: the consumer has not released this slot yet.
            // diff > 0 cannot happen with a single producer.
            debug_assert!(diff < 0, "SPSC producer cursor observed a seq ahead of itself");
            Err(QueueSignal::Full)
        }
    }

    fn claim_consumer<A: Allocator>(raw: &RawQueue<A>) -> Result<u32, QueueSignal> {
        let pos = raw.tail.load(Relaxed);
        let expected = pos.wrapping_add(1);
        let seq = unsafe { &*raw.header(pos) }.seq.load(Acquire);
        let diff = (seq as i32).wrapping_sub(expected as i32);
        if diff == 0 {
            raw.tail.store(pos.wrapping_add(1), Relaxed);
            Ok(pos)
        } else {
            debug_assert!(diff < 0, "SPSC consumer cursor observed a seq ahead of itself");
            Err(QueueSignal::Empty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::SystemAllocator;
    use crate::queue::SpscQueue;

    #[test]
    fn fills_to_capacity_then_reports_full() {
        let q = SpscQueue::init(SystemAllocator, 4, 8).unwrap();
        for _ in 0..4 {
            q.push(b"x").unwrap();
        }
        assert!(matches!(
            q.push_claim().err(),
            Some(QueueSignal::Full)
        ));
    }

    #[test]
    fn one_pop_reopens_exactly_one_push() {
        let q = SpscQueue::init(SystemAllocator, 4, 8).unwrap();
        for _ in 0..4 {
            q.push(b"x").unwrap();
        }
        let mut buf = [0u8; 1];
        q.pop(&mut buf).unwrap();
        q.push(b"y").unwrap();
        assert!(matches!(q.push_claim().err(), Some(QueueSignal::Full)));
    }

    #[test]
    fn empty_pop_returns_empty() {
        let q = SpscQueue::init(SystemAllocator, 4, 8).unwrap();
        assert!(matches!(q.pop_claim().err(), Some(QueueSignal::Empty)));
    }
}
