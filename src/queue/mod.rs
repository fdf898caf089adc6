//! The public claim/publish API and the shared ring-buffer plumbing both
//! specializations build on. The per-slot sequence protocol itself (the
//! `diff` dispatch) lives in [`mpmc`] and [`spsc`]; this module owns
//! addressing, cache-line-separated cursors, and the `Claim` guards.

mod mpmc;
mod spsc;

pub use mpmc::Mpmc;
pub use spsc::Spsc;

use crate::alloc::Allocator;
use crate::error::{PopError, PushError, QueueError, QueueSignal};
use crate::slot::{self, SlotHeader};
use crossbeam_utils::CachePadded;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering::Relaxed};

/// Selects the claim algorithm at compile time (spec §9, option (a)): no
/// runtime branch, two monomorphized `Queue<V, A>` instantiations.
pub trait Variant {
    /// Attempt to claim the next producer position. `Err(Full)` on
    /// non-blocking backpressure (spec §4.2, §4.5).
    fn claim_producer<A: Allocator>(raw: &RawQueue<A>) -> Result<u32, QueueSignal>;

    /// Attempt to claim the next consumer position. `Err(Empty)` when
    /// nothing is published yet.
    fn claim_consumer<A: Allocator>(raw: &RawQueue<A>) -> Result<u32, QueueSignal>;
}

/// The slot array, cursors, and allocator handle, generic over the
/// backing [`Allocator`] (spec §3). Not parameterized by [`Variant`]
/// itself so both specializations share one addressing implementation.
pub struct RawQueue<A: Allocator> {
    base: NonNull<u8>,
    capacity: u32,
    mask: u32,
    slot_size: u32,
    stride: usize,
    region_len: usize,
    region_align: usize,
    head: CachePadded<AtomicU32>,
    tail: CachePadded<AtomicU32>,
    allocator: A,
    full_warned: AtomicBool,
}

// Safety: all cross-thread access is mediated by the acquire/release pair
// on each slot's `seq`, exactly as the sequence protocol requires (spec §4.2).
unsafe impl<A: Allocator> Send for RawQueue<A> {}
unsafe impl<A: Allocator> Sync for RawQueue<A> {}

impl<A: Allocator> RawQueue<A> {
    fn new(allocator: A, capacity: u32, slot_size: u32) -> Result<Self, QueueError> {
        if slot_size == 0 {
            return Err(QueueError::ZeroSlotSize);
        }
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(QueueError::InvalidCapacity(capacity));
        }

        let stride = slot::stride_for(slot_size);
        let region_len = stride * capacity as usize;
        let region_align = slot::HEADER_ALIGN;

        let base = allocator.alloc(region_len, region_align).ok_or_else(|| {
            tracing::error!(size = region_len, align = region_align, "seqring: allocator returned null");
            QueueError::OutOfMemory { size: region_len, align: region_align }
        })?;

        let raw = Self {
            base,
            capacity,
            mask: capacity - 1,
            slot_size,
            stride,
            region_len,
            region_align,
            head: CachePadded::new(AtomicU32::new(0)),
            tail: CachePadded::new(AtomicU32::new(0)),
            allocator,
            full_warned: AtomicBool::new(false),
        };

        // Invariant 2 (spec §3): slot[i].seq = i for i in [0, capacity).
        for i in 0..capacity {
            unsafe { &*raw.header(i) }.seq.store(i, Relaxed);
        }

        tracing::debug!(capacity, slot_size, stride, "seqring: queue initialized");
        Ok(raw)
    }

    #[inline]
    fn header(&self, pos: u32) -> *mut SlotHeader {
        let index = pos & self.mask;
        unsafe { slot::header_at(self.base.as_ptr(), index, self.stride) }
    }

    #[inline]
    fn data(&self, pos: u32) -> *mut u8 {
        let index = pos & self.mask;
        unsafe { slot::data_at(self.base.as_ptr(), index, self.stride) }
    }

    #[inline]
    fn data_slice_mut<'a>(&'a self, pos: u32) -> &'a mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.data(pos), self.slot_size as usize) }
    }

    #[inline]
    fn data_slice<'a>(&'a self, pos: u32) -> &'a [u8] {
        unsafe { std::slice::from_raw_parts(self.data(pos), self.slot_size as usize) }
    }

    /// Producer-side release store: the slot becomes visible to consumers
    /// (spec §4.2 "Publish").
    #[inline]
    fn publish(&self, pos: u32) {
        unsafe { &*self.header(pos) }
            .seq
            .store(pos.wrapping_add(1), std::sync::atomic::Ordering::Release);
    }

    /// Consumer-side release store: the slot is returned to the producer
    /// pool at the next generation (spec §4.2 "Release").
    #[inline]
    fn release(&self, pos: u32) {
        unsafe { &*self.header(pos) }.seq.store(
            pos.wrapping_add(self.capacity),
            std::sync::atomic::Ordering::Release,
        );
        // A slot just opened up: let the next sustained `Full` stretch warn again.
        self.full_warned.store(false, Relaxed);
    }

    /// Emits the first-full `tracing::warn!` once per stretch of
    /// backpressure (spec §7.3): a queue under legitimate backpressure
    /// must not become a logging bottleneck, so this only fires again
    /// after a `release` has made room.
    #[inline]
    fn warn_first_full(&self) {
        if self
            .full_warned
            .compare_exchange(false, true, Relaxed, Relaxed)
            .is_ok()
        {
            tracing::warn!(capacity = self.capacity, "seqring: queue is full");
        }
    }
}

impl<A: Allocator> Drop for RawQueue<A> {
    fn drop(&mut self) {
        self.allocator
            .dealloc(self.base, self.region_len, self.region_align);
    }
}

/// A bounded, lock-free queue of fixed-size byte records (spec §1, §3).
///
/// `V` selects the claim algorithm at compile time ([`Spsc`] or [`Mpmc`]);
/// `A` selects the backing [`Allocator`]. See [`SpscQueue`] and
/// [`MpmcQueue`] for the common instantiations.
pub struct Queue<V: Variant, A: Allocator> {
    raw: RawQueue<A>,
    _variant: PhantomData<V>,
}

/// Single-producer/single-consumer specialization (spec §4.3).
pub type SpscQueue<A> = Queue<Spsc, A>;
/// Multi-producer/multi-consumer specialization (spec §4.4).
pub type MpmcQueue<A> = Queue<Mpmc, A>;

impl<V: Variant, A: Allocator> Queue<V, A> {
    /// Creates a queue with `capacity` slots (a power of two >= 2) of
    /// `slot_size` bytes each, backed by `allocator` (spec §4.5 `init`).
    pub fn init(allocator: A, capacity: u32, slot_size: u32) -> Result<Self, QueueError> {
        Ok(Self {
            raw: RawQueue::new(allocator, capacity, slot_size)?,
            _variant: PhantomData,
        })
    }

    /// Number of slots in the queue.
    pub fn capacity(&self) -> u32 {
        self.raw.capacity
    }

    /// Byte width of each slot's payload.
    pub fn slot_size(&self) -> u32 {
        self.raw.slot_size
    }

    /// Reserves a slot for writing and returns a guard exposing the
    /// payload area in place (spec §4.5 `push_claim`). `Err(Full)` if no
    /// slot is currently available; never blocks.
    pub fn push_claim(&self) -> Result<ProducerClaim<'_, V, A>, QueueSignal> {
        match V::claim_producer(&self.raw) {
            Ok(pos) => Ok(ProducerClaim { queue: self, pos }),
            Err(QueueSignal::Full) => {
                self.raw.warn_first_full();
                Err(QueueSignal::Full)
            }
            Err(QueueSignal::Empty) => unreachable!("claim_producer never returns Empty"),
        }
    }

    /// Reserves a published slot for reading and returns a guard exposing
    /// the payload area in place (spec §4.5 `pop_claim`). `Err(Empty)` if
    /// nothing has been published yet; never blocks.
    pub fn pop_claim(&self) -> Result<ConsumerClaim<'_, V, A>, QueueSignal> {
        let pos = V::claim_consumer(&self.raw)?;
        Ok(ConsumerClaim { queue: self, pos })
    }

    /// Copies `src` into a freshly claimed slot and publishes it (spec
    /// §4.5 `push`). `src.len()` may be smaller than `slot_size`; tail
    /// bytes are unspecified. Rejects `src.len() > slot_size` as a
    /// programmer error, distinct from the non-error `Full` signal.
    pub fn push(&self, src: &[u8]) -> Result<(), PushError> {
        if src.len() > self.raw.slot_size as usize {
            return Err(PushError::SourceTooLarge {
                len: src.len(),
                slot_size: self.raw.slot_size,
            });
        }
        let mut claim = self.push_claim().map_err(PushError::from)?;
        claim.as_mut_slice()[..src.len()].copy_from_slice(src);
        claim.publish();
        Ok(())
    }

    /// Claims a published slot, copies `dst.len()` bytes out of it, and
    /// releases it (spec §4.5 `pop`). Rejects `dst.len() > slot_size`.
    pub fn pop(&self, dst: &mut [u8]) -> Result<(), PopError> {
        if dst.len() > self.raw.slot_size as usize {
            return Err(PopError::DestTooLarge {
                len: dst.len(),
                slot_size: self.raw.slot_size,
            });
        }
        let mut claim = self.pop_claim().map_err(PopError::from)?;
        dst.copy_from_slice(&claim.as_slice()[..dst.len()]);
        claim.release();
        Ok(())
    }
}

/// Guard returned by [`Queue::push_claim`]. Exposes the claimed slot's
/// payload bytes for in-place construction; must be consumed by
/// [`publish`](Self::publish) to make the write visible to consumers.
#[must_use = "a producer claim must be published, or the slot is never returned to consumers"]
pub struct ProducerClaim<'q, V: Variant, A: Allocator> {
    queue: &'q Queue<V, A>,
    pos: u32,
}

impl<'q, V: Variant, A: Allocator> ProducerClaim<'q, V, A> {
    /// The claimed slot's payload bytes, writable in place.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.queue.raw.data_slice_mut(self.pos)
    }

    /// Position this claim occupies (the producer-side free-running
    /// cursor value, spec "Position").
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Makes the write visible to consumers (spec §4.5 `push_publish`).
    pub fn publish(self) {
        self.queue.raw.publish(self.pos);
    }
}

/// Guard returned by [`Queue::pop_claim`]. Exposes the claimed slot's
/// payload bytes for in-place reading; must be consumed by
/// [`release`](Self::release) to return the slot to producers.
#[must_use = "a consumer claim must be released, or the slot is never returned to producers"]
pub struct ConsumerClaim<'q, V: Variant, A: Allocator> {
    queue: &'q Queue<V, A>,
    pos: u32,
}

impl<'q, V: Variant, A: Allocator> ConsumerClaim<'q, V, A> {
    /// The claimed slot's payload bytes, readable in place.
    pub fn as_slice(&self) -> &[u8] {
        self.queue.raw.data_slice(self.pos)
    }

    /// Position this claim occupies (the consumer-side free-running
    /// cursor value, spec "Position").
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Returns the slot to the producer pool at the next generation
    /// (spec §4.5 `pop_release`).
    pub fn release(self) {
        self.queue.raw.release(self.pos);
    }
}
