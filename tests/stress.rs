//! Randomized MPMC stress test with a fastrand-seeded shape, mirroring
//! the randomized inputs used in the teacher's allocator stress tests
//! (`tests/allocator_multithreads_test.rs`).

use seqring::alloc::SystemAllocator;
use seqring::queue::MpmcQueue;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn randomized_producer_consumer_counts_deliver_everything_exactly_once() {
    fastrand::seed(0xC0FFEE);

    for trial in 0..6 {
        let producers = fastrand::usize(1..=6);
        let consumers = fastrand::usize(1..=6);
        let per_producer = fastrand::usize(200..=2_000);
        let capacity = *[2u32, 4, 8, 16, 32, 64].get(fastrand::usize(0..6)).unwrap();
        let total = producers * per_producer;

        let q: Arc<MpmcQueue<SystemAllocator>> =
            Arc::new(MpmcQueue::init(SystemAllocator, capacity, 8).unwrap());

        let mut handles = Vec::new();
        for p in 0..producers {
            let q = q.clone();
            handles.push(thread::spawn(move || {
                let base = p * per_producer;
                for i in 0..per_producer {
                    let seq = (base + i) as u64;
                    let bytes = seq.to_le_bytes();
                    loop {
                        if q.push(&bytes).is_ok() {
                            break;
                        }
                        std::hint::spin_loop();
                    }
                }
            }));
        }

        let drained = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(HashSet::with_capacity(total)));
        for _ in 0..consumers {
            let q = q.clone();
            let drained = drained.clone();
            let seen = seen.clone();
            handles.push(thread::spawn(move || {
                let mut buf = [0u8; 8];
                loop {
                    match q.pop(&mut buf) {
                        Ok(()) => {
                            let seq = u64::from_le_bytes(buf);
                            assert!(seen.lock().unwrap().insert(seq));
                            if drained.fetch_add(1, Ordering::AcqRel) + 1 == total {
                                return;
                            }
                        }
                        Err(_) => {
                            if drained.load(Ordering::Acquire) == total {
                                return;
                            }
                            std::hint::spin_loop();
                        }
                    }
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.len(),
            total,
            "trial {trial}: producers={producers} consumers={consumers} per_producer={per_producer} capacity={capacity}"
        );
    }
}
