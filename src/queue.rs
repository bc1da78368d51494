//! Bounded transport queue between RT producers and the drain thread.
//!
//! # Architecture
//!
//! ```text
//! RT Thread              TransportQueue              Drain Thread
//! ──────────             ──────────────              ────────────
//!
//! push() ──────────▶ [M0][M1][M2]...[Mc-1] ──────▶ pop()
//! non-blocking         fixed slots, no growth       sleeps between polls
//! drop-new if full     acquire/release indices
//! ```
//!
//! # Rules
//!
//! - Capacity is fixed at construction, storage is allocated exactly once
//! - Push on a full queue drops the NEW message and counts it
//! - Pop on an empty queue returns immediately
//! - A slot becomes visible to the consumer only after it is fully written
//!
//! # Producers
//!
//! The queue is designed for one producer. Push is guarded by a spin lock so
//! that misuse stays memory-safe: without the `multi-producer` feature the
//! lock is only *tried* and a contended push drops its message; with the
//! feature a contended push spins for the duration of one slot write.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Default queue capacity (number of message slots).
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// Lock-free bounded FIFO of `C` copyable slots.
pub struct TransportQueue<T: Copy, const C: usize = DEFAULT_QUEUE_SIZE> {
    slots: Box<[UnsafeCell<T>]>,
    /// Next slot to write (monotonically increasing, wraps via mask).
    write_idx: AtomicUsize,
    /// Next slot to read (monotonically increasing, wraps via mask).
    read_idx: AtomicUsize,
    dropped: AtomicU32,
    push_lock: spin::Mutex<()>,
    pop_lock: spin::Mutex<()>,
}

// SAFETY: slot access is serialized by push_lock (writers) and pop_lock
// (reader), and a slot is never written and read at the same time because the
// acquire/release index protocol keeps the producer out of unread slots and
// the consumer out of unpublished ones.
unsafe impl<T: Copy + Send, const C: usize> Sync for TransportQueue<T, C> {}
unsafe impl<T: Copy + Send, const C: usize> Send for TransportQueue<T, C> {}

impl<T: Copy + Default, const C: usize> TransportQueue<T, C> {
    /// Create an empty queue, allocating all `C` slots up front.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not a power of two.
    pub fn new() -> Self {
        assert!(C.is_power_of_two(), "Queue capacity must be power of 2");

        Self {
            slots: (0..C).map(|_| UnsafeCell::new(T::default())).collect(),
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
            push_lock: spin::Mutex::new(()),
            pop_lock: spin::Mutex::new(()),
        }
    }
}

impl<T: Copy, const C: usize> TransportQueue<T, C> {
    const MASK: usize = C - 1;

    /// Push a copy of `item`.
    ///
    /// Returns `true` if queued, `false` if dropped (queue full).
    #[inline]
    pub fn push(&self, item: &T) -> bool {
        self.push_with(|slot| *slot = *item)
    }

    /// Fill the next free slot in place.
    ///
    /// `fill` runs only when a slot is available, so a full queue costs no
    /// formatting work. If `fill` panics the slot stays unpublished.
    ///
    /// # Timing
    ///
    /// O(1) plus whatever `fill` does. Never blocks, never allocates.
    #[inline]
    pub fn push_with<F>(&self, fill: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        #[cfg(feature = "multi-producer")]
        let _guard = self.push_lock.lock();
        #[cfg(not(feature = "multi-producer"))]
        let Some(_guard) = self.push_lock.try_lock() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= C {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: push_lock makes us the only writer, and the slot at `write`
        // is not visible to the consumer until write_idx is published below.
        unsafe {
            fill(&mut *self.slots[write & Self::MASK].get());
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Remove the oldest message.
    ///
    /// Returns `None` if empty (or if another thread is popping right now).
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let mut out = None;
        self.pop_with(|item| out = Some(*item));
        out
    }

    /// Hand the oldest message to `consume` in place, then release its slot.
    ///
    /// Returns `false` if there was nothing to consume.
    #[inline]
    pub fn pop_with<F>(&self, consume: F) -> bool
    where
        F: FnOnce(&T),
    {
        let Some(_guard) = self.pop_lock.try_lock() else {
            return false;
        };

        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return false;
        }

        // SAFETY: pop_lock makes us the only reader; the Acquire load above
        // pairs with the producer's Release store, so the slot is fully written.
        unsafe {
            consume(&*self.slots[read & Self::MASK].get());
        }

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        true
    }

    /// Number of messages waiting to be popped.
    #[inline]
    pub fn len(&self) -> usize {
        let read = self.read_idx.load(Ordering::Acquire);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= C
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        C
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter, returning the previous value.
    #[inline]
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

impl<T: Copy + Default, const C: usize> Default for TransportQueue<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_basic() {
        let queue = TransportQueue::<u32, 16>::new();

        assert!(queue.is_empty());
        assert!(queue.push(&7));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(7));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_full_drops_new() {
        let queue = TransportQueue::<u32, 4>::new();

        assert!(queue.push(&1));
        assert!(queue.push(&2));
        assert!(queue.push(&3));
        assert!(queue.push(&4));
        assert!(queue.is_full());

        // Should drop
        assert!(!queue.push(&5));
        assert_eq!(queue.dropped(), 1);

        // Existing contents untouched
        assert_eq!(queue.pop(), Some(1));
        assert!(queue.push(&6));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(4));
        assert_eq!(queue.pop(), Some(6));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_push_with_skips_fill_when_full() {
        let queue = TransportQueue::<u32, 2>::new();
        assert!(queue.push(&1));
        assert!(queue.push(&2));

        let mut called = false;
        assert!(!queue.push_with(|_| called = true));
        assert!(!called);
    }

    #[test]
    fn test_pop_with_in_place() {
        let queue = TransportQueue::<[u8; 4], 4>::new();
        assert!(queue.push_with(|slot| slot.copy_from_slice(b"abcd")));

        let mut seen = [0u8; 4];
        assert!(queue.pop_with(|slot| seen = *slot));
        assert_eq!(&seen, b"abcd");
        assert!(!queue.pop_with(|_| panic!("queue should be empty")));
    }

    #[test]
    fn test_take_dropped_resets() {
        let queue = TransportQueue::<u8, 1>::new();
        assert!(queue.push(&1));
        assert!(!queue.push(&2));
        assert!(!queue.push(&3));
        assert_eq!(queue.take_dropped(), 2);
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn test_wrap_around_many_times() {
        let queue = TransportQueue::<usize, 8>::new();
        for i in 0..1000 {
            assert!(queue.push(&i));
            assert_eq!(queue.pop(), Some(i));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_spsc_concurrent_fifo() {
        use std::sync::Arc;
        use std::thread;

        let queue = Arc::new(TransportQueue::<u64, 64>::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut next = 0u64;
                while next < 10_000 {
                    if queue.push(&next) {
                        next += 1;
                    } else {
                        thread::yield_now();
                    }
                }
            })
        };

        let mut expected = 0u64;
        while expected < 10_000 {
            match queue.pop() {
                Some(value) => {
                    assert_eq!(value, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_producers_account_for_every_push() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;
        use std::thread;

        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 2_000;

        let queue = Arc::new(TransportQueue::<usize, 64>::new());
        let done = Arc::new(AtomicBool::new(false));

        let consumer = {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut popped = 0usize;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    while queue.pop().is_some() {
                        popped += 1;
                    }
                    if finished {
                        return popped;
                    }
                    thread::yield_now();
                }
            })
        };

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || (0..PER_PRODUCER).filter(|i| queue.push(i)).count())
            })
            .collect();
        let accepted: usize = producers.into_iter().map(|p| p.join().unwrap()).sum();

        done.store(true, Ordering::Release);
        let popped = consumer.join().unwrap();

        assert_eq!(accepted + queue.dropped() as usize, PRODUCERS * PER_PRODUCER);
        assert_eq!(popped, accepted);
    }

    #[cfg(feature = "multi-producer")]
    #[test]
    fn test_multi_producer_spins_instead_of_dropping() {
        use std::sync::Arc;
        use std::thread;

        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 1_000;

        // Room for everything: only contention could drop
        let queue = Arc::new(TransportQueue::<(usize, usize), 4096>::new());
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for seq in 0..PER_PRODUCER {
                        assert!(queue.push(&(id, seq)));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(queue.dropped(), 0);
        assert_eq!(queue.len(), PRODUCERS * PER_PRODUCER);

        // Per-producer order survives the interleaving
        let mut next = [0usize; PRODUCERS];
        while let Some((id, seq)) = queue.pop() {
            assert_eq!(seq, next[id]);
            next[id] += 1;
        }
        assert!(next.iter().all(|&n| n == PER_PRODUCER));
    }

    #[test]
    #[should_panic(expected = "power of 2")]
    fn test_non_power_of_two_rejected() {
        let _ = TransportQueue::<u8, 3>::new();
    }
}
