//! Lock-free SPSC queue of ICSP words.
//!
//! # Architecture
//!
//! ```text
//! Producer task          WordQueue            esp_timer callback
//! ─────────────          ─────────            ──────────────────
//!
//! push() ────────────▶ [W0][W1][W2] ────────▶ pop() → serializer
//! never blocks           lock-free             O(1), never blocks
//! ```
//!
//! The timer callback may preempt the producer mid-push. Slots are only
//! published by the Release store of `write_idx`, so the consumer never
//! sees a half-written word.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use super::word::IcspWord;
use crate::config::WORD_QUEUE_SIZE;
use crate::error::IcspError;

/// Single producer, single consumer word ring.
pub struct WordQueue<const N: usize = WORD_QUEUE_SIZE> {
    slots: UnsafeCell<[IcspWord; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
}

// SAFETY: One producer owns write_idx, one consumer owns read_idx.
// A slot is written before write_idx is released and read after it is acquired.
unsafe impl<const N: usize> Sync for WordQueue<N> {}
unsafe impl<const N: usize> Send for WordQueue<N> {}

impl<const N: usize> WordQueue<N> {
    const MASK: usize = N - 1;

    /// Create a new empty queue.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Word queue size must be power of 2");

        Self {
            slots: UnsafeCell::new([IcspWord::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
        }
    }

    /// Queue a word (producer side only).
    ///
    /// Fails with `QueueFull` without touching the queue when no slot is free.
    #[inline]
    pub fn push(&self, word: IcspWord) -> Result<(), IcspError> {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            return Err(IcspError::QueueFull);
        }

        // SAFETY: Single producer. Slot at `write` is not visible to the
        // consumer until write_idx is released below.
        unsafe {
            (*self.slots.get())[(write as usize) & Self::MASK] = word;
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Build and queue a word from raw bits.
    #[inline]
    pub fn push_bits(&self, value: u32, len: u8) -> Result<(), IcspError> {
        self.push(IcspWord::new(value, len)?)
    }

    /// Take the oldest word (consumer side only).
    #[inline]
    pub fn pop(&self) -> Option<IcspWord> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        // SAFETY: Single consumer, slot was published by the Acquire above.
        let word = unsafe { (*self.slots.get())[(read as usize) & Self::MASK] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(word)
    }

    /// Number of words waiting.
    #[inline]
    pub fn remaining(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Acquire);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for WordQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_fifo() {
        let queue = WordQueue::<8>::new();

        queue.push_bits(1, 4).unwrap();
        queue.push_bits(2, 8).unwrap();
        assert_eq!(queue.remaining(), 2);

        assert_eq!(queue.pop().map(|w| w.value()), Some(1));
        assert_eq!(queue.pop().map(|w| w.value()), Some(2));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_full_rejects() {
        let queue = WordQueue::<4>::new();

        for i in 0..4 {
            queue.push_bits(i, 8).unwrap();
        }
        assert_eq!(queue.push_bits(99, 8), Err(IcspError::QueueFull));
        assert_eq!(queue.remaining(), 4);

        // Oldest word untouched
        assert_eq!(queue.pop().map(|w| w.value()), Some(0));
        assert!(queue.push_bits(4, 8).is_ok());
    }

    #[test]
    fn test_push_bits_validates_length() {
        let queue = WordQueue::<4>::new();
        assert_eq!(queue.push_bits(0, 40), Err(IcspError::InvalidLength));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_spsc_threads() {
        use std::sync::Arc;
        use std::thread;

        let queue = Arc::new(WordQueue::<16>::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    while queue.push_bits(i, 16).is_err() {
                        thread::yield_now();
                    }
                }
            })
        };

        let mut expected = 0u32;
        while expected < 1000 {
            if let Some(word) = queue.pop() {
                assert_eq!(word.value(), expected, "words must arrive in order");
                expected += 1;
            } else {
                thread::yield_now();
            }
        }

        producer.join().unwrap();
        assert!(queue.is_empty());
    }
}
