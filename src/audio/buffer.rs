//! Bounded FIFO between the capture callback and the reader.
//!
//! When the reader falls behind, new samples **overwrite** the oldest data
//! so the queue always holds the most recent `capacity` samples.  Overwritten
//! samples are counted in [`SampleQueue::overrun`].
//!
//! # Example
//!
//! ```rust
//! use speech_recognizer::audio::SampleQueue;
//!
//! let mut q = SampleQueue::new(4);
//! q.push_slice(&[1_i16, 2, 3, 4, 5]); // oldest sample dropped
//!
//! let mut out = [0_i16; 3];
//! assert_eq!(q.pop_into(&mut out), 3);
//! assert_eq!(out, [2, 3, 4]);
//! assert_eq!(q.len(), 1);
//! ```

use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// SampleQueue
// ---------------------------------------------------------------------------

/// Fixed-capacity sample FIFO with overwrite-oldest overflow.
#[derive(Debug)]
pub struct SampleQueue<T> {
    samples: VecDeque<T>,
    capacity: usize,
    overrun: u64,
}

impl<T: Copy> SampleQueue<T> {
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "SampleQueue capacity must be > 0");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            overrun: 0,
        }
    }

    /// Append `data`, discarding the oldest samples beyond `capacity`.
    pub fn push_slice(&mut self, data: &[T]) {
        // Only the newest `capacity` samples of `data` can survive.
        let keep = &data[data.len().saturating_sub(self.capacity)..];
        self.overrun += (data.len() - keep.len()) as u64;

        let excess = (self.samples.len() + keep.len()).saturating_sub(self.capacity);
        self.samples.drain(..excess);
        self.overrun += excess as u64;

        self.samples.extend(keep.iter().copied());
    }

    /// Move up to `out.len()` samples, oldest first, into `out`.
    pub fn pop_into(&mut self, out: &mut [T]) -> usize {
        let n = out.len().min(self.samples.len());
        for (slot, sample) in out.iter_mut().zip(self.samples.drain(..n)) {
            *slot = sample;
        }
        n
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of samples discarded because the queue was full.
    pub fn overrun(&self) -> u64 {
        self.overrun
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
