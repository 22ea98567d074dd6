//! Observation Buffer
//!
//! A bounded, thread-shared mirror of the pre- and post-filter audio used by
//! monitoring consumers (level meters, external visualizers). The real-time
//! producer appends copies of each block; any consumer can take a
//! concatenated snapshot at its own pace.
//!
//! Both sides go through one mutex. The producer's hold time is bounded by
//! two block copies plus eviction, and the consumer never removes data -
//! eviction is purely capacity-driven, oldest blocks first.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// How much audio the buffer retains per channel, in seconds
pub const DEFAULT_BUFFER_SECONDS: u32 = 3;

/// One channel's bounded block queue with a running sample count.
#[derive(Default)]
struct ChannelBuffer {
    blocks: VecDeque<Vec<f32>>,
    samples: usize,
}

impl ChannelBuffer {
    fn push(&mut self, block: &[f32], capacity: usize) {
        self.blocks.push_back(block.to_vec());
        self.samples += block.len();

        // Evict oldest blocks past capacity, but always keep the newest so a
        // single oversized block is not silently discarded.
        while self.samples > capacity && self.blocks.len() > 1 {
            if let Some(oldest) = self.blocks.pop_front() {
                self.samples -= oldest.len();
            }
        }
    }

    fn concatenated(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.samples);
        for block in &self.blocks {
            out.extend_from_slice(block);
        }
        out
    }
}

#[derive(Default)]
struct Inner {
    pre: ChannelBuffer,
    post: ChannelBuffer,
}

/// Mutex-protected pre/post audio mirror.
pub struct ObservationBuffer {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl ObservationBuffer {
    /// Buffer retaining `buffer_seconds` of audio per channel at
    /// `sample_rate`.
    pub fn new(sample_rate: u32, buffer_seconds: u32) -> Self {
        Self {
            capacity: (sample_rate * buffer_seconds) as usize,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Append copies of one pre-filter and one post-filter block.
    ///
    /// Called from the real-time thread; the lock is held only while the two
    /// blocks are copied in and stale blocks are dropped.
    pub fn push(&self, pre: &[f32], post: &[f32]) {
        let mut inner = self.inner.lock();
        inner.pre.push(pre, self.capacity);
        inner.post.push(post, self.capacity);
    }

    /// Concatenate everything currently buffered, per channel, in arrival
    /// order - without consuming it.
    ///
    /// Consecutive snapshots overlap by design; this is approximate
    /// visualization data, not exact sample accounting.
    pub fn snapshot(&self) -> (Vec<f32>, Vec<f32>) {
        let inner = self.inner.lock();
        (inner.pre.concatenated(), inner.post.concatenated())
    }

    /// Retention capacity per channel, in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let buffer = ObservationBuffer::new(44100, 3);
        let (pre, post) = buffer.snapshot();
        assert!(pre.is_empty());
        assert!(post.is_empty());
    }

    #[test]
    fn test_push_then_snapshot_preserves_order() {
        let buffer = ObservationBuffer::new(44100, 3);
        buffer.push(&[1.0, 2.0], &[10.0, 20.0]);
        buffer.push(&[3.0], &[30.0]);

        let (pre, post) = buffer.snapshot();
        assert_eq!(pre, vec![1.0, 2.0, 3.0]);
        assert_eq!(post, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_snapshot_does_not_consume() {
        let buffer = ObservationBuffer::new(44100, 3);
        buffer.push(&[1.0], &[2.0]);

        let first = buffer.snapshot();
        let second = buffer.snapshot();
        assert_eq!(first, second);
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        // Tiny capacity: 4 samples per channel.
        let buffer = ObservationBuffer::new(4, 1);
        buffer.push(&[1.0, 1.0], &[0.0, 0.0]);
        buffer.push(&[2.0, 2.0], &[0.0, 0.0]);
        buffer.push(&[3.0, 3.0], &[0.0, 0.0]);

        let (pre, _) = buffer.snapshot();
        assert_eq!(pre, vec![2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_oversized_block_is_kept() {
        let buffer = ObservationBuffer::new(2, 1);
        buffer.push(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0]);

        let (pre, post) = buffer.snapshot();
        assert_eq!(pre, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(post, vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;

        let buffer = Arc::new(ObservationBuffer::new(44100, 1));
        let producer = Arc::clone(&buffer);

        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                let block = vec![i as f32; 64];
                producer.push(&block, &block);
            }
        });

        // Snapshot concurrently with the producer; must never panic or tear.
        for _ in 0..50 {
            let (pre, post) = buffer.snapshot();
            assert_eq!(pre.len(), post.len());
        }

        handle.join().unwrap();
        let (pre, post) = buffer.snapshot();
        assert_eq!(pre.len(), 100 * 64);
        assert_eq!(pre.len(), post.len());
    }
}
