// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Producer-to-consumer sample buffering.
//!
//! [`SampleQueue`] hands blocks of audio samples from a producer (a decoder,
//! a synthesizer) to a consumer that pulls fixed-size buffers on its own
//! schedule. Blocks are queued whole in a [`RingDeque`]; a partially consumed
//! block is put back at the head with [`RingDeque::unshift`], so the consumer
//! never forces a copy of the whole queue.

use alloc::boxed::Box;

use crate::deque::RingDeque;

/// FIFO of sample blocks with underrun accounting.
#[derive(Debug, Default)]
pub struct SampleQueue {
    blocks: RingDeque<Box<[f32]>>,
    queued: usize,
    underruns: u64,
}

impl SampleQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue whose block ring starts with room for
    /// `blocks` entries.
    #[must_use]
    pub fn with_capacity(blocks: usize) -> Self {
        Self {
            blocks: RingDeque::with_stride(blocks),
            ..Self::default()
        }
    }

    /// Appends a block of samples. Empty blocks are ignored.
    pub fn push_block(&mut self, block: impl Into<Box<[f32]>>) {
        let block = block.into();
        if block.is_empty() {
            return;
        }
        self.queued += block.len();
        self.blocks.push(block);
    }

    /// Copies queued samples into `out` and returns how many were copied.
    ///
    /// If fewer than `out.len()` samples are queued, the rest of `out` is
    /// zero-filled and the shortfall is counted as an underrun.
    pub fn fill(&mut self, out: &mut [f32]) -> usize {
        let mut written = 0;
        while written < out.len() {
            let Some(block) = self.blocks.shift() else {
                break;
            };
            let take = block.len().min(out.len() - written);
            out[written..written + take].copy_from_slice(&block[..take]);
            written += take;
            if take < block.len() {
                self.blocks.unshift(Box::from(&block[take..]));
            }
        }
        self.queued -= written;

        if written < out.len() {
            out[written..].fill(0.0);
            self.underruns += 1;
        }
        written
    }

    /// Total samples waiting to be consumed.
    #[must_use]
    pub fn queued_samples(&self) -> usize {
        self.queued
    }

    /// Number of [`fill`](Self::fill) calls that ran short.
    #[must_use]
    pub fn underruns(&self) -> u64 {
        self.underruns
    }

    /// Returns `true` if no samples are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// Drops every queued block. The underrun count is kept.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.queued = 0;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn fill_spans_blocks_in_order() {
        let mut q = SampleQueue::new();
        q.push_block(vec![1.0_f32, 2.0]);
        q.push_block(vec![3.0_f32, 4.0, 5.0]);
        assert_eq!(q.queued_samples(), 5);

        let mut out = [0.0; 4];
        assert_eq!(q.fill(&mut out), 4);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(q.queued_samples(), 1);
        assert_eq!(q.underruns(), 0);
    }

    #[test]
    fn remainder_stays_ahead_of_later_blocks() {
        let mut q = SampleQueue::with_capacity(1);
        q.push_block(vec![1.0_f32, 2.0, 3.0]);
        let mut out = [0.0; 2];
        q.fill(&mut out);
        q.push_block(vec![4.0_f32]);

        let mut out = [0.0; 2];
        assert_eq!(q.fill(&mut out), 2);
        assert_eq!(out, [3.0, 4.0]);
        assert!(q.is_empty());
    }

    #[test]
    fn short_fill_zero_pads_and_counts_underrun() {
        let mut q = SampleQueue::new();
        q.push_block(vec![0.5_f32]);
        let mut out = [9.0; 3];
        assert_eq!(q.fill(&mut out), 1);
        assert_eq!(out, [0.5, 0.0, 0.0]);
        assert_eq!(q.underruns(), 1);

        assert_eq!(q.fill(&mut out), 0);
        assert_eq!(out, [0.0; 3]);
        assert_eq!(q.underruns(), 2);
    }

    #[test]
    fn empty_requests_and_blocks_are_no_ops() {
        let mut q = SampleQueue::new();
        q.push_block(Vec::<f32>::new());
        assert!(q.is_empty());
        assert_eq!(q.fill(&mut []), 0);
        assert_eq!(q.underruns(), 0, "an empty request is never short");
    }

    #[test]
    fn clear_drops_samples_but_keeps_underruns() {
        let mut q = SampleQueue::new();
        q.fill(&mut [0.0; 1]);
        q.push_block(vec![1.0_f32; 8]);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.queued_samples(), 0);
        assert_eq!(q.underruns(), 1);
    }
}
