// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-ended queue over a single growable array.
//!
//! [`RingDeque`] keeps its values in one `Vec`, split into three logical
//! regions:
//!
//! ```text
//!   vips (stack, top = front)     entries
//!   ┌───────┐                     ┌──────────── stride ────────────┬─ overflow ─┐
//!   │ v2 v1 │ ──► front ──►       │ ..  read ► a b c ► write  ..   │  d e f     │
//!   └───────┘                     └────────────────────────────────┴────────────┘
//! ```
//!
//! - The **ring window** is a classic circular buffer of `stride` slots.
//! - When the ring is full, pushes append to a contiguous **overflow region**
//!   past the ring. Once the ring drains, the overflow region is folded into
//!   an enlarged ring (`stride += overflow`) without moving any value.
//! - When the ring is full, front insertions go to the **VIP stack**, whose
//!   top is the logical head of the deque.
//!
//! All four end operations are amortized O(1), except [`pop`](RingDeque::pop)
//! when only VIP values remain (that path shifts the stack).
//!
//! # Destructive iteration
//!
//! Iterating a `RingDeque` **consumes** it: [`drain`](RingDeque::drain) and
//! [`IntoIterator`] both yield values by repeatedly shifting the head. There
//! is no borrowing iterator. Use [`head`](RingDeque::head) and
//! [`last`](RingDeque::last) to peek without removing.

use alloc::vec::Vec;
use core::fmt;
use core::iter::FusedIterator;

use crate::error::DequeError;

/// An amortized O(1) double-ended queue that grows by folding an overflow
/// tail back into its ring window.
///
/// Values come out of [`shift`](Self::shift) in the exact order they went in
/// through [`push`](Self::push), across any number of growth events.
/// [`unshift`](Self::unshift) inserts ahead of everything already queued.
///
/// Capacity only grows; [`clear`](Self::clear) is the only way to release
/// storage.
pub struct RingDeque<T> {
    /// Ring window in `[0, stride)`, overflow region in
    /// `[stride, stride + overflow)`. Slots outside the live regions hold
    /// `None`.
    entries: Vec<Option<T>>,
    /// Index of the ring head.
    read: usize,
    /// Index one past the ring tail.
    write: usize,
    /// Size of the ring window.
    stride: usize,
    /// Number of values inside the ring window.
    ring_len: usize,
    /// Number of values in the overflow region.
    overflow: usize,
    /// Front insertions made while the ring was full. Last element is the
    /// logical head.
    vips: Vec<T>,
}

impl<T> RingDeque<T> {
    /// Creates an empty deque with no ring window.
    ///
    /// The first values land in the overflow region and become the ring on
    /// the first [`shift`](Self::shift).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            read: 0,
            write: 0,
            stride: 0,
            ring_len: 0,
            overflow: 0,
            vips: Vec::new(),
        }
    }

    /// Creates an empty deque whose ring window starts with `stride` slots.
    #[must_use]
    pub fn with_stride(stride: usize) -> Self {
        let mut entries = Vec::with_capacity(stride);
        entries.resize_with(stride, || None);
        Self {
            entries,
            stride,
            ..Self::new()
        }
    }

    /// Returns the number of queued values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring_len + self.overflow + self.vips.len()
    }

    /// Returns `true` if no values are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring_len == 0 && self.overflow == 0 && self.vips.is_empty()
    }

    /// Returns the current size of the ring window.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    fn ring_has_room(&self) -> bool {
        self.ring_len < self.stride
    }

    /// Appends a value at the tail.
    pub fn push(&mut self, value: T) {
        // Once an overflow tail exists, every push must extend it so the
        // tail stays contiguous and ordered.
        if self.overflow == 0 && self.ring_has_room() {
            self.entries[self.write] = Some(value);
            self.write = (self.write + 1) % self.stride;
            self.ring_len += 1;
            return;
        }
        let idx = self.stride + self.overflow;
        if idx == self.entries.len() {
            self.entries.push(Some(value));
        } else {
            self.entries[idx] = Some(value);
        }
        self.overflow += 1;
    }

    /// Inserts a value at the head.
    pub fn unshift(&mut self, value: T) {
        // VIP values sit in front of the ring, so once any exist the new
        // head must go on top of them.
        if self.vips.is_empty() && self.ring_has_room() {
            self.read = (self.read + self.stride - 1) % self.stride;
            self.entries[self.read] = Some(value);
            self.ring_len += 1;
        } else {
            self.vips.push(value);
        }
    }

    /// Removes and returns the head, or `None` if the deque is empty.
    pub fn shift(&mut self) -> Option<T> {
        if let Some(value) = self.vips.pop() {
            return Some(value);
        }
        if self.ring_len == 0 {
            self.absorb_overflow();
            if self.ring_len == 0 {
                return None;
            }
        }
        let value = self.entries[self.read].take();
        self.read = (self.read + 1) % self.stride;
        self.ring_len -= 1;
        if self.ring_len == 0 {
            self.absorb_overflow();
        }
        value
    }

    /// Removes and returns the tail, or `None` if the deque is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.overflow > 0 {
            self.overflow -= 1;
            return self.entries[self.stride + self.overflow].take();
        }
        if self.ring_len > 0 {
            self.write = (self.write + self.stride - 1) % self.stride;
            self.ring_len -= 1;
            return self.entries[self.write].take();
        }
        if self.vips.is_empty() {
            None
        } else {
            // Bottom of the VIP stack is the logical tail here.
            Some(self.vips.remove(0))
        }
    }

    /// Like [`shift`](Self::shift), but reports an empty deque as an error.
    pub fn try_shift(&mut self) -> Result<T, DequeError> {
        self.shift().ok_or(DequeError::Empty)
    }

    /// Like [`pop`](Self::pop), but reports an empty deque as an error.
    pub fn try_pop(&mut self) -> Result<T, DequeError> {
        self.pop().ok_or(DequeError::Empty)
    }

    /// Returns a reference to the head without removing it.
    #[must_use]
    pub fn head(&self) -> Option<&T> {
        if let Some(value) = self.vips.last() {
            return Some(value);
        }
        if self.ring_len > 0 {
            return self.entries[self.read].as_ref();
        }
        if self.overflow > 0 {
            return self.entries[self.stride].as_ref();
        }
        None
    }

    /// Returns a reference to the tail without removing it.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        if self.overflow > 0 {
            return self.entries[self.stride + self.overflow - 1].as_ref();
        }
        if self.ring_len > 0 {
            let idx = (self.write + self.stride - 1) % self.stride;
            return self.entries[idx].as_ref();
        }
        self.vips.first()
    }

    /// Drops every value and releases the ring window.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.vips.clear();
        self.read = 0;
        self.write = 0;
        self.stride = 0;
        self.ring_len = 0;
        self.overflow = 0;
    }

    /// Returns an iterator that **removes** values from the head.
    ///
    /// Values not consumed by the iterator stay queued.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { deque: self }
    }

    /// Folds the overflow region into the ring once the ring has drained.
    ///
    /// The overflow values already sit in `[stride, stride + overflow)`, so
    /// the enlarged ring starts reading at the old stride and its write
    /// cursor wraps to slot 0.
    fn absorb_overflow(&mut self) {
        debug_assert_eq!(self.ring_len, 0, "absorbing into a non-empty ring");
        if self.overflow == 0 {
            return;
        }
        let old_stride = self.stride;
        self.stride += self.overflow;
        self.read = old_stride % self.stride;
        self.write = 0;
        self.ring_len = self.overflow;
        self.overflow = 0;
    }
}

impl<T> Default for RingDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for RingDeque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for RingDeque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

impl<T> IntoIterator for RingDeque<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    /// Consumes the deque, yielding values from head to tail.
    fn into_iter(self) -> IntoIter<T> {
        IntoIter { deque: self }
    }
}

impl<T> fmt::Debug for RingDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingDeque")
            .field("len", &self.len())
            .field("stride", &self.stride)
            .field("read", &self.read)
            .field("write", &self.write)
            .field("overflow", &self.overflow)
            .field("vips", &self.vips.len())
            .finish_non_exhaustive()
    }
}

/// Destructive iterator returned by [`RingDeque::drain`].
pub struct Drain<'a, T> {
    deque: &'a mut RingDeque<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.deque.shift()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.deque.len();
        (len, Some(len))
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> FusedIterator for Drain<'_, T> {}

impl<T> fmt::Debug for Drain<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drain")
            .field("remaining", &self.deque.len())
            .finish()
    }
}

/// Owning iterator returned by [`RingDeque::into_iter`].
pub struct IntoIter<T> {
    deque: RingDeque<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.deque.shift()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.deque.len();
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &self.deque.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::VecDeque;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn new_deque_is_empty() {
        let mut deque = RingDeque::<u32>::new();
        assert!(deque.is_empty());
        assert_eq!(deque.len(), 0);
        assert_eq!(deque.shift(), None);
        assert_eq!(deque.pop(), None);
        assert_eq!(deque.head(), None);
        assert_eq!(deque.last(), None);
    }

    #[test]
    fn push_shift_preserves_order_across_growth() {
        let mut deque = RingDeque::with_stride(1);
        for i in 0..100_u32 {
            deque.push(i);
        }
        assert_eq!(deque.stride(), 1, "overflow is not folded in until the ring drains");

        // First growth: the ring (1 slot) drains and absorbs 99 overflow values.
        assert_eq!(deque.shift(), Some(0));
        assert_eq!(deque.stride(), 100);

        // Push past the new ring capacity to force a second overflow region.
        for i in 100..250_u32 {
            deque.push(i);
        }
        let drained: Vec<u32> = deque.drain().collect();
        assert_eq!(drained, (1..250).collect::<Vec<_>>());
        assert!(deque.stride() > 100, "second growth event enlarged the ring");
        assert!(deque.is_empty());
    }

    #[test]
    fn interleaved_push_shift_survives_several_absorptions() {
        let mut deque = RingDeque::with_stride(1);
        let mut next_in = 0_u32;
        let mut next_out = 0_u32;
        let mut growths = 0;
        for round in 1..=6_u32 {
            let stride_before = deque.stride();
            for _ in 0..round * 7 {
                deque.push(next_in);
                next_in += 1;
            }
            for _ in 0..round * 4 {
                assert_eq!(deque.shift(), Some(next_out));
                next_out += 1;
            }
            if deque.stride() > stride_before {
                growths += 1;
            }
        }
        while let Some(v) = deque.shift() {
            assert_eq!(v, next_out);
            next_out += 1;
        }
        assert_eq!(next_out, next_in);
        assert!(growths >= 2, "expected at least two growth events, saw {growths}");
    }

    #[test]
    fn unshift_then_shift_returns_same_value() {
        let mut deque = RingDeque::with_stride(4);
        deque.push(1);
        deque.unshift(0);
        assert_eq!(deque.shift(), Some(0));
        assert_eq!(deque.shift(), Some(1));
    }

    #[test]
    fn unshift_into_full_ring_routes_through_vips() {
        let mut deque = RingDeque::with_stride(2);
        deque.push(1);
        deque.push(2);
        deque.unshift(0);
        assert_eq!(deque.vips.len(), 1, "full ring sends front inserts to vips");
        deque.unshift(-1);
        assert_eq!(deque.head(), Some(&-1));
        assert_eq!(deque.shift(), Some(-1));
        assert_eq!(deque.shift(), Some(0));
        assert_eq!(deque.shift(), Some(1));
        assert_eq!(deque.shift(), Some(2));
        assert!(deque.is_empty());
    }

    #[test]
    fn unshift_stays_ahead_of_existing_vips_after_ring_frees_up() {
        let mut deque = RingDeque::with_stride(2);
        deque.push(2);
        deque.push(3);
        deque.unshift(1);
        // Free a ring slot from the tail; the next front insert must still
        // land ahead of the VIP value.
        assert_eq!(deque.pop(), Some(3));
        deque.unshift(0);
        let order: Vec<i32> = deque.drain().collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn unshift_on_unsized_deque() {
        let mut deque = RingDeque::new();
        deque.unshift(5);
        assert_eq!(deque.shift(), Some(5));
        assert!(deque.is_empty());
    }

    #[test]
    fn pop_prefers_overflow_then_ring_then_vips() {
        let mut deque = RingDeque::with_stride(2);
        deque.push(1);
        deque.push(2);
        deque.push(3); // overflow
        deque.unshift(0); // vips
        assert_eq!(deque.last(), Some(&3));
        assert_eq!(deque.pop(), Some(3));
        assert_eq!(deque.pop(), Some(2));
        assert_eq!(deque.pop(), Some(1));
        assert_eq!(deque.last(), Some(&0));
        assert_eq!(deque.pop(), Some(0));
        assert_eq!(deque.pop(), None);
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut deque = RingDeque::with_stride(3);
        deque.extend([1, 2, 3, 4, 5]);
        deque.unshift(0);
        deque.clear();
        assert!(deque.is_empty());
        assert_eq!(deque.stride(), 0);
        assert_eq!(deque.shift(), None);

        deque.push(9);
        assert_eq!(deque.shift(), Some(9));
    }

    #[test]
    fn strict_mode_reports_empty() {
        let mut deque = RingDeque::<u8>::new();
        assert_eq!(deque.try_shift(), Err(DequeError::Empty));
        assert_eq!(deque.try_pop(), Err(DequeError::Empty));
        deque.push(3);
        assert_eq!(deque.try_pop(), Ok(3));
    }

    #[test]
    fn into_iter_consumes_from_both_ends() {
        let deque: RingDeque<u32> = (0..5).collect();
        let mut iter = deque.into_iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next(), Some(0));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn partial_drain_leaves_rest_queued() {
        let mut deque: RingDeque<u32> = (0..6).collect();
        let first: Vec<u32> = deque.drain().take(2).collect();
        assert_eq!(first, vec![0, 1]);
        assert_eq!(deque.len(), 4);
        assert_eq!(deque.head(), Some(&2));
    }

    #[test]
    fn matches_vecdeque_under_mixed_operations() {
        // Small LCG so the sequence is deterministic.
        let mut state = 0x2545_f491_u32;
        let mut next = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            state >> 16
        };

        let mut deque = RingDeque::with_stride(1);
        let mut model = VecDeque::new();
        for step in 0..5_000_u32 {
            match next() % 6 {
                0 | 1 => {
                    deque.push(step);
                    model.push_back(step);
                }
                2 => {
                    deque.unshift(step);
                    model.push_front(step);
                }
                3 | 4 => assert_eq!(deque.shift(), model.pop_front(), "shift at step {step}"),
                _ => assert_eq!(deque.pop(), model.pop_back(), "pop at step {step}"),
            }
            assert_eq!(deque.len(), model.len(), "len at step {step}");
            assert_eq!(deque.head(), model.front(), "head at step {step}");
            assert_eq!(deque.last(), model.back(), "last at step {step}");
            assert_eq!(deque.is_empty(), model.is_empty(), "empty at step {step}");
        }
        let rest: Vec<u32> = deque.drain().collect();
        assert_eq!(rest, model.into_iter().collect::<Vec<_>>());
    }
}
