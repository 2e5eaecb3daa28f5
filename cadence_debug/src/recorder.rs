// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Failures ([`on_job_failed`](TraceSink::on_job_failed)) store the job and
//! its category, not the error itself.

use cadence_core::job::{Category, JobId};
use cadence_core::trace::{
    CompactionEvent, JobFailedEvent, JobFiredEvent, JobSettledEvent, JobSuspendedEvent,
    PhaseBeginEvent, PhaseEndEvent, TickBeginEvent, TickStats, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TICK_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_JOB_FIRED: u8 = 4;
const TAG_JOB_SUSPENDED: u8 = 5;
const TAG_JOB_SETTLED: u8 = 6;
const TAG_JOB_FAILED: u8 = 7;
const TAG_COMPACTION: u8 = 8;
const TAG_TICK_STATS: u8 = 9;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_category(&mut self, c: Category) {
        self.write_u8(match c {
            Category::Render => 0,
            Category::Update => 1,
            Category::Immediate => 2,
        });
    }

    fn write_job(&mut self, frame: u64, id: JobId, category: Category) {
        self.write_u64(frame);
        self.write_u64(id.0);
        self.write_category(category);
    }
}

impl TraceSink for RecorderSink {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.write_u8(TAG_TICK_BEGIN);
        self.write_u64(e.frame);
        self.write_u32(e.jobs);
        self.write_u32(e.pending);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame);
        self.write_category(e.category);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame);
        self.write_category(e.category);
        self.write_u32(e.fired);
    }

    fn on_job_fired(&mut self, e: &JobFiredEvent) {
        self.write_u8(TAG_JOB_FIRED);
        self.write_job(e.frame, e.id, e.category);
        self.write_bool(e.recurring);
    }

    fn on_job_suspended(&mut self, e: &JobSuspendedEvent) {
        self.write_u8(TAG_JOB_SUSPENDED);
        self.write_job(e.frame, e.id, e.category);
    }

    fn on_job_settled(&mut self, e: &JobSettledEvent) {
        self.write_u8(TAG_JOB_SETTLED);
        self.write_job(e.frame, e.id, e.category);
        self.write_bool(e.detached);
    }

    fn on_job_failed(&mut self, e: &JobFailedEvent<'_>) {
        self.write_u8(TAG_JOB_FAILED);
        self.write_job(e.frame, e.id, e.category);
    }

    fn on_compaction(&mut self, e: &CompactionEvent) {
        self.write_u8(TAG_COMPACTION);
        self.write_u64(e.frame);
        self.write_u32(e.removed);
        self.write_u32(e.retained);
        self.write_u32(e.detached);
    }

    fn on_tick_stats(&mut self, s: &TickStats) {
        self.write_u8(TAG_TICK_STATS);
        self.write_u64(s.frame);
        self.write_u32(s.fired);
        self.write_u32(s.suspended);
        self.write_u32(s.settled);
        self.write_u32(s.failed);
        self.write_u32(s.removed);
        self.write_u32(s.retained);
        self.write_bool(s.halted);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`TickBeginEvent`].
    TickBegin(TickBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`JobFiredEvent`].
    JobFired(JobFiredEvent),
    /// A [`JobSuspendedEvent`].
    JobSuspended(JobSuspendedEvent),
    /// A [`JobSettledEvent`].
    JobSettled(JobSettledEvent),
    /// A job failure, without the error value.
    JobFailed {
        /// Frame counter.
        frame: u64,
        /// The failing job.
        id: JobId,
        /// Its category.
        category: Category,
    },
    /// A [`CompactionEvent`].
    Compaction(CompactionEvent),
    /// The per-tick [`TickStats`].
    TickStats(TickStats),
}

impl RecordedEvent {
    /// Returns the frame the event belongs to.
    #[must_use]
    pub fn frame(&self) -> u64 {
        match self {
            Self::TickBegin(e) => e.frame,
            Self::PhaseBegin(e) => e.frame,
            Self::PhaseEnd(e) => e.frame,
            Self::JobFired(e) => e.frame,
            Self::JobSuspended(e) => e.frame,
            Self::JobSettled(e) => e.frame,
            Self::JobFailed { frame, .. } => *frame,
            Self::Compaction(e) => e.frame,
            Self::TickStats(s) => s.frame,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_category(&mut self) -> Option<Category> {
        match self.read_u8()? {
            0 => Some(Category::Render),
            1 => Some(Category::Update),
            2 => Some(Category::Immediate),
            _ => None,
        }
    }

    fn read_job(&mut self) -> Option<(u64, JobId, Category)> {
        Some((self.read_u64()?, JobId(self.read_u64()?), self.read_category()?))
    }

    fn decode_tick_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickBegin(TickBeginEvent {
            frame: self.read_u64()?,
            jobs: self.read_u32()?,
            pending: self.read_u32()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame: self.read_u64()?,
            category: self.read_category()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame: self.read_u64()?,
            category: self.read_category()?,
            fired: self.read_u32()?,
        }))
    }

    fn decode_job_fired(&mut self) -> Option<RecordedEvent> {
        let (frame, id, category) = self.read_job()?;
        Some(RecordedEvent::JobFired(JobFiredEvent {
            frame,
            id,
            category,
            recurring: self.read_bool()?,
        }))
    }

    fn decode_job_suspended(&mut self) -> Option<RecordedEvent> {
        let (frame, id, category) = self.read_job()?;
        Some(RecordedEvent::JobSuspended(JobSuspendedEvent {
            frame,
            id,
            category,
        }))
    }

    fn decode_job_settled(&mut self) -> Option<RecordedEvent> {
        let (frame, id, category) = self.read_job()?;
        Some(RecordedEvent::JobSettled(JobSettledEvent {
            frame,
            id,
            category,
            detached: self.read_bool()?,
        }))
    }

    fn decode_job_failed(&mut self) -> Option<RecordedEvent> {
        let (frame, id, category) = self.read_job()?;
        Some(RecordedEvent::JobFailed {
            frame,
            id,
            category,
        })
    }

    fn decode_compaction(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Compaction(CompactionEvent {
            frame: self.read_u64()?,
            removed: self.read_u32()?,
            retained: self.read_u32()?,
            detached: self.read_u32()?,
        }))
    }

    fn decode_tick_stats(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickStats(TickStats {
            frame: self.read_u64()?,
            fired: self.read_u32()?,
            suspended: self.read_u32()?,
            settled: self.read_u32()?,
            failed: self.read_u32()?,
            removed: self.read_u32()?,
            retained: self.read_u32()?,
            halted: self.read_bool()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_TICK_BEGIN => self.decode_tick_begin(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_JOB_FIRED => self.decode_job_fired(),
            TAG_JOB_SUSPENDED => self.decode_job_suspended(),
            TAG_JOB_SETTLED => self.decode_job_settled(),
            TAG_JOB_FAILED => self.decode_job_failed(),
            TAG_COMPACTION => self.decode_compaction(),
            TAG_TICK_STATS => self.decode_tick_stats(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use cadence_core::dispatch::{Dispatch, DispatchConfig};
    use cadence_core::error::JobError;
    use cadence_core::frame::{ManualFrameSource, NullTarget};
    use cadence_core::job::{Invocation, Recurrence};
    use cadence_core::trace::Tracer;

    use super::*;

    #[test]
    fn records_a_dispatch_tick_in_order() {
        let mut dispatch = Dispatch::new(ManualFrameSource::new(), DispatchConfig::isolating());
        let gate = Rc::new(Cell::new(false));
        let g = Rc::clone(&gate);
        let render = dispatch.schedule(Category::Render, Recurrence::Every { priority: 0 }, || ());
        let waiter = dispatch.schedule(Category::Update, Recurrence::Once { delay: 0 }, move || {
            let g = Rc::clone(&g);
            Invocation::suspend(std::future::poll_fn(move |_| {
                if g.get() {
                    std::task::Poll::Ready(Ok(()))
                } else {
                    std::task::Poll::Pending
                }
            }))
        });
        dispatch.start();

        let mut rec = RecorderSink::new();
        dispatch.tick(&mut NullTarget, &mut Tracer::new(&mut rec));
        gate.set(true);
        dispatch.tick(&mut NullTarget, &mut Tracer::new(&mut rec));

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events[0],
            RecordedEvent::TickBegin(TickBeginEvent {
                frame: 1,
                jobs: 0,
                pending: 2,
            })
        );
        assert!(events.contains(&RecordedEvent::JobFired(JobFiredEvent {
            frame: 1,
            id: render,
            category: Category::Render,
            recurring: true,
        })));
        assert!(events.contains(&RecordedEvent::JobSuspended(JobSuspendedEvent {
            frame: 1,
            id: waiter,
            category: Category::Update,
        })));
        assert!(events.contains(&RecordedEvent::JobSettled(JobSettledEvent {
            frame: 2,
            id: waiter,
            category: Category::Update,
            detached: true,
        })));
        match events.last() {
            Some(RecordedEvent::TickStats(s)) => {
                assert_eq!(s.frame, 2);
                assert_eq!(s.settled, 1);
                assert!(!s.halted);
            }
            other => panic!("expected TickStats, got {other:?}"),
        }
    }

    #[test]
    fn failure_is_recorded_without_the_error() {
        let mut rec = RecorderSink::new();
        let error = JobError::msg("lost");
        rec.on_job_failed(&JobFailedEvent {
            frame: 3,
            id: JobId(12),
            category: Category::Immediate,
            error: &error,
        });
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [RecordedEvent::JobFailed {
                frame: 3,
                id: JobId(12),
                category: Category::Immediate,
            }]
        );
        assert_eq!(events[0].frame(), 3);
    }

    #[test]
    fn phase_end_keeps_fired_count() {
        let mut rec = RecorderSink::new();
        let end = PhaseEndEvent {
            frame: 5,
            category: Category::Update,
            fired: 17,
        };
        rec.on_phase_end(&end);
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, [RecordedEvent::PhaseEnd(end)]);
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_compaction(&CompactionEvent {
            frame: 1,
            removed: 2,
            retained: 3,
            detached: 0,
        });
        rec.on_tick_stats(&TickStats::default());
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 1];
        assert_eq!(decode(cut).count(), 1, "the partial stats record is dropped");
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        assert_eq!(decode(&[0xFF, 1, 2, 3]).count(), 0);
        assert_eq!(decode(&[]).count(), 0);
    }
}
