// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the dispatch loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`Dispatch::tick`](crate::dispatch::Dispatch::tick) calls at each stage.
//! All method bodies default to no-ops, so implementing only the events you
//! care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Job failures are always reported here, whichever
//! [`FailurePolicy`](crate::dispatch::FailurePolicy) is in effect.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use crate::error::JobError;
use crate::job::{Category, JobId};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once per tick, after the frame counter advances and the render
/// target is prepared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickBeginEvent {
    /// Frame counter for this tick (1 for the first tick after `start`).
    pub frame: u64,
    /// Jobs already in the sorted list.
    pub jobs: u32,
    /// Registrations waiting to be merged into the list this tick.
    pub pending: u32,
}

/// Marks the beginning of a category phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame: u64,
    /// Which category is starting.
    pub category: Category,
}

/// Marks the end of a category phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame: u64,
    /// Which category is ending.
    pub category: Category,
    /// Jobs fired during the phase.
    pub fired: u32,
}

/// Emitted when a job's callback is invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobFiredEvent {
    /// Frame counter.
    pub frame: u64,
    /// The job that fired.
    pub id: JobId,
    /// Its category.
    pub category: Category,
    /// Whether the job recurs.
    pub recurring: bool,
}

/// Emitted when a job body suspends instead of completing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobSuspendedEvent {
    /// Frame counter.
    pub frame: u64,
    /// The suspended job.
    pub id: JobId,
    /// Its category.
    pub category: Category,
}

/// Emitted when a previously suspended body completes successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobSettledEvent {
    /// Frame counter.
    pub frame: u64,
    /// The job whose body completed.
    pub id: JobId,
    /// Its category.
    pub category: Category,
    /// `true` if the job had already been compacted away.
    pub detached: bool,
}

/// Emitted when a job body fails.
#[derive(Clone, Copy, Debug)]
pub struct JobFailedEvent<'a> {
    /// Frame counter.
    pub frame: u64,
    /// The failing job.
    pub id: JobId,
    /// Its category.
    pub category: Category,
    /// The failure.
    pub error: &'a JobError,
}

/// Emitted after the compaction pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactionEvent {
    /// Frame counter.
    pub frame: u64,
    /// Entries dropped from the job list.
    pub removed: u32,
    /// Entries kept for the next tick.
    pub retained: u32,
    /// Suspended bodies still running after their job was dropped.
    pub detached: u32,
}

/// Per-tick counters, emitted at the end of every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Frame counter.
    pub frame: u64,
    /// Callbacks invoked.
    pub fired: u32,
    /// Invocations that suspended.
    pub suspended: u32,
    /// Suspended bodies that completed this tick.
    pub settled: u32,
    /// Failures reported this tick.
    pub failed: u32,
    /// Entries dropped by compaction.
    pub removed: u32,
    /// Entries kept by compaction.
    pub retained: u32,
    /// `true` if the failure policy stopped the dispatch at the end of the
    /// tick.
    pub halted: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the dispatch loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the start of each tick.
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        _ = e;
    }

    /// Called when a category phase starts.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called when a category phase ends.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a job fires.
    fn on_job_fired(&mut self, e: &JobFiredEvent) {
        _ = e;
    }

    /// Called when a job body suspends.
    fn on_job_suspended(&mut self, e: &JobSuspendedEvent) {
        _ = e;
    }

    /// Called when a suspended body completes successfully.
    fn on_job_settled(&mut self, e: &JobSettledEvent) {
        _ = e;
    }

    /// Called when a job body fails.
    fn on_job_failed(&mut self, e: &JobFailedEvent<'_>) {
        _ = e;
    }

    /// Called after compaction.
    fn on_compaction(&mut self, e: &CompactionEvent) {
        _ = e;
    }

    /// Called with the per-tick counters.
    fn on_tick_stats(&mut self, s: &TickStats) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates a `Tracer` method that forwards one event to the sink.
macro_rules! forward {
    ($(#[$doc:meta])* $name:ident => $hook:ident($ty:ty)) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`TickBeginEvent`].
        tick_begin => on_tick_begin(TickBeginEvent)
    );
    forward!(
        /// Emits a [`PhaseBeginEvent`].
        phase_begin => on_phase_begin(PhaseBeginEvent)
    );
    forward!(
        /// Emits a [`PhaseEndEvent`].
        phase_end => on_phase_end(PhaseEndEvent)
    );
    forward!(
        /// Emits a [`JobFiredEvent`].
        job_fired => on_job_fired(JobFiredEvent)
    );
    forward!(
        /// Emits a [`JobSuspendedEvent`].
        job_suspended => on_job_suspended(JobSuspendedEvent)
    );
    forward!(
        /// Emits a [`JobSettledEvent`].
        job_settled => on_job_settled(JobSettledEvent)
    );
    forward!(
        /// Emits a [`JobFailedEvent`].
        job_failed => on_job_failed(JobFailedEvent<'_>)
    );
    forward!(
        /// Emits a [`CompactionEvent`].
        compaction => on_compaction(CompactionEvent)
    );
    forward!(
        /// Emits the per-tick [`TickStats`].
        tick_stats => on_tick_stats(TickStats)
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
