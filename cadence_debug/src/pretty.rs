// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use cadence_core::trace::{
    CompactionEvent, JobFailedEvent, JobFiredEvent, JobSettledEvent, JobSuspendedEvent,
    PhaseBeginEvent, PhaseEndEvent, TickBeginEvent, TickStats, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] frame={} jobs={} pending={}",
            e.frame, e.jobs, e.pending,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame,
            e.category.as_str(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} fired={}",
            e.frame,
            e.category.as_str(),
            e.fired,
        );
    }

    fn on_job_fired(&mut self, e: &JobFiredEvent) {
        let kind = if e.recurring { "recurring" } else { "once" };
        let _ = writeln!(
            self.writer,
            "[fire] frame={} job={} {} {kind}",
            e.frame,
            e.id,
            e.category.as_str(),
        );
    }

    fn on_job_suspended(&mut self, e: &JobSuspendedEvent) {
        let _ = writeln!(self.writer, "[suspend] frame={} job={}", e.frame, e.id);
    }

    fn on_job_settled(&mut self, e: &JobSettledEvent) {
        let detached = if e.detached { " detached" } else { "" };
        let _ = writeln!(
            self.writer,
            "[settle] frame={} job={}{detached}",
            e.frame, e.id,
        );
    }

    fn on_job_failed(&mut self, e: &JobFailedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[FAIL] frame={} job={} {}: {}",
            e.frame,
            e.id,
            e.category.as_str(),
            e.error,
        );
    }

    fn on_compaction(&mut self, e: &CompactionEvent) {
        let _ = writeln!(
            self.writer,
            "[compact] frame={} removed={} retained={} detached={}",
            e.frame, e.removed, e.retained, e.detached,
        );
    }

    fn on_tick_stats(&mut self, s: &TickStats) {
        let halted = if s.halted { " HALTED" } else { "" };
        let _ = writeln!(
            self.writer,
            "[stats] frame={} fired={} suspended={} settled={} failed={}{halted}",
            s.frame, s.fired, s.suspended, s.settled, s.failed,
        );
    }
}

#[cfg(test)]
mod tests {
    use cadence_core::error::JobError;
    use cadence_core::job::{Category, JobId};

    use super::*;

    #[test]
    fn pretty_print_tick() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_tick_begin(&TickBeginEvent {
            frame: 1,
            jobs: 2,
            pending: 0,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("[tick]"), "got: {output}");
        assert!(output.contains("frame=1"), "got: {output}");
    }

    #[test]
    fn pretty_print_failure_includes_error() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        let error = JobError::msg("texture missing");
        sink.on_job_failed(&JobFailedEvent {
            frame: 9,
            id: JobId(3),
            category: Category::Render,
            error: &error,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[FAIL] frame=9 job=#3 render: texture missing\n");
    }
}
