// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-synchronized cooperative job dispatch.
//!
//! A [`Dispatch`] owns the sorted job list and runs due jobs once per frame,
//! in three fixed phases: every [`Render`](Category::Render) job, then every
//! [`Update`](Category::Update) job, then every
//! [`Immediate`](Category::Immediate) job.
//!
//! # Tick
//!
//! [`Dispatch::tick`] performs, in order:
//!
//! 1. Re-arm the frame driver (a stopped dispatch returns here).
//! 2. Advance the frame counter.
//! 3. Unclip, then clear, the render target.
//! 4. Merge pending registrations and re-sort if anything was added.
//! 5. Walk the list phase by phase, polling each suspended body once and
//!    firing each due job.
//! 6. Compact: drop cancelled and fired one-shot jobs.
//! 7. Apply the [`FailurePolicy`].
//!
//! # Ordering
//!
//! The list is sorted by category, then descending effective priority, then
//! ascending id. Render priorities are negated on registration, so a
//! higher-priority render job draws later and sits on top. One-shot jobs
//! carry priority 0 and are ordered on the same key as recurring ones.
//!
//! # Suspending bodies
//!
//! A body that returns [`Invocation::Suspended`] is polled once with a no-op
//! waker right away, then once per tick until it resolves. While it is
//! pending the job is *busy* and is not fired again. If the job is compacted
//! away while busy (it was cancelled, or it was a one-shot job), the body is
//! detached and still polled until it finishes.
//!
//! Resumed bodies keep the phase order: a suspended body is polled in its
//! own category's phase, just before its job is considered for firing, and
//! detached bodies are polled at the start of their category's phase. Code
//! after an `await` in an update job therefore never runs ahead of that
//! tick's render jobs.

use alloc::vec::Vec;
use core::fmt;
use core::task::{Context, Poll, Waker};

use crate::error::{JobError, ScheduleError};
use crate::frame::{FrameDriver, FrameSource, RenderTarget};
use crate::handle::DispatchHandle;
use crate::job::{Category, Invocation, JobEntry, JobFuture, JobId, Recurrence};
use crate::trace::{
    CompactionEvent, JobFailedEvent, JobFiredEvent, JobSettledEvent, JobSuspendedEvent,
    PhaseBeginEvent, PhaseEndEvent, TickBeginEvent, TickStats, Tracer,
};

/// What the dispatch does when a job body fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FailurePolicy {
    /// Finish the current tick, then stop the dispatch.
    #[default]
    Halt,
    /// Report the failure and keep running.
    Isolate,
}

/// Configuration for a [`Dispatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Reaction to job failures.
    pub failure_policy: FailurePolicy,
    /// Initial ring capacity of the registration inbox.
    pub inbox_stride: usize,
}

impl DispatchConfig {
    /// Fail-fast defaults: any failure stops the dispatch after the tick.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            failure_policy: FailurePolicy::Halt,
            inbox_stride: 16,
        }
    }

    /// Failures are reported per job and the loop keeps running.
    #[must_use]
    pub const fn isolating() -> Self {
        Self {
            failure_policy: FailurePolicy::Isolate,
            ..Self::new()
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A job body failure observed during a tick.
#[derive(Debug)]
pub struct JobFailure {
    /// Frame in which the failure was observed.
    pub frame: u64,
    /// The failing job.
    pub id: JobId,
    /// Its category.
    pub category: Category,
    /// The error the body produced.
    pub error: JobError,
}

/// Result of one [`Dispatch::tick`].
#[derive(Debug, Default)]
pub struct TickSummary {
    /// Counters for the tick.
    pub stats: TickStats,
    /// Failures observed during the tick, in the order they occurred.
    pub failures: Vec<JobFailure>,
}

impl TickSummary {
    /// Returns `true` if the tick did nothing because the dispatch was
    /// stopped.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.stats.frame == 0
    }
}

/// A suspended body whose job has already been compacted away.
struct Detached {
    id: JobId,
    category: Category,
    future: JobFuture,
}

/// Frame-synchronized cooperative job scheduler.
///
/// Jobs are registered through [`schedule`](Self::schedule) or a cloned
/// [`DispatchHandle`]; the host calls [`tick`](Self::tick) from its frame
/// callback.
pub struct Dispatch<S> {
    config: DispatchConfig,
    driver: FrameDriver<S>,
    handle: DispatchHandle,
    jobs: Vec<JobEntry>,
    detached: Vec<Detached>,
    running: bool,
}

impl<S: FrameSource> Dispatch<S> {
    /// Creates a stopped dispatch driven by `source`.
    pub fn new(source: S, config: DispatchConfig) -> Self {
        Self {
            config,
            driver: FrameDriver::new(source),
            handle: DispatchHandle::new(config.inbox_stride),
            jobs: Vec::new(),
            detached: Vec::new(),
            running: false,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Returns a handle that job bodies can capture.
    #[must_use]
    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    /// Registers a job. See [`DispatchHandle::schedule`].
    pub fn schedule<F, R>(&self, category: Category, recurrence: Recurrence, callback: F) -> JobId
    where
        F: FnMut() -> R + 'static,
        R: Into<Invocation>,
    {
        self.handle.schedule(category, recurrence, callback)
    }

    /// Registers a job from loosely typed parts. See
    /// [`DispatchHandle::schedule_raw`].
    ///
    /// # Errors
    ///
    /// Rejects unknown category names and negative one-shot delays.
    pub fn schedule_raw<F, R>(
        &self,
        category: &str,
        recurring: bool,
        delay_or_priority: i64,
        callback: F,
    ) -> Result<JobId, ScheduleError>
    where
        F: FnMut() -> R + 'static,
        R: Into<Invocation>,
    {
        self.handle
            .schedule_raw(category, recurring, delay_or_priority, callback)
    }

    /// Marks a job cancelled. Returns `false` for unknown ids.
    pub fn cancel(&self, id: JobId) -> bool {
        self.handle.cancel(id)
    }

    /// Pauses or resumes a job. Returns `false` for unknown ids.
    pub fn pause(&self, id: JobId, paused: bool) -> bool {
        self.handle.pause(id, paused)
    }

    /// Ticks since [`start`](Self::start).
    #[must_use]
    pub fn now(&self) -> u64 {
        self.handle.now()
    }

    /// Starts the dispatch and arms the frame driver. Idempotent.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.driver.arm();
    }

    /// Stops the dispatch. Idempotent.
    ///
    /// Disarms the frame driver, drops every job (pending registrations and
    /// detached bodies included) and resets the frame counter. Job ids keep
    /// increasing after a restart.
    pub fn stop(&mut self) {
        self.running = false;
        self.driver.disarm();
        let jobs = core::mem::take(&mut self.jobs);
        let detached = core::mem::take(&mut self.detached);
        self.handle.shared.reset();
        drop(jobs);
        drop(detached);
    }

    /// Returns `true` between [`start`](Self::start) and
    /// [`stop`](Self::stop).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of live jobs, pending registrations included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len() + self.handle.shared.inbox.borrow().len()
    }

    /// Returns `true` if no job is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the job's latest invocation is still suspended.
    #[must_use]
    pub fn is_busy(&self, id: JobId) -> bool {
        self.jobs.iter().any(|job| job.id == id && job.is_busy())
    }

    /// Number of suspended bodies whose jobs were already removed.
    #[must_use]
    pub fn detached_len(&self) -> usize {
        self.detached.len()
    }

    /// Returns the frame driver.
    #[must_use]
    pub fn driver(&self) -> &FrameDriver<S> {
        &self.driver
    }

    /// Returns the frame driver mutably.
    pub fn driver_mut(&mut self) -> &mut FrameDriver<S> {
        &mut self.driver
    }

    /// Runs one frame. Call this from the host's frame callback.
    pub fn tick(&mut self, target: &mut dyn RenderTarget, tracer: &mut Tracer<'_>) -> TickSummary {
        if !self.running {
            return TickSummary::default();
        }
        self.driver.rearm();
        let frame = self.handle.shared.advance_frame();

        target.unclip();
        target.clear();

        let mut summary = TickSummary {
            stats: TickStats {
                frame,
                ..TickStats::default()
            },
            failures: Vec::new(),
        };
        tracer.tick_begin(&TickBeginEvent {
            frame,
            jobs: count(self.jobs.len()),
            pending: count(self.handle.shared.inbox.borrow().len()),
        });

        self.merge_registrations();
        self.run_phases(frame, tracer, &mut summary);
        self.compact(frame, tracer, &mut summary);

        if self.config.failure_policy == FailurePolicy::Halt && !summary.failures.is_empty() {
            summary.stats.halted = true;
            self.stop();
        }

        tracer.tick_stats(&summary.stats);
        summary
    }

    /// Polls the detached bodies of `category` once.
    fn settle_detached(
        &mut self,
        category: Category,
        frame: u64,
        tracer: &mut Tracer<'_>,
        summary: &mut TickSummary,
    ) {
        self.detached.retain_mut(|body| {
            if body.category != category {
                return true;
            }
            match poll_once(&mut body.future) {
                Poll::Pending => true,
                Poll::Ready(result) => {
                    record_outcome(result, frame, body.id, body.category, true, tracer, summary);
                    false
                }
            }
        });
    }

    /// Moves pending registrations into the job list and restores its order.
    fn merge_registrations(&mut self) {
        let before = self.jobs.len();
        {
            let mut inbox = self.handle.shared.inbox.borrow_mut();
            self.jobs.extend(inbox.drain());
        }
        if self.jobs.len() != before {
            self.jobs.sort_by(JobEntry::order);
        }
    }

    /// Walks the sorted list once, phase by phase.
    fn run_phases(&mut self, frame: u64, tracer: &mut Tracer<'_>, summary: &mut TickSummary) {
        let mut cursor = 0;
        for category in Category::ALL {
            tracer.phase_begin(&PhaseBeginEvent { frame, category });
            self.settle_detached(category, frame, tracer, summary);
            let mut fired = 0;
            while let Some(job) = self.jobs.get_mut(cursor) {
                if job.category != category {
                    break;
                }
                cursor += 1;
                settle(job, frame, tracer, summary);
                if fire_if_due(job, frame, tracer, summary) {
                    fired += 1;
                }
            }
            tracer.phase_end(&PhaseEndEvent {
                frame,
                category,
                fired,
            });
        }
    }

    /// Drops finished entries, detaching any body still in flight.
    fn compact(&mut self, frame: u64, tracer: &mut Tracer<'_>, summary: &mut TickSummary) {
        let before = self.jobs.len();
        let detached = &mut self.detached;
        let mut removed = Vec::new();
        self.jobs.retain_mut(|job| {
            if !job.is_finished() {
                return true;
            }
            if let Some(future) = job.in_flight.take() {
                detached.push(Detached {
                    id: job.id,
                    category: job.category,
                    future,
                });
            }
            removed.push(job.id);
            false
        });
        {
            let mut index = self.handle.shared.index.borrow_mut();
            for id in &removed {
                index.remove(id);
            }
        }

        summary.stats.removed = count(before - self.jobs.len());
        summary.stats.retained = count(self.jobs.len());
        tracer.compaction(&CompactionEvent {
            frame,
            removed: summary.stats.removed,
            retained: summary.stats.retained,
            detached: count(self.detached.len()),
        });
    }
}

impl<S: fmt::Debug> fmt::Debug for Dispatch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("config", &self.config)
            .field("driver", &self.driver)
            .field("handle", &self.handle)
            .field("jobs", &self.jobs)
            .field("detached", &self.detached.len())
            .field("running", &self.running)
            .finish()
    }
}

/// Polls the suspended body of `job`, if any, once.
fn settle(job: &mut JobEntry, frame: u64, tracer: &mut Tracer<'_>, summary: &mut TickSummary) {
    let Some(future) = job.in_flight.as_mut() else {
        return;
    };
    if let Poll::Ready(result) = poll_once(future) {
        job.in_flight = None;
        record_outcome(result, frame, job.id, job.category, false, tracer, summary);
    }
}

/// Fires `job` if it is due this tick. Returns `true` if the callback ran.
fn fire_if_due(
    job: &mut JobEntry,
    frame: u64,
    tracer: &mut Tracer<'_>,
    summary: &mut TickSummary,
) -> bool {
    if !job.recurring {
        if job.fired {
            return false;
        }
        if job.timer > 0 {
            job.timer -= 1;
            return false;
        }
    }
    if job.is_busy() || job.flags.cancelled.get() || job.flags.paused.get() {
        return false;
    }

    if !job.recurring {
        job.fired = true;
    }
    summary.stats.fired += 1;
    tracer.job_fired(&JobFiredEvent {
        frame,
        id: job.id,
        category: job.category,
        recurring: job.recurring,
    });

    match (job.callback)() {
        Invocation::Complete(result) => {
            if let Err(error) = result {
                record_failure(error, frame, job.id, job.category, tracer, summary);
            }
        }
        Invocation::Suspended(mut future) => match poll_once(&mut future) {
            Poll::Ready(Ok(())) => {}
            Poll::Ready(Err(error)) => {
                record_failure(error, frame, job.id, job.category, tracer, summary);
            }
            Poll::Pending => {
                job.in_flight = Some(future);
                summary.stats.suspended += 1;
                tracer.job_suspended(&JobSuspendedEvent {
                    frame,
                    id: job.id,
                    category: job.category,
                });
            }
        },
    }
    true
}

fn poll_once(future: &mut JobFuture) -> Poll<Result<(), JobError>> {
    let mut cx = Context::from_waker(Waker::noop());
    future.as_mut().poll(&mut cx)
}

/// Reports the result of a body that was suspended on an earlier poll.
fn record_outcome(
    result: Result<(), JobError>,
    frame: u64,
    id: JobId,
    category: Category,
    detached: bool,
    tracer: &mut Tracer<'_>,
    summary: &mut TickSummary,
) {
    match result {
        Ok(()) => {
            summary.stats.settled += 1;
            tracer.job_settled(&JobSettledEvent {
                frame,
                id,
                category,
                detached,
            });
        }
        Err(error) => record_failure(error, frame, id, category, tracer, summary),
    }
}

fn record_failure(
    error: JobError,
    frame: u64,
    id: JobId,
    category: Category,
    tracer: &mut Tracer<'_>,
    summary: &mut TickSummary,
) {
    tracer.job_failed(&JobFailedEvent {
        frame,
        id,
        category,
        error: &error,
    });
    summary.stats.failed += 1;
    summary.failures.push(JobFailure {
        frame,
        id,
        category,
        error,
    });
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
