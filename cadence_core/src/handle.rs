// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared registration state and the cloneable [`DispatchHandle`].
//!
//! Job bodies run while the dispatch walks its job list, so they cannot
//! borrow the [`Dispatch`](crate::dispatch::Dispatch) itself. Instead they
//! capture a `DispatchHandle`, which touches only state the walk never
//! borrows across a callback:
//!
//! - new registrations go to an **inbox** (a [`RingDeque`]) that is merged
//!   into the job list at the start of the next tick;
//! - cancel and pause flip `Cell` flags reached through an id index.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::deque::RingDeque;
use crate::error::ScheduleError;
use crate::job::{Category, Invocation, JobEntry, JobFlags, JobId, Recurrence};

pub(crate) struct Shared {
    next_id: Cell<u64>,
    frame: Cell<u64>,
    pub(crate) inbox: RefCell<RingDeque<JobEntry>>,
    /// Flags of every live job, pending or listed.
    pub(crate) index: RefCell<BTreeMap<JobId, Rc<JobFlags>>>,
}

impl Shared {
    pub(crate) fn advance_frame(&self) -> u64 {
        let frame = self.frame.get().saturating_add(1);
        self.frame.set(frame);
        frame
    }

    /// Drops every pending registration and forgets every id, keeping the
    /// id counter.
    pub(crate) fn reset(&self) {
        self.frame.set(0);
        // Release the borrows before dropping callbacks, whose captured
        // state may hold handles of its own.
        let inbox = core::mem::take(&mut *self.inbox.borrow_mut());
        let index = core::mem::take(&mut *self.index.borrow_mut());
        drop(inbox);
        drop(index);
    }
}

/// A cloneable handle for registering and controlling jobs.
///
/// Handles are cheap to clone and may be captured by job callbacks.
/// Registrations made through a handle are picked up by the next tick; a
/// job registered while a tick is running never fires during that same
/// tick.
#[derive(Clone)]
pub struct DispatchHandle {
    pub(crate) shared: Rc<Shared>,
}

impl DispatchHandle {
    pub(crate) fn new(inbox_stride: usize) -> Self {
        Self {
            shared: Rc::new(Shared {
                next_id: Cell::new(1),
                frame: Cell::new(0),
                inbox: RefCell::new(RingDeque::with_stride(inbox_stride)),
                index: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Registers a job and returns its id.
    ///
    /// The callback may return `()`, `Result<(), JobError>`, or an
    /// [`Invocation`] (use [`Invocation::suspend`] for bodies that await).
    ///
    /// [`JobError`]: crate::error::JobError
    pub fn schedule<F, R>(&self, category: Category, recurrence: Recurrence, mut callback: F) -> JobId
    where
        F: FnMut() -> R + 'static,
        R: Into<Invocation>,
    {
        let id = JobId(self.shared.next_id.get());
        self.shared.next_id.set(id.0 + 1);

        let flags = Rc::new(JobFlags::default());
        self.shared.index.borrow_mut().insert(id, Rc::clone(&flags));
        let entry = JobEntry::new(
            id,
            category,
            recurrence,
            flags,
            Box::new(move || callback().into()),
        );
        self.shared.inbox.borrow_mut().push(entry);
        id
    }

    /// Registers a job from loosely typed parts.
    ///
    /// `category` is matched case-insensitively against `render`, `update`
    /// and `immediate`. `delay_or_priority` is a frame delay for one-shot
    /// jobs and a priority for recurring ones.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::UnknownCategory`] for an unrecognized name
    /// and [`ScheduleError::NegativeDelay`] for a one-shot job with a
    /// negative delay. Nothing is registered on error.
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
        let category = Category::try_from(category)?;
        let recurrence = Recurrence::from_parts(recurring, delay_or_priority)?;
        Ok(self.schedule(category, recurrence, callback))
    }

    /// Marks a job cancelled. It is dropped at the next compaction; an
    /// invocation already running is allowed to finish.
    ///
    /// Returns `false` if the id is unknown or already removed.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.shared.index.borrow().get(&id) {
            Some(flags) => {
                flags.cancelled.set(true);
                true
            }
            None => false,
        }
    }

    /// Pauses or resumes a job. Paused jobs are skipped but kept.
    ///
    /// Returns `false` if the id is unknown or already removed.
    pub fn pause(&self, id: JobId, paused: bool) -> bool {
        match self.shared.index.borrow().get(&id) {
            Some(flags) => {
                flags.paused.set(paused);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the job is registered and not yet removed.
    #[must_use]
    pub fn contains(&self, id: JobId) -> bool {
        self.shared.index.borrow().contains_key(&id)
    }

    /// Returns the number of ticks since the dispatch was started.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.shared.frame.get()
    }
}

impl fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("next_id", &self.shared.next_id.get())
            .field("frame", &self.shared.frame.get())
            .field("live", &self.shared.index.borrow().len())
            .finish_non_exhaustive()
    }
}
