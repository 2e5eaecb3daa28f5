// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Job identity, categories, recurrence, and invocation results.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::Cell;
use core::cmp::{Ordering, Reverse};
use core::fmt;
use core::future::Future;
use core::pin::Pin;

use crate::error::{JobError, ScheduleError};

/// Identifies a registered job.
///
/// Ids increase monotonically and are never reused by a
/// [`Dispatch`](crate::dispatch::Dispatch), even across `stop`/`start`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The phase of a tick in which a job runs.
///
/// Phases run in declaration order: every `Render` job before any `Update`
/// job, every `Update` job before any `Immediate` job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Drawing work. Higher priority draws later, on top.
    Render,
    /// Simulation and state updates.
    Update,
    /// Work that should run after everything else in the frame.
    Immediate,
}

impl Category {
    /// All categories in execution order.
    pub const ALL: [Self; 3] = [Self::Render, Self::Update, Self::Immediate];

    /// Returns the lowercase name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Update => "update",
            Self::Immediate => "immediate",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = ScheduleError;

    fn try_from(name: &str) -> Result<Self, ScheduleError> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ScheduleError::UnknownCategory(String::from(name).into()))
    }
}

/// How often a job fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Recurrence {
    /// Fire once, `delay` ticks after the first tick that sees the job.
    ///
    /// A delay of 0 fires on that first tick.
    Once {
        /// Ticks to wait before firing.
        delay: u32,
    },
    /// Fire on every tick until cancelled.
    Every {
        /// Ordering within the category; higher runs earlier, except for
        /// [`Category::Render`] where higher runs later.
        priority: i32,
    },
}

impl Recurrence {
    /// Builds a recurrence from the loose `(recurring, delay_or_priority)`
    /// pair.
    ///
    /// For one-shot jobs the value is a frame delay and must be
    /// non-negative; delays beyond `u32::MAX` saturate. For recurring jobs
    /// it is a priority, clamped to the `i32` range.
    pub fn from_parts(recurring: bool, delay_or_priority: i64) -> Result<Self, ScheduleError> {
        if recurring {
            let priority = i32::try_from(delay_or_priority).unwrap_or(if delay_or_priority < 0 {
                i32::MIN
            } else {
                i32::MAX
            });
            return Ok(Self::Every { priority });
        }
        if delay_or_priority < 0 {
            return Err(ScheduleError::NegativeDelay(delay_or_priority));
        }
        let delay = u32::try_from(delay_or_priority).unwrap_or(u32::MAX);
        Ok(Self::Once { delay })
    }

    /// Returns `true` for [`Recurrence::Every`].
    #[must_use]
    pub const fn is_recurring(self) -> bool {
        matches!(self, Self::Every { .. })
    }
}

/// A job body that has not finished yet.
pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), JobError>>>>;

/// What a job callback produced when it was invoked.
///
/// Callbacks may return anything convertible into an `Invocation`: `()`,
/// `Result<(), JobError>`, or an explicit [`Invocation::suspend`].
pub enum Invocation {
    /// The body ran to completion synchronously.
    Complete(Result<(), JobError>),
    /// The body suspended; the dispatch polls it on later ticks.
    Suspended(JobFuture),
}

impl Invocation {
    /// A successful synchronous completion.
    #[must_use]
    pub const fn done() -> Self {
        Self::Complete(Ok(()))
    }

    /// Wraps a future as a suspended body.
    #[must_use]
    pub fn suspend(future: impl Future<Output = Result<(), JobError>> + 'static) -> Self {
        Self::Suspended(Box::pin(future))
    }
}

impl From<()> for Invocation {
    fn from((): ()) -> Self {
        Self::done()
    }
}

impl From<Result<(), JobError>> for Invocation {
    fn from(result: Result<(), JobError>) -> Self {
        Self::Complete(result)
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(result) => f.debug_tuple("Complete").field(result).finish(),
            Self::Suspended(_) => f.write_str("Suspended(..)"),
        }
    }
}

/// Boxed job callback.
pub(crate) type Callback = Box<dyn FnMut() -> Invocation>;

/// Flags shared between a job entry and the id index so they can be flipped
/// while the job list is being walked.
#[derive(Debug, Default)]
pub(crate) struct JobFlags {
    pub(crate) paused: Cell<bool>,
    pub(crate) cancelled: Cell<bool>,
}

/// A registered job as stored in the job list.
pub(crate) struct JobEntry {
    pub(crate) id: JobId,
    pub(crate) category: Category,
    pub(crate) recurring: bool,
    /// Effective priority; render priorities are stored negated.
    pub(crate) priority: i32,
    /// Ticks left before a one-shot job is due.
    pub(crate) timer: u32,
    /// Set once a one-shot job has fired.
    pub(crate) fired: bool,
    pub(crate) flags: Rc<JobFlags>,
    pub(crate) callback: Callback,
    /// Suspended body from the latest invocation. `Some` means busy.
    pub(crate) in_flight: Option<JobFuture>,
}

impl JobEntry {
    pub(crate) fn new(
        id: JobId,
        category: Category,
        recurrence: Recurrence,
        flags: Rc<JobFlags>,
        callback: Callback,
    ) -> Self {
        let (recurring, priority, timer) = match recurrence {
            Recurrence::Once { delay } => (false, 0, delay),
            Recurrence::Every { priority } => {
                let priority = match category {
                    // Painter's order: later draws sit on top.
                    Category::Render => priority.saturating_neg(),
                    Category::Update | Category::Immediate => priority,
                };
                (true, priority, 0)
            }
        };
        Self {
            id,
            category,
            recurring,
            priority,
            timer,
            fired: false,
            flags,
            callback,
            in_flight: None,
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Sort key: category, then descending priority, then FIFO by id.
    pub(crate) fn order(&self, other: &Self) -> Ordering {
        (self.category, Reverse(self.priority), self.id).cmp(&(
            other.category,
            Reverse(other.priority),
            other.id,
        ))
    }

    /// Whether compaction should drop this entry.
    pub(crate) fn is_finished(&self) -> bool {
        self.flags.cancelled.get() || (!self.recurring && self.fired)
    }
}

impl fmt::Debug for JobEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobEntry")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("recurring", &self.recurring)
            .field("priority", &self.priority)
            .field("timer", &self.timer)
            .field("fired", &self.fired)
            .field("flags", &self.flags)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, category: Category, recurrence: Recurrence) -> JobEntry {
        JobEntry::new(
            JobId(id),
            category,
            recurrence,
            Rc::default(),
            Box::new(Invocation::done),
        )
    }

    #[test]
    fn category_names_parse_case_insensitively() {
        assert_eq!(Category::try_from("render"), Ok(Category::Render));
        assert_eq!(Category::try_from("Update"), Ok(Category::Update));
        assert_eq!(Category::try_from("IMMEDIATE"), Ok(Category::Immediate));
        assert_eq!(
            Category::try_from("paint"),
            Err(ScheduleError::UnknownCategory("paint".into()))
        );
    }

    #[test]
    fn recurrence_from_parts() {
        assert_eq!(
            Recurrence::from_parts(false, 3),
            Ok(Recurrence::Once { delay: 3 })
        );
        assert_eq!(
            Recurrence::from_parts(true, -7),
            Ok(Recurrence::Every { priority: -7 })
        );
        assert_eq!(
            Recurrence::from_parts(false, -1),
            Err(ScheduleError::NegativeDelay(-1))
        );
        assert_eq!(
            Recurrence::from_parts(true, i64::MAX),
            Ok(Recurrence::Every { priority: i32::MAX })
        );
    }

    #[test]
    fn render_priority_is_inverted() {
        let low = entry(1, Category::Render, Recurrence::Every { priority: 1 });
        let high = entry(2, Category::Render, Recurrence::Every { priority: 10 });
        assert_eq!(low.order(&high), Ordering::Less, "low-priority render draws first");

        let low = entry(1, Category::Update, Recurrence::Every { priority: 1 });
        let high = entry(2, Category::Update, Recurrence::Every { priority: 10 });
        assert_eq!(high.order(&low), Ordering::Less, "high-priority update runs first");
    }

    #[test]
    fn order_is_category_then_priority_then_fifo() {
        let immediate = entry(1, Category::Immediate, Recurrence::Every { priority: 99 });
        let update = entry(2, Category::Update, Recurrence::Once { delay: 0 });
        assert_eq!(update.order(&immediate), Ordering::Less);

        let first = entry(3, Category::Update, Recurrence::Once { delay: 0 });
        let second = entry(4, Category::Update, Recurrence::Every { priority: 0 });
        assert_eq!(first.order(&second), Ordering::Less, "equal priority falls back to id");
    }

    #[test]
    fn extreme_render_priority_does_not_overflow() {
        let e = entry(1, Category::Render, Recurrence::Every { priority: i32::MIN });
        assert_eq!(e.priority, i32::MAX);
    }
}
