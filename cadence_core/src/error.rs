// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for registration, strict deque access, and job bodies.

use alloc::borrow::Cow;
use alloc::boxed::Box;

use thiserror::Error;

/// A job registration was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The category name is not one of `render`, `update`, `immediate`.
    #[error("unknown job category `{0}`")]
    UnknownCategory(Cow<'static, str>),
    /// A one-shot job was registered with a negative frame delay.
    #[error("one-shot delay must be non-negative, got {0}")]
    NegativeDelay(i64),
}

/// Strict-mode [`RingDeque`](crate::deque::RingDeque) access failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DequeError {
    /// The deque holds no values.
    #[error("deque is empty")]
    Empty,
}

/// A job body failed, either synchronously or when its suspended future
/// resolved.
#[derive(Debug, Error)]
pub enum JobError {
    /// A plain failure message.
    #[error("{0}")]
    Message(Cow<'static, str>),
    /// Any other error raised by the body.
    #[error("{0}")]
    Other(Box<dyn core::error::Error + 'static>),
}

impl JobError {
    /// Creates a failure carrying only a message.
    #[must_use]
    pub fn msg(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps an arbitrary error value.
    #[must_use]
    pub fn other(error: impl core::error::Error + 'static) -> Self {
        Self::Other(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn schedule_error_messages() {
        assert_eq!(
            ScheduleError::UnknownCategory("draw".into()).to_string(),
            "unknown job category `draw`"
        );
        assert_eq!(
            ScheduleError::NegativeDelay(-3).to_string(),
            "one-shot delay must be non-negative, got -3"
        );
    }

    #[test]
    fn job_error_displays_wrapped_error() {
        let inner = ScheduleError::NegativeDelay(-1);
        let err = JobError::other(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
        assert_eq!(JobError::msg("boom").to_string(), "boom");
    }
}
