// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for per-frame callbacks and the render target.
//!
//! The dispatch engine never talks to a display directly. A host supplies:
//!
//! - **Frame source**: a [`FrameSource`] that can request one callback at
//!   the next display refresh (e.g. `requestAnimationFrame`) and cancel a
//!   pending request. When the callback fires, the host calls
//!   [`Dispatch::tick`](crate::dispatch::Dispatch::tick).
//!
//! - **Render target**: a [`RenderTarget`] that is cleared and unclipped
//!   once per tick, strictly before any job runs.
//!
//! [`FrameDriver`] tracks the single outstanding frame request on behalf of
//! the dispatch.

use core::fmt;

/// Opaque handle for a pending frame request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameToken(pub u64);

impl fmt::Debug for FrameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameToken({})", self.0)
    }
}

/// Schedules callbacks at the next display refresh.
pub trait FrameSource {
    /// Requests one callback at the next refresh and returns its token.
    fn request_frame(&mut self) -> FrameToken;

    /// Cancels a pending request. Unknown or already-fired tokens are
    /// ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// The surface jobs draw into.
pub trait RenderTarget {
    /// Clears the whole target.
    fn clear(&mut self);

    /// Removes any clip region left over from the previous frame.
    fn unclip(&mut self);
}

/// A render target that ignores every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTarget;

impl RenderTarget for NullTarget {
    fn clear(&mut self) {}

    fn unclip(&mut self) {}
}

/// Owns a [`FrameSource`] and the token of its outstanding request.
#[derive(Debug)]
pub struct FrameDriver<S> {
    source: S,
    pending: Option<FrameToken>,
}

impl<S: FrameSource> FrameDriver<S> {
    /// Wraps a frame source. The driver starts disarmed.
    pub fn new(source: S) -> Self {
        Self {
            source,
            pending: None,
        }
    }

    /// Requests a frame unless one is already pending.
    pub fn arm(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.source.request_frame());
        }
    }

    /// Requests the next frame from inside a frame callback.
    ///
    /// The request that triggered the callback has already been consumed, so
    /// its token is discarded rather than cancelled.
    pub fn rearm(&mut self) {
        self.pending = Some(self.source.request_frame());
    }

    /// Cancels the pending request, if any.
    pub fn disarm(&mut self) {
        if let Some(token) = self.pending.take() {
            self.source.cancel_frame(token);
        }
    }

    /// Returns `true` while a frame request is outstanding.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the token of the outstanding request.
    #[must_use]
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Returns the underlying frame source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the underlying frame source mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

/// A frame source driven explicitly by the host.
///
/// Each request hands out a fresh token and records it as pending; the host
/// checks [`is_pending`](Self::is_pending) and calls
/// [`Dispatch::tick`](crate::dispatch::Dispatch::tick) itself. Useful for
/// native loops, fixed-step simulation, and tests.
#[derive(Clone, Debug, Default)]
pub struct ManualFrameSource {
    next_token: u64,
    pending: Option<FrameToken>,
    requests: u64,
    cancels: u64,
}

impl ManualFrameSource {
    /// Creates a source with no pending request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a frame has been requested and not cancelled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes the pending request, as a display callback would.
    ///
    /// Returns the token that fired, or `None` if nothing was requested.
    pub fn fire(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    /// Total number of frame requests made.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Total number of effective cancellations.
    #[must_use]
    pub fn cancels(&self) -> u64 {
        self.cancels
    }
}

impl FrameSource for ManualFrameSource {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next_token);
        self.next_token += 1;
        self.requests += 1;
        self.pending = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
            self.cancels += 1;
        }
    }
}
