// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for cadence.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`RafFrameSource`]: `requestAnimationFrame` frame source
//! - [`CanvasTarget`]: 2D canvas render target
//! - [`WebDispatch`]: a [`Dispatch`] that ticks itself from animation frames

#![no_std]

extern crate alloc;

mod canvas;
mod raf;

pub use canvas::{CanvasTarget, Context2d};
pub use raf::RafFrameSource;

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::{Cell, RefCell};

use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

use cadence_core::dispatch::{Dispatch, DispatchConfig, TickSummary};
use cadence_core::frame::RenderTarget;
use cadence_core::handle::DispatchHandle;
use cadence_core::trace::{TickStats, Tracer};

use raf::CallbackSlot;

/// Returns `performance.now()` in milliseconds.
#[must_use]
pub fn performance_now() -> f64 {
    raf::performance_now()
}

/// A [`Dispatch`] driven by `requestAnimationFrame`.
///
/// Every animation frame runs one tick against the render target given to
/// [`new`](Self::new). Job failures are logged to the browser console.
/// Jobs are registered through [`handle`](Self::handle).
///
/// The target moves into the frame callback. To draw and clip from job
/// bodies, pass a clone of a [`CanvasTarget`] and move the original into
/// the jobs; clones share their clip state.
pub struct WebDispatch {
    dispatch: Rc<RefCell<Dispatch<RafFrameSource>>>,
    handle: DispatchHandle,
    slot: CallbackSlot,
    last_stats: Rc<Cell<TickStats>>,
}

impl WebDispatch {
    /// Creates a stopped dispatch that renders into `target`.
    pub fn new(config: DispatchConfig, target: impl RenderTarget + 'static) -> Self {
        let source = RafFrameSource::new();
        let slot = source.slot();
        let dispatch = Rc::new(RefCell::new(Dispatch::new(source, config)));
        let handle = dispatch.borrow().handle();
        let last_stats = Rc::new(Cell::new(TickStats::default()));

        // The closure lives inside the dispatch's own frame source, so it
        // holds the dispatch weakly.
        let weak = Rc::downgrade(&dispatch);
        let stats = Rc::clone(&last_stats);
        let mut target = target;
        let closure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
            let Some(dispatch) = weak.upgrade() else {
                return;
            };
            let Ok(mut dispatch) = dispatch.try_borrow_mut() else {
                return;
            };
            let summary = dispatch.tick(&mut target, &mut Tracer::none());
            drop(dispatch);
            report(&summary);
            stats.set(summary.stats);
        }) as Box<dyn FnMut(f64)>);
        *slot.borrow_mut() = Some(closure);

        Self {
            dispatch,
            handle,
            slot,
            last_stats,
        }
    }

    /// Returns a handle for registering and controlling jobs.
    #[must_use]
    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    /// Starts ticking on animation frames.
    ///
    /// Returns `false` if called from inside a tick, where the dispatch is
    /// already borrowed; nothing changes in that case.
    pub fn start(&self) -> bool {
        match self.dispatch.try_borrow_mut() {
            Ok(mut dispatch) => {
                dispatch.start();
                true
            }
            Err(_) => false,
        }
    }

    /// Stops ticking and drops every job.
    ///
    /// Returns `false` if called from inside a tick; nothing changes in that
    /// case.
    pub fn stop(&self) -> bool {
        match self.dispatch.try_borrow_mut() {
            Ok(mut dispatch) => {
                dispatch.stop();
                true
            }
            Err(_) => false,
        }
    }

    /// Returns `true` while the dispatch is running.
    ///
    /// Inside a tick this reports `true`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.dispatch
            .try_borrow()
            .map_or(true, |dispatch| dispatch.is_running())
    }

    /// Counters from the most recent tick.
    #[must_use]
    pub fn last_stats(&self) -> TickStats {
        self.last_stats.get()
    }
}

impl Drop for WebDispatch {
    fn drop(&mut self) {
        self.stop();
        // Drop the JS closure so it doesn't leak.
        self.slot.borrow_mut().take();
    }
}

impl core::fmt::Debug for WebDispatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebDispatch")
            .field("running", &self.is_running())
            .field("last_stats", &self.last_stats.get())
            .finish_non_exhaustive()
    }
}

fn report(summary: &TickSummary) {
    for failure in &summary.failures {
        web_sys::console::error_1(&JsValue::from_str(&failure_message(
            failure.frame,
            failure.id.0,
            failure.category.as_str(),
            &failure.error,
        )));
    }
    if summary.stats.halted {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "cadence: dispatch halted after frame {}",
            summary.stats.frame
        )));
    }
}

fn failure_message(
    frame: u64,
    id: u64,
    category: &str,
    error: &dyn core::fmt::Display,
) -> String {
    format!("cadence: job #{id} ({category}) failed in frame {frame}: {error}")
}

#[cfg(test)]
mod tests {
    use cadence_core::error::JobError;

    use super::*;

    #[test]
    fn failure_message_names_job_and_frame() {
        let error = JobError::msg("sprite sheet missing");
        assert_eq!(
            failure_message(12, 4, "render", &error),
            "cadence: job #4 (render) failed in frame 12: sprite sheet missing"
        );
    }
}
