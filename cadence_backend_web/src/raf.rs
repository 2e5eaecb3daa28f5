// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame source.
//!
//! [`RafFrameSource`] implements [`FrameSource`] on top of the browser's
//! `requestAnimationFrame` / `cancelAnimationFrame` pair. The JS callback it
//! registers lives in a shared slot that the owner fills in once (see
//! [`WebDispatch`](crate::WebDispatch)); until then requests are no-ops.

use alloc::rc::Rc;
use core::cell::RefCell;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use cadence_core::frame::{FrameSource, FrameToken};

// Direct global bindings instead of `web_sys::Window` methods, so no
// Window/Performance object has to be fetched (and unwrapped) every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

pub(crate) type RafClosure = Closure<dyn FnMut(f64)>;

/// Shared slot holding the JS closure registered with `requestAnimationFrame`.
pub(crate) type CallbackSlot = Rc<RefCell<Option<RafClosure>>>;

/// A [`FrameSource`] backed by `requestAnimationFrame`.
pub struct RafFrameSource {
    callback: CallbackSlot,
}

impl RafFrameSource {
    /// Creates a source with no callback installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            callback: Rc::new(RefCell::new(None)),
        }
    }

    pub(crate) fn slot(&self) -> CallbackSlot {
        Rc::clone(&self.callback)
    }

    /// Returns `true` once a callback has been installed.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.callback.borrow().is_some()
    }
}

impl Default for RafFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for RafFrameSource {
    fn request_frame(&mut self) -> FrameToken {
        match &*self.callback.borrow() {
            Some(closure) => token_for(request_animation_frame(closure.as_ref().unchecked_ref())),
            None => FrameToken(0),
        }
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if let Some(id) = raf_id(token) {
            cancel_animation_frame(id);
        }
    }
}

impl core::fmt::Debug for RafFrameSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafFrameSource")
            .field("has_callback", &self.has_callback())
            .finish()
    }
}

/// Browsers hand out positive request ids; anything else maps to token 0.
fn token_for(id: i32) -> FrameToken {
    FrameToken(u64::try_from(id).unwrap_or(0))
}

/// Token 0 marks "nothing requested" and is never cancelled.
fn raf_id(token: FrameToken) -> Option<i32> {
    match token.0 {
        0 => None,
        id => i32::try_from(id).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_round_trip_through_tokens() {
        assert_eq!(raf_id(token_for(17)), Some(17));
        assert_eq!(raf_id(token_for(i32::MAX)), Some(i32::MAX));
    }

    #[test]
    fn placeholder_tokens_are_not_cancelled() {
        assert_eq!(token_for(-3), FrameToken(0));
        assert_eq!(raf_id(FrameToken(0)), None);
        assert_eq!(raf_id(FrameToken(u64::MAX)), None);
    }
}
