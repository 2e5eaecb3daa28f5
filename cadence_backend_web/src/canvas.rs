// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D canvas render target.

use alloc::rc::Rc;
use core::cell::Cell;

use kurbo::Rect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use cadence_core::frame::RenderTarget;

/// Drawing-state operations [`CanvasTarget`] needs from a 2D context.
///
/// Clones must refer to the same underlying context.
pub trait Context2d: Clone {
    /// Pushes the drawing state.
    fn save(&self);

    /// Pops the drawing state.
    fn restore(&self);

    /// Intersects the clip region with `rect`, in current coordinates.
    fn clip_rect(&self, rect: Rect);

    /// Sets the transform to identity.
    fn reset_transform(&self);

    /// Clears `rect` to transparent black, in current coordinates.
    fn clear_rect(&self, rect: Rect);

    /// Size of the backing canvas in pixels, if there is one.
    fn canvas_size(&self) -> Option<(u32, u32)>;
}

impl Context2d for CanvasRenderingContext2d {
    fn save(&self) {
        Self::save(self);
    }

    fn restore(&self) {
        Self::restore(self);
    }

    fn clip_rect(&self, rect: Rect) {
        self.begin_path();
        self.rect(rect.x0, rect.y0, rect.width(), rect.height());
        self.clip();
    }

    fn reset_transform(&self) {
        // Only fails for non-finite arguments.
        let _ = self.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    }

    fn clear_rect(&self, rect: Rect) {
        Self::clear_rect(self, rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn canvas_size(&self) -> Option<(u32, u32)> {
        self.canvas().map(|canvas| (canvas.width(), canvas.height()))
    }
}

/// A [`RenderTarget`] over a 2D canvas context.
///
/// Cloning is cheap and clones share the clip depth, so a job body can hold
/// its own clone and narrow drawing with [`clip`](Self::clip) while the
/// dispatch keeps another. [`unclip`](RenderTarget::unclip) restores every
/// clip pushed through any clone. [`clear`](RenderTarget::clear) wipes the
/// whole canvas under an identity transform, whatever clip or transform it
/// finds.
///
/// ```ignore
/// let target = CanvasTarget::new(&canvas)?;
/// let web = WebDispatch::new(DispatchConfig::new(), target.clone());
/// web.handle().schedule(Category::Render, Recurrence::Every { priority: 0 }, move || {
///     target.clip(Rect::new(0.0, 0.0, 320.0, 240.0));
///     // draw into target.context()
/// });
/// ```
#[derive(Clone)]
pub struct CanvasTarget<C = CanvasRenderingContext2d> {
    context: C,
    depth: Rc<Cell<u32>>,
}

impl CanvasTarget {
    /// Wraps the 2D context of `canvas`.
    ///
    /// # Errors
    ///
    /// Fails if the canvas does not provide a 2D context.
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;
        Ok(Self::from_context(context))
    }
}

impl<C: Context2d> CanvasTarget<C> {
    /// Wraps an existing 2D context.
    #[must_use]
    pub fn from_context(context: C) -> Self {
        Self {
            context,
            depth: Rc::new(Cell::new(0)),
        }
    }

    /// Returns the wrapped context for drawing.
    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Narrows drawing to `rect` until the next
    /// [`unclip`](RenderTarget::unclip).
    pub fn clip(&self, rect: Rect) {
        self.context.save();
        self.context.clip_rect(rect);
        self.depth.set(self.depth.get() + 1);
    }

    /// Number of clips currently pushed.
    #[must_use]
    pub fn clip_depth(&self) -> u32 {
        self.depth.get()
    }
}

impl<C: Context2d> RenderTarget for CanvasTarget<C> {
    fn clear(&mut self) {
        self.unclip();
        let Some((width, height)) = self.context.canvas_size() else {
            return;
        };
        self.context.save();
        self.context.reset_transform();
        self.context.clear_rect(Rect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        ));
        self.context.restore();
    }

    fn unclip(&mut self) {
        for _ in 0..self.depth.replace(0) {
            self.context.restore();
        }
    }
}

impl<C> core::fmt::Debug for CanvasTarget<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasTarget")
            .field("depth", &self.depth.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use cadence_core::dispatch::{Dispatch, DispatchConfig};
    use cadence_core::frame::ManualFrameSource;
    use cadence_core::job::{Category, Recurrence};
    use cadence_core::trace::Tracer;

    use super::*;

    const SIZE: (u32, u32) = (64, 48);
    const FULL: Rect = Rect::new(0.0, 0.0, 64.0, 48.0);

    #[derive(Clone, Copy)]
    struct State {
        clip: Rect,
        identity: bool,
    }

    /// Models the clip and transform parts of a canvas context.
    #[derive(Default)]
    struct Model {
        stack: Vec<State>,
        current: Option<State>,
        cleared: Vec<Rect>,
    }

    impl Model {
        fn current(&self) -> State {
            self.current.unwrap_or(State {
                clip: FULL,
                identity: true,
            })
        }
    }

    #[derive(Clone, Default)]
    struct FakeContext(Rc<RefCell<Model>>);

    impl FakeContext {
        /// A job drawing straight into the context with a transform.
        fn translate(&self) {
            let mut model = self.0.borrow_mut();
            let mut state = model.current();
            state.identity = false;
            model.current = Some(state);
        }

        fn take_cleared(&self) -> Vec<Rect> {
            core::mem::take(&mut self.0.borrow_mut().cleared)
        }

        fn saved(&self) -> usize {
            self.0.borrow().stack.len()
        }
    }

    impl Context2d for FakeContext {
        fn save(&self) {
            let mut model = self.0.borrow_mut();
            let state = model.current();
            model.stack.push(state);
        }

        fn restore(&self) {
            let mut model = self.0.borrow_mut();
            if let Some(state) = model.stack.pop() {
                model.current = Some(state);
            }
        }

        fn clip_rect(&self, rect: Rect) {
            let mut model = self.0.borrow_mut();
            let mut state = model.current();
            state.clip = state.clip.intersect(rect);
            model.current = Some(state);
        }

        fn reset_transform(&self) {
            let mut model = self.0.borrow_mut();
            let mut state = model.current();
            state.identity = true;
            model.current = Some(state);
        }

        fn clear_rect(&self, rect: Rect) {
            let mut model = self.0.borrow_mut();
            let state = model.current();
            // A transformed clear lands somewhere else; record it as empty.
            let cleared = if state.identity {
                state.clip.intersect(rect)
            } else {
                Rect::ZERO
            };
            model.cleared.push(cleared);
        }

        fn canvas_size(&self) -> Option<(u32, u32)> {
            Some(SIZE)
        }
    }

    #[test]
    fn clear_wipes_the_whole_canvas_under_a_leftover_clip() {
        let fake = FakeContext::default();
        let mut target = CanvasTarget::from_context(fake.clone());
        target.clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        fake.translate();

        target.clear();
        assert_eq!(fake.take_cleared(), vec![FULL]);
        assert_eq!(target.clip_depth(), 0);
        assert_eq!(fake.saved(), 0, "every saved state is restored");
    }

    #[test]
    fn clear_resets_a_transform_left_outside_any_clip() {
        let fake = FakeContext::default();
        let mut target = CanvasTarget::from_context(fake.clone());
        fake.translate();

        target.clear();
        assert_eq!(fake.take_cleared(), vec![FULL]);
    }

    #[test]
    fn clones_share_the_clip_depth() {
        let mut target = CanvasTarget::from_context(FakeContext::default());
        let job_side = target.clone();
        job_side.clip(Rect::new(0.0, 0.0, 8.0, 8.0));
        job_side.clip(Rect::new(2.0, 2.0, 6.0, 6.0));
        assert_eq!(target.clip_depth(), 2);

        target.unclip();
        assert_eq!(job_side.clip_depth(), 0);
    }

    #[test]
    fn clips_made_by_jobs_are_undone_before_the_next_frame() {
        let fake = FakeContext::default();
        let mut target = CanvasTarget::from_context(fake.clone());
        let mut dispatch = Dispatch::new(ManualFrameSource::new(), DispatchConfig::new());
        let job_target = target.clone();
        dispatch.schedule(Category::Render, Recurrence::Every { priority: 0 }, move || {
            job_target.clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        });
        dispatch.start();

        for _ in 0..3 {
            dispatch.driver_mut().source_mut().fire();
            dispatch.tick(&mut target, &mut Tracer::none());
            assert_eq!(fake.take_cleared(), vec![FULL]);
            assert_eq!(target.clip_depth(), 1, "the job clipped again");
            assert_eq!(fake.saved(), 1);
        }
    }
}
