// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-synchronized cooperative job dispatch.
//!
//! `cadence_core` runs many independently registered jobs inside a single
//! per-frame callback, in a deterministic, priority-ordered, phase-separated
//! order. It is `no_std` compatible (with `alloc`) and strictly
//! single-threaded: shared state lives in `Rc`/`Cell`/`RefCell`.
//!
//! # Architecture
//!
//! ```text
//!   FrameSource (host refresh callback)
//!       │
//!       ▼
//!   Dispatch::tick() ──► RenderTarget::unclip() / clear()
//!       │
//!       ├─► merge inbox (RingDeque) ◄── DispatchHandle::schedule()
//!       ├─► Render ─► Update ─► Immediate (settle, then fire, per job)
//!       └─► compact ──► TickSummary
//! ```
//!
//! **[`deque`]** — [`RingDeque`](deque::RingDeque), an expanding ring-buffer
//! deque with O(1) amortized push/pop/shift/unshift that keeps FIFO order
//! across growth.
//!
//! **[`job`]** — Job ids, categories, recurrence, and the
//! [`Invocation`](job::Invocation) a callback returns.
//!
//! **[`dispatch`]** — The [`Dispatch`](dispatch::Dispatch) scheduler, its
//! configuration and failure policy.
//!
//! **[`handle`]** — [`DispatchHandle`](handle::DispatchHandle), a cloneable
//! registration handle that job bodies can capture.
//!
//! **[`frame`]** — Host contract: [`FrameSource`](frame::FrameSource),
//! [`RenderTarget`](frame::RenderTarget), and the frame driver.
//!
//! **[`stream`]** — [`SampleQueue`](stream::SampleQueue) for handing audio
//! sample blocks from a producer to a consumer.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! tick instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Example
//!
//! ```
//! use cadence_core::dispatch::{Dispatch, DispatchConfig};
//! use cadence_core::frame::{ManualFrameSource, NullTarget};
//! use cadence_core::job::{Category, Recurrence};
//! use cadence_core::trace::Tracer;
//!
//! let mut dispatch = Dispatch::new(ManualFrameSource::new(), DispatchConfig::new());
//! dispatch.schedule(Category::Update, Recurrence::Once { delay: 2 }, || ());
//! dispatch.start();
//!
//! for _ in 0..3 {
//!     dispatch.driver_mut().source_mut().fire();
//!     dispatch.tick(&mut NullTarget, &mut Tracer::none());
//! }
//! assert!(dispatch.is_empty());
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod deque;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod handle;
pub mod job;
pub mod stream;
pub mod trace;
