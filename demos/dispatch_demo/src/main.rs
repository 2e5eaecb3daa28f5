// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that exercises dispatch and the diagnostics pipeline.
//!
//! Runs 60 synthetic frames through a [`Dispatch`] driven by a
//! [`ManualFrameSource`], with render layers, an update job that spawns
//! one-shot effects, a streaming loader that suspends, and an audio producer
//! and consumer sharing a [`SampleQueue`]. Events go to both a
//! [`PrettyPrintSink`](cadence_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](cadence_debug::recorder::RecorderSink); the recording is
//! then exported as a Chrome trace JSON file.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;
use std::task::Poll;

use cadence_core::dispatch::{Dispatch, DispatchConfig};
use cadence_core::error::JobError;
use cadence_core::frame::{ManualFrameSource, NullTarget};
use cadence_core::job::{Category, Invocation, Recurrence};
use cadence_core::stream::SampleQueue;
use cadence_core::trace::{
    CompactionEvent, JobFailedEvent, JobFiredEvent, JobSettledEvent, JobSuspendedEvent,
    PhaseBeginEvent, PhaseEndEvent, TickBeginEvent, TickStats, TraceSink, Tracer,
};

use cadence_debug::chrome::FRAME_INTERVAL_60HZ_US;
use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 60;
/// Samples per frame at 44.1 kHz and 60 Hz.
const SAMPLES_PER_FRAME: usize = 735;

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.a.on_tick_begin(e);
        self.b.on_tick_begin(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.a.on_phase_begin(e);
        self.b.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.a.on_phase_end(e);
        self.b.on_phase_end(e);
    }

    fn on_job_fired(&mut self, e: &JobFiredEvent) {
        self.a.on_job_fired(e);
        self.b.on_job_fired(e);
    }

    fn on_job_suspended(&mut self, e: &JobSuspendedEvent) {
        self.a.on_job_suspended(e);
        self.b.on_job_suspended(e);
    }

    fn on_job_settled(&mut self, e: &JobSettledEvent) {
        self.a.on_job_settled(e);
        self.b.on_job_settled(e);
    }

    fn on_job_failed(&mut self, e: &JobFailedEvent<'_>) {
        self.a.on_job_failed(e);
        self.b.on_job_failed(e);
    }

    fn on_compaction(&mut self, e: &CompactionEvent) {
        self.a.on_compaction(e);
        self.b.on_compaction(e);
    }

    fn on_tick_stats(&mut self, s: &TickStats) {
        self.a.on_tick_stats(s);
        self.b.on_tick_stats(s);
    }
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    // -- dispatch ----------------------------------------------------------
    let mut dispatch = Dispatch::new(ManualFrameSource::new(), DispatchConfig::isolating());
    let handle = dispatch.handle();

    // Render layers: higher priority draws later, on top.
    let draws: Rc<RefCell<Vec<&'static str>>> = Rc::default();
    for (name, priority) in [("hud", 10), ("background", 0), ("sprites", 5)] {
        let draws = Rc::clone(&draws);
        dispatch.schedule(Category::Render, Recurrence::Every { priority }, move || {
            draws.borrow_mut().push(name);
        });
    }

    // Physics spawns a short-lived effect every ten frames.
    let spawner = handle.clone();
    dispatch.schedule(Category::Update, Recurrence::Every { priority: 10 }, move || {
        if spawner.now() % 10 == 0 {
            spawner.schedule(Category::Immediate, Recurrence::Once { delay: 2 }, || ());
        }
    });

    // A loader that takes three frames per chunk.
    let clock = handle.clone();
    dispatch.schedule(Category::Update, Recurrence::Every { priority: 1 }, move || {
        let clock = clock.clone();
        let ready_at = clock.now() + 3;
        Invocation::suspend(std::future::poll_fn(move |_| {
            if clock.now() >= ready_at {
                Poll::Ready(Ok(()))
            } else {
                Poll::Pending
            }
        }))
    });

    // Audio: the producer stalls every fifteenth frame.
    let audio = Rc::new(RefCell::new(SampleQueue::with_capacity(4)));
    let producer = Rc::clone(&audio);
    let producer_clock = handle.clone();
    dispatch.schedule(Category::Update, Recurrence::Every { priority: 0 }, move || {
        if producer_clock.now() % 15 != 0 {
            producer
                .borrow_mut()
                .push_block(vec![0.25_f32; SAMPLES_PER_FRAME]);
        }
    });
    let consumer = Rc::clone(&audio);
    let mut out = vec![0.0_f32; SAMPLES_PER_FRAME];
    dispatch.schedule(Category::Immediate, Recurrence::Every { priority: 0 }, move || {
        consumer.borrow_mut().fill(&mut out);
    });

    // A flaky job that fails once.
    let flaky_clock = handle.clone();
    let flaky = dispatch.schedule(Category::Update, Recurrence::Every { priority: -5 }, move || {
        if flaky_clock.now() == 30 {
            Err(JobError::msg("simulated decode error"))
        } else {
            Ok(())
        }
    });

    // -- simulated loop ----------------------------------------------------
    let mut failures = 0;
    dispatch.start();
    for frame in 1..=FRAME_COUNT {
        dispatch.driver_mut().source_mut().fire();
        draws.borrow_mut().clear();

        let mut tee = Tee {
            a: &mut pretty,
            b: &mut recorder,
        };
        let summary = dispatch.tick(&mut NullTarget, &mut Tracer::new(&mut tee));
        failures += summary.failures.len();

        if frame == 45 {
            dispatch.cancel(flaky);
        }
    }
    dispatch.stop();

    // -- report ------------------------------------------------------------
    let audio = audio.borrow();
    println!(
        "{FRAME_COUNT} frames, {failures} failure(s), {} audio underrun(s), {} samples queued",
        audio.underruns(),
        audio.queued_samples(),
    );
    println!("last frame draw order: {}", draws.borrow().join(" < "));

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    cadence_debug::chrome::export(recorder.as_bytes(), FRAME_INTERVAL_60HZ_US, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} frames)");
}
