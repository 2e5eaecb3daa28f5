// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Dispatch events carry frame numbers rather than wall-clock time, so each
//! frame is laid out at `frame * frame_interval_us`, and events within a
//! frame are spaced one microsecond apart in recording order.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Frame interval of a 60 Hz display, in microseconds.
pub const FRAME_INTERVAL_60HZ_US: f64 = 1_000_000.0 / 60.0;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Each tick becomes a `Tick` duration slice with one nested slice per
/// category phase; job activity becomes instant events.
pub fn export(bytes: &[u8], frame_interval_us: f64, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut clock = FrameClock::new(frame_interval_us);

    for recorded in decode(bytes) {
        let ts = clock.stamp(recorded.frame());
        match recorded {
            RecordedEvent::TickBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Tick",
                    "cat": "Dispatch",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame": e.frame,
                        "jobs": e.jobs,
                        "pending": e.pending,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": e.category.as_str(),
                    "cat": "Phase",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame": e.frame,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": e.category.as_str(),
                    "cat": "Phase",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame": e.frame,
                        "fired": e.fired,
                    }
                }));
            }
            RecordedEvent::JobFired(e) => {
                events.push(job_instant("Fire", ts, e.frame, e.id.0, e.category.as_str()));
            }
            RecordedEvent::JobSuspended(e) => {
                events.push(job_instant("Suspend", ts, e.frame, e.id.0, e.category.as_str()));
            }
            RecordedEvent::JobSettled(e) => {
                let mut event = job_instant("Settle", ts, e.frame, e.id.0, e.category.as_str());
                event["args"]["detached"] = json!(e.detached);
                events.push(event);
            }
            RecordedEvent::JobFailed {
                frame,
                id,
                category,
            } => {
                let mut event = job_instant("Fail", ts, frame, id.0, category.as_str());
                event["s"] = json!("g");
                events.push(event);
            }
            RecordedEvent::Compaction(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Compact",
                    "cat": "Dispatch",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame": e.frame,
                        "removed": e.removed,
                        "retained": e.retained,
                        "detached": e.detached,
                    }
                }));
            }
            RecordedEvent::TickStats(s) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Tick",
                    "cat": "Dispatch",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame": s.frame,
                        "fired": s.fired,
                        "suspended": s.suspended,
                        "settled": s.settled,
                        "failed": s.failed,
                        "removed": s.removed,
                        "retained": s.retained,
                        "halted": s.halted,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn job_instant(name: &str, ts: f64, frame: u64, id: u64, category: &str) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": "Job",
        "ts": ts,
        "pid": 0,
        "tid": 0,
        "s": "t",
        "args": {
            "frame": frame,
            "job": id,
            "category": category,
        }
    })
}

/// Maps frame numbers to synthetic microsecond timestamps.
struct FrameClock {
    interval_us: f64,
    frame: u64,
    seq: u32,
}

impl FrameClock {
    fn new(interval_us: f64) -> Self {
        Self {
            interval_us,
            frame: 0,
            seq: 0,
        }
    }

    fn stamp(&mut self, frame: u64) -> f64 {
        if frame != self.frame {
            self.frame = frame;
            self.seq = 0;
        }
        let ts = frame as f64 * self.interval_us + f64::from(self.seq);
        self.seq += 1;
        ts
    }
}

#[cfg(test)]
mod tests {
    use cadence_core::job::{Category, JobId};
    use cadence_core::trace::{
        JobFiredEvent, PhaseBeginEvent, PhaseEndEvent, TickBeginEvent, TickStats, TraceSink,
    };

    use super::*;
    use crate::recorder::RecorderSink;

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_tick_begin(&TickBeginEvent {
            frame: 1,
            jobs: 1,
            pending: 0,
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            frame: 1,
            category: Category::Render,
        });
        rec.on_job_fired(&JobFiredEvent {
            frame: 1,
            id: JobId(4),
            category: Category::Render,
            recurring: true,
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame: 1,
            category: Category::Render,
            fired: 1,
        });
        rec.on_tick_stats(&TickStats {
            frame: 1,
            fired: 1,
            ..TickStats::default()
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), 1000.0, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 5);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Tick");
        assert_eq!(parsed[1]["name"], "render");
        assert_eq!(parsed[2]["ph"], "i");
        assert_eq!(parsed[2]["args"]["job"], 4);
        assert_eq!(parsed[3]["ph"], "E");
        assert_eq!(parsed[4]["ph"], "E");
        assert_eq!(parsed[4]["name"], "Tick");
    }

    #[test]
    fn frames_are_laid_out_at_the_interval() {
        let mut rec = RecorderSink::new();
        for frame in [1, 1, 2] {
            rec.on_tick_begin(&TickBeginEvent {
                frame,
                jobs: 0,
                pending: 0,
            });
        }

        let mut out = Vec::new();
        export(rec.as_bytes(), 500.0, &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["ts"], 500.0);
        assert_eq!(parsed[1]["ts"], 501.0, "same frame, next sequence slot");
        assert_eq!(parsed[2]["ts"], 1000.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], FRAME_INTERVAL_60HZ_US, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
