// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Only [`TickEvent`](tendril_core::trace::TickEvent)s carry a timestamp; every
//! later event is stamped with the time of the tick it belongs to.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use tendril_core::time::Timebase;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Each slice becomes a `B`/`E` pair named `Slice` (or `Commit` when the
/// slice committed); scheduling and abandon events are instants.
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Tick(e) => {
                ts = ticks_to_us(e.now.ticks(), timebase);
                events.push(json!({
                    "ph": "B",
                    "name": "Slice",
                    "cat": "WorkLoop",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "tick_index": e.tick_index,
                        "kind": format!("{:?}", e.kind),
                        "phase": format!("{:?}", e.phase),
                    }
                }));
            }
            RecordedEvent::RootScheduled(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RootScheduled",
                    "cat": "WorkLoop",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "tick_index": e.tick_index,
                        "reason": format!("{:?}", e.reason),
                        "discarded_work": e.discarded_work,
                    }
                }));
            }
            RecordedEvent::SliceEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Slice",
                    "cat": "WorkLoop",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "tick_index": e.tick_index,
                        "units": e.units,
                        "phase": format!("{:?}", e.phase),
                    }
                }));
            }
            RecordedEvent::Commit(e) => {
                let s = e.summary;
                events.push(json!({
                    "ph": "E",
                    "name": "Slice",
                    "cat": "WorkLoop",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "tick_index": e.tick_index,
                        "units": e.units,
                        "committed": true,
                    }
                }));
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Commit",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tick_index": e.tick_index,
                        "placements": s.placements,
                        "updates": s.updates,
                        "deletions": s.deletions,
                        "effects_run": s.effects_run,
                        "cleanups_run": s.cleanups_run,
                        "fibers_freed": s.fibers_freed,
                    }
                }));
            }
            RecordedEvent::WorkAbandoned(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Slice",
                    "cat": "WorkLoop",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "tick_index": e.tick_index,
                        "abandoned": format!("{}", e.phase),
                    }
                }));
            }
            RecordedEvent::Unit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.kind),
                    "cat": "Unit",
                    "ts": ts,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "tick_index": e.tick_index,
                        "fiber": e.fiber,
                    }
                }));
            }
            RecordedEvent::HostMutation(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.kind),
                    "cat": "Host",
                    "ts": ts,
                    "pid": 0,
                    "tid": 2,
                    "s": "t",
                    "args": {
                        "tick_index": e.tick_index,
                        "fiber": e.fiber,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use tendril_core::runtime::{CommitSummary, WorkPhase};
    use tendril_core::time::HostTime;
    use tendril_core::timing::WorkTick;
    use tendril_core::trace::{
        CommitEvent, RootScheduledEvent, ScheduleReason, TickEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&TickEvent::new(
            1,
            &WorkTick::manual(HostTime(1_000_000)),
            WorkPhase::Idle,
        ));
        rec.on_root_scheduled(&RootScheduledEvent {
            tick_index: 1,
            reason: ScheduleReason::Render,
            discarded_work: false,
        });
        rec.on_commit(&CommitEvent {
            tick_index: 1,
            units: 4,
            summary: CommitSummary::default(),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Slice");
        assert_eq!(parsed[0]["ts"], 1000.0);

        assert_eq!(parsed[1]["name"], "RootScheduled");
        assert_eq!(parsed[1]["ts"], 1000.0);

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["args"]["units"], 4);

        assert_eq!(parsed[3]["name"], "Commit");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
