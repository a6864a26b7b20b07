// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use tendril_core::runtime::WorkPhase;
use tendril_core::time::{HostTime, Timebase};
use tendril_core::trace::{
    CommitEvent, HostMutationEvent, RootScheduledEvent, SliceEndEvent, TickEvent, TraceSink,
    UnitEvent, WorkAbandonedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    /// Per-unit and per-mutation lines are noisy; off by default.
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::new(Box::new(std::io::stderr()), timebase)
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self::with_writer(writer, timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            verbose: false,
        }
    }

    /// Also print a line for every unit of work and host mutation.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0
    }
}

fn phase_name(phase: WorkPhase) -> &'static str {
    match phase {
        WorkPhase::Idle => "idle",
        WorkPhase::Working => "working",
        WorkPhase::ReadyToCommit => "ready",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick(&mut self, e: &TickEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] #{} {:?} now={:.1}µs phase={}",
            e.tick_index,
            e.kind,
            self.host_us(e.now),
            phase_name(e.phase),
        );
    }

    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        let discarded = if e.discarded_work { " (discarded wip)" } else { "" };
        let _ = writeln!(
            self.writer,
            "[schedule] #{} reason={:?}{discarded}",
            e.tick_index, e.reason,
        );
    }

    fn on_slice_end(&mut self, e: &SliceEndEvent) {
        let _ = writeln!(
            self.writer,
            "[yield] #{} units={} phase={}",
            e.tick_index,
            e.units,
            phase_name(e.phase),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let s = &e.summary;
        let _ = writeln!(
            self.writer,
            "[commit] #{} units={} placed={} updated={} deleted={} \
             effects={} cleanups={} freed={}",
            e.tick_index,
            e.units,
            s.placements,
            s.updates,
            s.deletions,
            s.effects_run,
            s.cleanups_run,
            s.fibers_freed,
        );
    }

    fn on_work_abandoned(&mut self, e: &WorkAbandonedEvent) {
        let _ = writeln!(
            self.writer,
            "[abandon] #{} host failure during {}",
            e.tick_index, e.phase,
        );
    }

    fn on_unit(&mut self, e: &UnitEvent) {
        if self.verbose {
            let _ = writeln!(
                self.writer,
                "[unit] #{} fiber={} {:?}",
                e.tick_index, e.fiber, e.kind,
            );
        }
    }

    fn on_host_mutation(&mut self, e: &HostMutationEvent) {
        if self.verbose {
            let _ = writeln!(
                self.writer,
                "[host] #{} fiber={} {:?}",
                e.tick_index, e.fiber, e.kind,
            );
        }
    }
}
