// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use tendril_core::error::Phase;
use tendril_core::runtime::{CommitSummary, WorkPhase};
use tendril_core::time::HostTime;
use tendril_core::timing::TickKind;
use tendril_core::trace::{
    CommitEvent, HostMutationEvent, MutationKind, RootScheduledEvent, ScheduleReason,
    SliceEndEvent, TickEvent, TraceSink, UnitEvent, UnitKind, WorkAbandonedEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TICK: u8 = 1;
const TAG_ROOT_SCHEDULED: u8 = 2;
const TAG_SLICE_END: u8 = 3;
const TAG_COMMIT: u8 = 4;
const TAG_WORK_ABANDONED: u8 = 5;
const TAG_UNIT: u8 = 6;
const TAG_HOST_MUTATION: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_work_phase(&mut self, p: WorkPhase) {
        self.write_u8(match p {
            WorkPhase::Idle => 0,
            WorkPhase::Working => 1,
            WorkPhase::ReadyToCommit => 2,
        });
    }

    fn write_phase(&mut self, p: Phase) {
        self.write_u8(match p {
            Phase::Render => 0,
            Phase::Commit => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_tick(&mut self, e: &TickEvent) {
        self.write_u8(TAG_TICK);
        self.write_u64(e.tick_index);
        self.write_u64(e.now.ticks());
        self.write_u8(match e.kind {
            TickKind::AnimationFrame => 0,
            TickKind::Timeout => 1,
            TickKind::Idle => 2,
            TickKind::Manual => 3,
        });
        self.write_work_phase(e.phase);
    }

    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        self.write_u8(TAG_ROOT_SCHEDULED);
        self.write_u64(e.tick_index);
        self.write_u8(match e.reason {
            ScheduleReason::Render => 0,
            ScheduleReason::StateUpdate => 1,
        });
        self.write_u8(u8::from(e.discarded_work));
    }

    fn on_slice_end(&mut self, e: &SliceEndEvent) {
        self.write_u8(TAG_SLICE_END);
        self.write_u64(e.tick_index);
        self.write_u32(e.units);
        self.write_work_phase(e.phase);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u64(e.tick_index);
        self.write_u32(e.units);
        let s = &e.summary;
        for v in [
            s.placements,
            s.updates,
            s.deletions,
            s.effects_run,
            s.cleanups_run,
            s.fibers_freed,
        ] {
            self.write_u32(v);
        }
    }

    fn on_work_abandoned(&mut self, e: &WorkAbandonedEvent) {
        self.write_u8(TAG_WORK_ABANDONED);
        self.write_u64(e.tick_index);
        self.write_phase(e.phase);
    }

    fn on_unit(&mut self, e: &UnitEvent) {
        self.write_u8(TAG_UNIT);
        self.write_u64(e.tick_index);
        self.write_u32(e.fiber);
        self.write_u8(match e.kind {
            UnitKind::Host => 0,
            UnitKind::Component => 1,
        });
    }

    fn on_host_mutation(&mut self, e: &HostMutationEvent) {
        self.write_u8(TAG_HOST_MUTATION);
        self.write_u64(e.tick_index);
        self.write_u32(e.fiber);
        self.write_u8(match e.kind {
            MutationKind::Create => 0,
            MutationKind::Append => 1,
            MutationKind::Update => 2,
            MutationKind::Remove => 3,
        });
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`TickEvent`].
    Tick(TickEvent),
    /// A [`RootScheduledEvent`].
    RootScheduled(RootScheduledEvent),
    /// A [`SliceEndEvent`].
    SliceEnd(SliceEndEvent),
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// A [`WorkAbandonedEvent`].
    WorkAbandoned(WorkAbandonedEvent),
    /// A [`UnitEvent`].
    Unit(UnitEvent),
    /// A [`HostMutationEvent`].
    HostMutation(HostMutationEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_work_phase(&mut self) -> Option<WorkPhase> {
        Some(match self.read_u8()? {
            0 => WorkPhase::Idle,
            1 => WorkPhase::Working,
            _ => WorkPhase::ReadyToCommit,
        })
    }

    fn read_phase(&mut self) -> Option<Phase> {
        Some(match self.read_u8()? {
            0 => Phase::Render,
            _ => Phase::Commit,
        })
    }

    fn decode_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Tick(TickEvent {
            tick_index: self.read_u64()?,
            now: HostTime(self.read_u64()?),
            kind: match self.read_u8()? {
                0 => TickKind::AnimationFrame,
                1 => TickKind::Timeout,
                2 => TickKind::Idle,
                _ => TickKind::Manual,
            },
            phase: self.read_work_phase()?,
        }))
    }

    fn decode_root_scheduled(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RootScheduled(RootScheduledEvent {
            tick_index: self.read_u64()?,
            reason: match self.read_u8()? {
                0 => ScheduleReason::Render,
                _ => ScheduleReason::StateUpdate,
            },
            discarded_work: self.read_u8()? != 0,
        }))
    }

    fn decode_slice_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SliceEnd(SliceEndEvent {
            tick_index: self.read_u64()?,
            units: self.read_u32()?,
            phase: self.read_work_phase()?,
        }))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            tick_index: self.read_u64()?,
            units: self.read_u32()?,
            summary: CommitSummary {
                placements: self.read_u32()?,
                updates: self.read_u32()?,
                deletions: self.read_u32()?,
                effects_run: self.read_u32()?,
                cleanups_run: self.read_u32()?,
                fibers_freed: self.read_u32()?,
            },
        }))
    }

    fn decode_work_abandoned(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::WorkAbandoned(WorkAbandonedEvent {
            tick_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_unit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Unit(UnitEvent {
            tick_index: self.read_u64()?,
            fiber: self.read_u32()?,
            kind: match self.read_u8()? {
                0 => UnitKind::Host,
                _ => UnitKind::Component,
            },
        }))
    }

    fn decode_host_mutation(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::HostMutation(HostMutationEvent {
            tick_index: self.read_u64()?,
            fiber: self.read_u32()?,
            kind: match self.read_u8()? {
                0 => MutationKind::Create,
                1 => MutationKind::Append,
                2 => MutationKind::Update,
                _ => MutationKind::Remove,
            },
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_TICK => self.decode_tick(),
            TAG_ROOT_SCHEDULED => self.decode_root_scheduled(),
            TAG_SLICE_END => self.decode_slice_end(),
            TAG_COMMIT => self.decode_commit(),
            TAG_WORK_ABANDONED => self.decode_work_abandoned(),
            TAG_UNIT => self.decode_unit(),
            TAG_HOST_MUTATION => self.decode_host_mutation(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tendril_core::element::{h, text};
    use tendril_core::headless::HeadlessHost;
    use tendril_core::runtime::{Runtime, RuntimeConfig, TickOutcome};
    use tendril_core::timing::{UnitBudget, WorkTick};
    use tendril_core::trace::Tracer;

    /// Records a two-slice render of a small tree.
    fn record_render() -> Vec<u8> {
        let mut rec = RecorderSink::new();
        let mut rt = Runtime::new(HeadlessHost::new(), RuntimeConfig::headless());
        let container = rt.host_mut().create_container();
        rt.render(h("ul").child(h("li").child(text("a"))).build(), container);

        let mut tracer = Tracer::new(&mut rec);
        let first = rt
            .tick_traced(&WorkTick::manual(HostTime(10)), &UnitBudget::new(2), &mut tracer)
            .unwrap();
        assert_eq!(first, TickOutcome::Yielded { units: 2 });
        let second = rt
            .tick_traced(&WorkTick::manual(HostTime(20)), &UnitBudget::new(8), &mut tracer)
            .unwrap();
        assert!(matches!(second, TickOutcome::Committed { units: 2, .. }));
        rec.into_bytes()
    }

    #[test]
    fn records_a_traced_render() {
        let events: Vec<RecordedEvent> = decode(&record_render()).collect();

        let ticks: Vec<&TickEvent> = events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Tick(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].now, HostTime(10));
        assert_eq!(ticks[0].kind, TickKind::Manual);
        assert_eq!(ticks[1].phase, WorkPhase::Working);

        assert!(matches!(
            events[1],
            RecordedEvent::RootScheduled(RootScheduledEvent {
                reason: ScheduleReason::Render,
                discarded_work: false,
                ..
            })
        ));

        let commit = events
            .iter()
            .find_map(|e| match e {
                RecordedEvent::Commit(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(commit.tick_index, 2);
        assert_eq!(commit.summary.placements, 3);

        let units = events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Unit(_)))
            .count();
        assert_eq!(units, 4);
        let creates = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    RecordedEvent::HostMutation(HostMutationEvent {
                        kind: MutationKind::Create,
                        ..
                    })
                )
            })
            .count();
        assert_eq!(creates, 3);
    }

    #[test]
    fn slice_end_and_abandon_survive_encoding() {
        let mut rec = RecorderSink::new();
        rec.on_slice_end(&SliceEndEvent {
            tick_index: 9,
            units: 5,
            phase: WorkPhase::ReadyToCommit,
        });
        rec.on_work_abandoned(&WorkAbandonedEvent {
            tick_index: 9,
            phase: Phase::Commit,
        });
        let events: Vec<RecordedEvent> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        let RecordedEvent::SliceEnd(end) = &events[0] else {
            panic!("expected slice end, got {:?}", events[0]);
        };
        assert_eq!((end.units, end.phase), (5, WorkPhase::ReadyToCommit));
        let RecordedEvent::WorkAbandoned(abandoned) = &events[1] else {
            panic!("expected abandon, got {:?}", events[1]);
        };
        assert_eq!(abandoned.phase, Phase::Commit);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let bytes = record_render();
        let events = decode(&bytes[..bytes.len() - 1]).count();
        assert!(events < decode(&bytes).count());
    }
}
