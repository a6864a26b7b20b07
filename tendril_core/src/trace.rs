// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the work loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`Runtime`](crate::runtime::Runtime) calls at each stage of a slice. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates per-unit [`UnitEvent`] and
//!   per-mutation [`HostMutationEvent`] events plus the corresponding
//!   `TraceSink` methods.

use crate::error::Phase;
use crate::runtime::{CommitSummary, WorkPhase};
use crate::time::HostTime;
use crate::timing::{TickKind, WorkTick};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a new work-in-progress root was seeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScheduleReason {
    /// [`Runtime::render`](crate::runtime::Runtime::render) was called.
    Render,
    /// A state setter queued a transition.
    StateUpdate,
}

/// What kind of fiber a unit of work processed.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A host fiber (node creation and child reconciliation).
    Host,
    /// A component fiber (body invocation).
    Component,
}

/// Which host adapter operation ran.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// `create_node` during render.
    Create,
    /// `append_child` during commit.
    Append,
    /// `apply_props_diff` during commit.
    Update,
    /// `remove_child` during commit.
    Remove,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a driver hands the runtime a slice.
#[derive(Clone, Copy, Debug)]
pub struct TickEvent {
    /// Monotonic slice counter, assigned by the runtime.
    pub tick_index: u64,
    /// Host time reported by the driver.
    pub now: HostTime,
    /// Which callback delivered the slice.
    pub kind: TickKind,
    /// Work-loop phase on entry.
    pub phase: WorkPhase,
}

impl TickEvent {
    /// Creates a `TickEvent` from a [`WorkTick`].
    #[must_use]
    pub fn new(tick_index: u64, tick: &WorkTick, phase: WorkPhase) -> Self {
        Self {
            tick_index,
            now: tick.now,
            kind: tick.kind,
            phase,
        }
    }
}

/// Emitted when a new work-in-progress root is seeded.
#[derive(Clone, Copy, Debug)]
pub struct RootScheduledEvent {
    /// Slice in which the root was picked up.
    pub tick_index: u64,
    /// What asked for it.
    pub reason: ScheduleReason,
    /// Whether an in-flight work-in-progress tree was thrown away.
    pub discarded_work: bool,
}

/// Emitted when a slice ends without committing.
#[derive(Clone, Copy, Debug)]
pub struct SliceEndEvent {
    /// Slice counter.
    pub tick_index: u64,
    /// Units of work performed in this slice.
    pub units: u32,
    /// Work-loop phase on exit.
    pub phase: WorkPhase,
}

/// Emitted after a commit finishes.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Slice counter.
    pub tick_index: u64,
    /// Units of work performed in the committing slice.
    pub units: u32,
    /// What the commit did.
    pub summary: CommitSummary,
}

/// Emitted when a host failure abandons the work-in-progress tree.
#[derive(Clone, Copy, Debug)]
pub struct WorkAbandonedEvent {
    /// Slice counter.
    pub tick_index: u64,
    /// Phase in which the adapter failed.
    pub phase: Phase,
}

/// A single unit of work.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct UnitEvent {
    /// Slice counter.
    pub tick_index: u64,
    /// Slot index of the processed fiber.
    pub fiber: u32,
    /// Host or component.
    pub kind: UnitKind,
}

/// A single host adapter call.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct HostMutationEvent {
    /// Slice counter.
    pub tick_index: u64,
    /// Slot index of the fiber whose node was touched.
    pub fiber: u32,
    /// Which operation ran.
    pub kind: MutationKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the work loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the start of every slice.
    fn on_tick(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called when a new work-in-progress root is seeded.
    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        _ = e;
    }

    /// Called when a slice yields or finds nothing to do.
    fn on_slice_end(&mut self, e: &SliceEndEvent) {
        _ = e;
    }

    /// Called after a commit.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called when a host failure abandons work.
    fn on_work_abandoned(&mut self, e: &WorkAbandonedEvent) {
        _ = e;
    }

    /// Called for every unit of work (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_unit(&mut self, e: &UnitEvent) {
        _ = e;
    }

    /// Called for every host adapter call (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_host_mutation(&mut self, e: &HostMutationEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`TickEvent`].
    #[inline]
    pub fn tick(&mut self, e: &TickEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RootScheduledEvent`].
    #[inline]
    pub fn root_scheduled(&mut self, e: &RootScheduledEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_root_scheduled(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SliceEndEvent`].
    #[inline]
    pub fn slice_end(&mut self, e: &SliceEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slice_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`WorkAbandonedEvent`].
    #[inline]
    pub fn work_abandoned(&mut self, e: &WorkAbandonedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_work_abandoned(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`UnitEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn unit(&mut self, e: &UnitEvent) {
        if let Some(s) = &mut self.sink {
            s.on_unit(e);
        }
    }

    /// Emits a [`HostMutationEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn host_mutation(&mut self, e: &HostMutationEvent) {
        if let Some(s) = &mut self.sink {
            s.on_host_mutation(e);
        }
    }
}

// ----- Tests -----
