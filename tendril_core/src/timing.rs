// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick source and deadline contract.
//!
//! The work loop never reads a clock on its own. Instead, each slice is handed
//! a [`Deadline`] capability that answers "how much time is left?", which keeps
//! the core independent of any particular host clock:
//!
//! - [`SliceDeadline`]: a [`Clock`] plus a start time and a budget; the shape
//!   every real driver uses.
//! - [`UnitBudget`]: a deterministic test double where every query consumes
//!   one unit of budget, so "N units per slice" is exact.
//! - [`Unbounded`]: never expires; used by
//!   [`Runtime::flush`](crate::runtime::Runtime::flush).
//!
//! A driver describes the host callback that produced a slice with a
//! [`WorkTick`] so tracing can tell animation-frame slices from timer
//! fallbacks.

use core::cell::Cell;

use crate::time::{Duration, HostTime};

/// Which host mechanism delivered a work slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// A display-synchronized callback (`requestAnimationFrame`).
    AnimationFrame,
    /// A timer fallback, used when no frame callback arrives.
    Timeout,
    /// An idle callback.
    Idle,
    /// Driven explicitly by the embedder (tests, headless tools).
    Manual,
}

/// A work opportunity delivered by a driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkTick {
    /// Host time at which the callback fired.
    pub now: HostTime,
    /// Which callback fired.
    pub kind: TickKind,
}

impl WorkTick {
    /// A manual tick at the given time.
    #[inline]
    #[must_use]
    pub const fn manual(now: HostTime) -> Self {
        Self {
            now,
            kind: TickKind::Manual,
        }
    }
}

/// Answers how much of the current slice remains.
///
/// The work loop queries this exactly once before each unit of work and
/// yields as soon as it reports [`Duration::ZERO`].
pub trait Deadline {
    /// Time left in the current slice.
    fn time_remaining(&self) -> Duration;
}

impl<D: Deadline + ?Sized> Deadline for &D {
    fn time_remaining(&self) -> Duration {
        (**self).time_remaining()
    }
}

/// A monotonic clock.
pub trait Clock {
    /// Current host time.
    fn now(&self) -> HostTime;
}

/// A deadline that expires `budget` ticks after `start` on `clock`.
#[derive(Debug)]
pub struct SliceDeadline<'a, C: Clock + ?Sized> {
    clock: &'a C,
    end: HostTime,
}

impl<'a, C: Clock + ?Sized> SliceDeadline<'a, C> {
    /// Creates a deadline for a slice that started at `start`.
    #[must_use]
    pub fn new(clock: &'a C, start: HostTime, budget: Duration) -> Self {
        Self {
            clock,
            end: start.saturating_add(budget),
        }
    }

    /// Creates a deadline for a slice starting at the tick's timestamp.
    #[must_use]
    pub fn for_tick(clock: &'a C, tick: &WorkTick, budget: Duration) -> Self {
        Self::new(clock, tick.now, budget)
    }

    /// The host time at which this slice ends.
    #[must_use]
    pub fn end(&self) -> HostTime {
        self.end
    }
}

impl<C: Clock + ?Sized> Deadline for SliceDeadline<'_, C> {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(self.clock.now())
    }
}

/// Deterministic deadline: allows exactly `units` queries to report time left.
///
/// Each call to [`time_remaining`](Deadline::time_remaining) consumes one unit,
/// so a work loop handed `UnitBudget::new(3)` performs at most three units of
/// work before yielding.
#[derive(Debug)]
pub struct UnitBudget {
    remaining: Cell<u32>,
}

impl UnitBudget {
    /// Creates a budget of `units` queries.
    #[must_use]
    pub const fn new(units: u32) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }

    /// Units not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining.get()
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        let left = self.remaining.get();
        if left == 0 {
            return Duration::ZERO;
        }
        self.remaining.set(left - 1);
        Duration(u64::from(left))
    }
}

/// A deadline that never expires.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// A clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub const fn new(start: HostTime) -> Self {
        Self {
            now: Cell::new(start.0),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by.0));
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, to: HostTime) {
        self.now.set(to.0);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.now.get())
    }
}

// ----- Tests -----

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_budget_counts_down() {
        let budget = UnitBudget::new(2);
        assert!(!budget.time_remaining().is_zero());
        assert!(!budget.time_remaining().is_zero());
        assert!(budget.time_remaining().is_zero());
        assert!(budget.time_remaining().is_zero());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn slice_deadline_tracks_clock() {
        let clock = ManualClock::new(HostTime(1_000));
        let tick = WorkTick::manual(clock.now());
        let deadline = SliceDeadline::for_tick(&clock, &tick, Duration(50));
        assert_eq!(deadline.end(), HostTime(1_050));
        assert_eq!(deadline.time_remaining(), Duration(50));
        clock.advance(Duration(30));
        assert_eq!(deadline.time_remaining(), Duration(20));
        clock.advance(Duration(30));
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn unbounded_never_expires() {
        assert_eq!(Unbounded.time_remaining(), Duration::MAX);
    }

    #[test]
    fn deadline_through_reference() {
        fn query<D: Deadline>(deadline: D) -> Duration {
            deadline.time_remaining()
        }
        let budget = UnitBudget::new(1);
        assert!(!query(&budget).is_zero());
        assert!(query(&budget).is_zero());
    }
}
