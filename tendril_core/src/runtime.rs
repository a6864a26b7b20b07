// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The time-sliced work loop.
//!
//! A [`Runtime`] owns the fiber store, the host adapter and the two tree
//! roots. Work happens only inside [`Runtime::tick`]: the runtime performs
//! units of work while the slice's [`Deadline`] reports time remaining, then
//! either yields with the work-in-progress tree intact or, once every unit is
//! done, commits the whole tree in one go.
//!
//! ```text
//!  render() / setter ──▶ seed WIP root ──▶ tick ─▶ unit ─▶ unit ─▶ …
//!                                            │                   │
//!                                            └── deadline ─▶ Yielded
//!                                                                │
//!                                          next_unit = None ─▶ commit ─▶ Committed
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::commit::CommitFailure;
use crate::element::{Component, Element, ElementType, HostTag};
use crate::error::{Phase, RenderError};
use crate::fiber::{EffectTag, FiberId, FiberStore};
use crate::hooks::{HookConfig, Hooks, UpdateSignal};
use crate::host::HostAdapter;
use crate::props::Props;
use crate::reconcile::reconcile_children;
use crate::time::{Duration, Timebase};
use crate::timing::{Clock, Deadline, SliceDeadline, Unbounded, WorkTick};
use crate::trace::{
    CommitEvent, RootScheduledEvent, ScheduleReason, SliceEndEvent, TickEvent, Tracer,
    WorkAbandonedEvent,
};
#[cfg(feature = "trace-rich")]
use crate::trace::{HostMutationEvent, MutationKind, UnitEvent, UnitKind};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Runtime tunables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How long one slice may run, in the driver clock's ticks.
    pub slice_budget: Duration,
    /// Policies for hooks called without a dependency list.
    pub hooks: HookConfig,
}

impl RuntimeConfig {
    /// Browser preset: 5 ms slices on a microsecond clock.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            slice_budget: Duration::from_millis(5, Timebase::MICROS),
            hooks: HookConfig::DEFAULT,
        }
    }

    /// Headless preset: 5 ms slices on a nanosecond clock.
    #[must_use]
    pub const fn headless() -> Self {
        Self {
            slice_budget: Duration::from_millis(5, Timebase::NANOS),
            hooks: HookConfig::DEFAULT,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::headless()
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Where the work loop stands between slices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkPhase {
    /// No work-in-progress tree.
    Idle,
    /// A work-in-progress tree has units left to perform.
    Working,
    /// Every unit is done; the next slice commits.
    ReadyToCommit,
}

/// What a commit did to the host and to the fiber store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CommitSummary {
    /// Host nodes appended.
    pub placements: u32,
    /// Host nodes whose props were diffed.
    pub updates: u32,
    /// Host nodes removed.
    pub deletions: u32,
    /// Effect bodies run.
    pub effects_run: u32,
    /// Effect cleanups run (re-run or unmount).
    pub cleanups_run: u32,
    /// Fibers released by the post-commit sweep.
    pub fibers_freed: u32,
}

/// The result of one slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// There was nothing to do.
    Idle,
    /// The deadline expired with work left. Schedule another slice.
    Yielded {
        /// Units performed in this slice.
        units: u32,
    },
    /// The work-in-progress tree was committed.
    Committed {
        /// Units performed in this slice.
        units: u32,
        /// What the commit did.
        summary: CommitSummary,
    },
}

impl TickOutcome {
    /// Returns `true` if the driver should schedule another slice.
    #[must_use]
    pub fn wants_more(&self) -> bool {
        matches!(self, Self::Yielded { .. })
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// A reconciliation root bound to one host adapter.
pub struct Runtime<H: HostAdapter> {
    pub(crate) host: H,
    config: RuntimeConfig,
    pub(crate) fibers: FiberStore<H::Node>,

    // -- Tree roots --
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,

    // -- Scheduling --
    updates: UpdateSignal,
    /// Set by `render`, reported at the start of the next slice. Holds
    /// whether an in-flight tree was discarded.
    render_scheduled: Option<bool>,
    pub(crate) tick_index: u64,
}

impl<H: HostAdapter> fmt::Debug for Runtime<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("phase", &self.phase())
            .field("current_root", &self.current_root)
            .field("wip_root", &self.wip_root)
            .field("tick_index", &self.tick_index)
            .field("fibers", &self.fibers)
            .finish_non_exhaustive()
    }
}

impl<H: HostAdapter> Runtime<H> {
    /// Creates an idle runtime.
    #[must_use]
    pub fn new(host: H, config: RuntimeConfig) -> Self {
        Self {
            host,
            config,
            fibers: FiberStore::new(),
            current_root: None,
            wip_root: None,
            next_unit: None,
            deletions: Vec::new(),
            updates: UpdateSignal::default(),
            render_scheduled: None,
            tick_index: 0,
        }
    }

    // -- Accessors --

    /// The configuration the runtime was created with.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The host adapter.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host adapter, mutably. Use it to dispatch events or inject
    /// failures; never mutate nodes the runtime owns.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The fiber store, for inspection.
    #[must_use]
    pub fn fibers(&self) -> &FiberStore<H::Node> {
        &self.fibers
    }

    /// Root of the last committed tree.
    #[must_use]
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the tree being built, if any.
    #[must_use]
    pub fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// Where the work loop stands.
    #[must_use]
    pub fn phase(&self) -> WorkPhase {
        match (self.wip_root, self.next_unit) {
            (None, _) => WorkPhase::Idle,
            (Some(_), Some(_)) => WorkPhase::Working,
            (Some(_), None) => WorkPhase::ReadyToCommit,
        }
    }

    /// Returns `true` if a state setter has queued a transition that no
    /// render has picked up yet.
    #[must_use]
    pub fn has_pending_update(&self) -> bool {
        self.updates.is_requested()
    }

    /// Returns `true` if a slice would do something.
    #[must_use]
    pub fn needs_work(&self) -> bool {
        self.wip_root.is_some() || (self.current_root.is_some() && self.updates.is_requested())
    }

    /// Builds a [`SliceDeadline`] for `tick` using the configured budget.
    #[must_use]
    pub fn slice_deadline<'c, C: Clock + ?Sized>(
        &self,
        clock: &'c C,
        tick: &WorkTick,
    ) -> SliceDeadline<'c, C> {
        SliceDeadline::for_tick(clock, tick, self.config.slice_budget)
    }

    // -- Scheduling --

    /// Schedules `element` to be rendered into `container`.
    ///
    /// Nothing happens until the next [`tick`](Self::tick). Any in-flight
    /// work is discarded; the new tree is diffed against the last committed
    /// one.
    pub fn render(&mut self, element: Element, container: H::Node) {
        let mut props = Props::new();
        props.push_child(element);
        let root = self
            .fibers
            .create_fiber(ElementType::Host(HostTag::ROOT), Rc::new(props));
        self.fibers.set_host_node(root, Some(container));
        self.fibers.set_alternate(root, self.current_root);

        self.render_scheduled = Some(self.wip_root.is_some());
        self.discard_wip();
        self.wip_root = Some(root);
        self.next_unit = Some(root);
        self.deletions.clear();
        // This render replays every queued transition.
        self.updates.clear();
    }

    /// Runs one slice without tracing. See [`tick_traced`](Self::tick_traced).
    pub fn tick(&mut self, deadline: &dyn Deadline) -> Result<TickOutcome, RenderError<H::Error>> {
        let tick = WorkTick::manual(crate::time::HostTime(0));
        self.tick_traced(&tick, deadline, &mut Tracer::none())
    }

    /// Runs one slice.
    ///
    /// Queries `deadline` once before every unit of work and stops as soon as
    /// it reports no time left. When the last unit finishes, the tree is
    /// committed in the same slice regardless of the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the host adapter fails. A render failure, or
    /// a commit failure before the host changed, drops the work-in-progress
    /// tree and the last committed tree stays current. A commit failure after
    /// the host changed finishes the commit and promotes the new tree; a node
    /// that could not be placed is placed again by the next render.
    pub fn tick_traced(
        &mut self,
        tick: &WorkTick,
        deadline: &dyn Deadline,
        tracer: &mut Tracer<'_>,
    ) -> Result<TickOutcome, RenderError<H::Error>> {
        self.tick_index += 1;
        tracer.tick(&TickEvent::new(self.tick_index, tick, self.phase()));

        if let Some(discarded_work) = self.render_scheduled.take() {
            tracer.root_scheduled(&RootScheduledEvent {
                tick_index: self.tick_index,
                reason: ScheduleReason::Render,
                discarded_work,
            });
        }
        self.poll_updates(tracer);

        let mut units = 0_u32;
        while let Some(unit) = self.next_unit {
            if deadline.time_remaining().is_zero() {
                break;
            }
            match self.perform_unit(unit, tracer) {
                Ok(next) => self.next_unit = next,
                Err(err) => {
                    self.abandon(Phase::Render, tracer);
                    return Err(err);
                }
            }
            units = units.saturating_add(1);
            self.poll_updates(tracer);
        }

        if self.next_unit.is_none()
            && let Some(root) = self.wip_root
        {
            return match self.commit(root, tracer) {
                Ok(summary) => {
                    tracer.commit(&CommitEvent {
                        tick_index: self.tick_index,
                        units,
                        summary,
                    });
                    Ok(TickOutcome::Committed { units, summary })
                }
                Err(CommitFailure {
                    error,
                    promoted: Some(summary),
                }) => {
                    tracer.commit(&CommitEvent {
                        tick_index: self.tick_index,
                        units,
                        summary,
                    });
                    Err(error)
                }
                Err(CommitFailure {
                    error,
                    promoted: None,
                }) => {
                    self.abandon(Phase::Commit, tracer);
                    Err(error)
                }
            };
        }

        tracer.slice_end(&SliceEndEvent {
            tick_index: self.tick_index,
            units,
            phase: self.phase(),
        });
        Ok(if self.wip_root.is_some() {
            TickOutcome::Yielded { units }
        } else {
            TickOutcome::Idle
        })
    }

    /// Runs slices with an unbounded deadline until nothing is left to do,
    /// including re-renders requested by effects.
    ///
    /// Returns the summary of the last commit, if any.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RenderError`].
    pub fn flush(&mut self) -> Result<Option<CommitSummary>, RenderError<H::Error>> {
        let mut last = None;
        loop {
            match self.tick(&Unbounded)? {
                TickOutcome::Idle => return Ok(last),
                TickOutcome::Committed { summary, .. } => last = Some(summary),
                TickOutcome::Yielded { .. } => {}
            }
        }
    }

    // -- Work loop internals --

    /// Restarts from the committed tree if a setter fired.
    ///
    /// Before the first commit there is nothing to restart from, so the
    /// request stays pending until one exists.
    fn poll_updates(&mut self, tracer: &mut Tracer<'_>) {
        if !self.updates.is_requested() {
            return;
        }
        let Some(current) = self.current_root else {
            return;
        };
        self.updates.clear();

        let discarded_work = self.wip_root.is_some();
        self.discard_wip();
        let root = self.fibers.create_fiber(
            self.fibers.element_type(current).clone(),
            Rc::clone(self.fibers.shared_props(current)),
        );
        let container = self.fibers.host_node(current).cloned();
        self.fibers.set_host_node(root, container);
        self.fibers.set_alternate(root, Some(current));

        self.wip_root = Some(root);
        self.next_unit = Some(root);
        self.deletions.clear();
        tracer.root_scheduled(&RootScheduledEvent {
            tick_index: self.tick_index,
            reason: ScheduleReason::StateUpdate,
            discarded_work,
        });
    }

    /// Performs one unit and returns the next one in pre-order.
    fn perform_unit(
        &mut self,
        fiber: FiberId,
        tracer: &mut Tracer<'_>,
    ) -> Result<Option<FiberId>, RenderError<H::Error>> {
        match self.fibers.element_type(fiber).clone() {
            ElementType::Component(component) => {
                #[cfg(feature = "trace-rich")]
                tracer.unit(&UnitEvent {
                    tick_index: self.tick_index,
                    fiber: fiber.index(),
                    kind: UnitKind::Component,
                });
                self.update_component(fiber, &component);
            }
            ElementType::Host(tag) => {
                #[cfg(feature = "trace-rich")]
                tracer.unit(&UnitEvent {
                    tick_index: self.tick_index,
                    fiber: fiber.index(),
                    kind: UnitKind::Host,
                });
                self.update_host(fiber, &tag, tracer)?;
            }
        }
        Ok(self.fibers.next_unit(fiber))
    }

    fn update_component(&mut self, fiber: FiberId, component: &Component) {
        let props = Rc::clone(self.fibers.shared_props(fiber));
        let alternate = self.fibers.alternate(fiber);
        let (child, cells) = {
            let previous = alternate.and_then(|alt| self.fibers.hooks(alt));
            let mut hooks = Hooks::new(
                fiber,
                component.name(),
                previous,
                &self.updates,
                &self.config.hooks,
            );
            let child = component.render(&mut hooks, &props);
            (child, hooks.finish())
        };
        self.fibers.set_hooks(fiber, cells);
        reconcile_children(
            &mut self.fibers,
            &mut self.deletions,
            fiber,
            core::slice::from_ref(&child),
        );
    }

    fn update_host(
        &mut self,
        fiber: FiberId,
        tag: &HostTag,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RenderError<H::Error>> {
        let props = Rc::clone(self.fibers.shared_props(fiber));
        if self.fibers.host_node(fiber).is_none() {
            let node = self
                .host
                .create_node(tag, &props)
                .map_err(|err| RenderError::host(Phase::Render, fiber, err))?;
            self.fibers.set_host_node(fiber, Some(node));
            #[cfg(feature = "trace-rich")]
            tracer.host_mutation(&HostMutationEvent {
                tick_index: self.tick_index,
                fiber: fiber.index(),
                kind: MutationKind::Create,
            });
        }
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = tracer;
        }
        reconcile_children(&mut self.fibers, &mut self.deletions, fiber, props.children());
        Ok(())
    }

    /// Drops the work-in-progress tree, handing the nodes it created back to
    /// the host. Its fibers are released by the next commit's sweep.
    fn discard_wip(&mut self) {
        self.next_unit = None;
        if let Some(root) = self.wip_root.take() {
            self.discard_placed(root);
        }
    }

    /// Passes the node of every `Placement` fiber under `root` to
    /// [`HostAdapter::discard_node`].
    pub(crate) fn discard_placed(&mut self, root: FiberId) {
        let Self { fibers, host, .. } = self;
        for fiber in fibers.pre_order(root) {
            if fibers.effect_tag(fiber) == Some(EffectTag::Placement)
                && let Some(node) = fibers.host_node(fiber)
            {
                host.discard_node(node);
            }
        }
    }

    /// Drops the work-in-progress tree after a host failure.
    fn abandon(&mut self, phase: Phase, tracer: &mut Tracer<'_>) {
        self.discard_wip();
        self.deletions.clear();
        tracer.work_abandoned(&WorkAbandonedEvent {
            tick_index: self.tick_index,
            phase,
        });
    }
}

// ----- Tests -----
