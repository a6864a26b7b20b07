// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying a finished work-in-progress tree to the host.
//!
//! A commit runs in four passes:
//!
//! 1. **Deletions**: every fiber reconciliation superseded has its nearest
//!    host node removed from the nearest host ancestor's node, then runs the
//!    effect cleanups of its whole subtree.
//! 2. **Mutations**: a pre-order walk of the new tree appends `Placement`
//!    nodes and diffs the props of `Update` nodes.
//! 3. **Effects**: a pre-order walk runs each effect whose deps changed,
//!    running its previous cleanup first.
//! 4. **Promotion**: the new tree becomes current and every fiber it cannot
//!    reach is released.
//!
//! A host failure before anything has been mutated leaves the current tree in
//! place. Once the host has changed there is no going back: the remaining
//! passes still run, a placement that failed is unlinked from the new tree so
//! the next render places it again, and the new tree is promoted. The first
//! error is reported either way.

use alloc::vec::Vec;

use crate::error::{Phase, RenderError};
use crate::fiber::{EffectTag, FiberId};
use crate::hooks::{HookCell, deps_changed};
use crate::host::HostAdapter;
use crate::runtime::{CommitSummary, Runtime};
use crate::trace::Tracer;
#[cfg(feature = "trace-rich")]
use crate::trace::{HostMutationEvent, MutationKind};

/// A commit that hit a host error.
#[derive(Debug)]
pub(crate) struct CommitFailure<E> {
    pub(crate) error: RenderError<E>,
    /// `Some` when the host had already changed and the new tree was
    /// promoted anyway.
    pub(crate) promoted: Option<CommitSummary>,
}

fn host_touched(summary: &CommitSummary) -> bool {
    summary.deletions > 0 || summary.placements > 0 || summary.updates > 0
}

impl<H: HostAdapter> Runtime<H> {
    pub(crate) fn commit(
        &mut self,
        root: FiberId,
        tracer: &mut Tracer<'_>,
    ) -> Result<CommitSummary, CommitFailure<H::Error>> {
        let mut summary = CommitSummary::default();
        let mut first_error = None;

        let deletions = core::mem::take(&mut self.deletions);
        for fiber in deletions {
            if let Err(error) = self.commit_deletion(fiber, &mut summary, tracer) {
                if !host_touched(&summary) {
                    return Err(CommitFailure {
                        error,
                        promoted: None,
                    });
                }
                first_error.get_or_insert(error);
            }
        }

        let mut unplaced = Vec::new();
        if let Err(error) =
            self.commit_mutations(root, &mut summary, &mut unplaced, &mut first_error, tracer)
        {
            return Err(CommitFailure {
                error,
                promoted: None,
            });
        }
        for fiber in unplaced {
            self.discard_placed(fiber);
            self.fibers.detach(fiber);
        }
        self.run_effects(root, &mut summary);

        self.current_root = Some(root);
        self.wip_root = None;
        summary.fibers_freed = self.fibers.retain_tree(root);
        match first_error {
            None => Ok(summary),
            Some(error) => Err(CommitFailure {
                error,
                promoted: Some(summary),
            }),
        }
    }

    fn commit_deletion(
        &mut self,
        fiber: FiberId,
        summary: &mut CommitSummary,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RenderError<H::Error>> {
        let Some(parent) = self
            .fibers
            .host_ancestor(fiber)
            .and_then(|ancestor| self.fibers.host_node(ancestor).cloned())
        else {
            panic!("deleted fiber {fiber:?} has no ancestor with a host node");
        };

        // Components own no node; walk down to the first fiber that does.
        let mut removed = Ok(());
        let mut current = Some(fiber);
        while let Some(f) = current {
            if let Some(node) = self.fibers.host_node(f).cloned() {
                removed = self
                    .host
                    .remove_child(&parent, &node)
                    .map_err(|err| RenderError::host(Phase::Commit, f, err));
                if removed.is_ok() {
                    summary.deletions += 1;
                    #[cfg(feature = "trace-rich")]
                    tracer.host_mutation(&HostMutationEvent {
                        tick_index: self.tick_index,
                        fiber: f.index(),
                        kind: MutationKind::Remove,
                    });
                }
                break;
            }
            current = self.fibers.child(f);
        }
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = tracer;
        }
        if removed.is_err() && !host_touched(summary) {
            return removed;
        }

        // Every component in the removed subtree unmounts, not just the top.
        let subtree: Vec<FiberId> = self.fibers.pre_order(fiber).collect();
        for f in subtree {
            let Some(cells) = self.fibers.hooks_mut(f) else {
                continue;
            };
            for cell in cells.iter_mut() {
                if let Some(cleanup) = cell.take_cleanup() {
                    cleanup.run();
                    summary.cleanups_run += 1;
                }
            }
        }
        removed
    }

    /// Applies placements and updates. Returns the error only while the host
    /// is still untouched; later failures land in `first_error` and failed
    /// placements in `unplaced`.
    fn commit_mutations(
        &mut self,
        root: FiberId,
        summary: &mut CommitSummary,
        unplaced: &mut Vec<FiberId>,
        first_error: &mut Option<RenderError<H::Error>>,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), RenderError<H::Error>> {
        #[cfg(feature = "trace-rich")]
        let tick_index = self.tick_index;
        let Self { fibers, host, .. } = self;
        for fiber in fibers.pre_order(root).skip(1) {
            let Some(node) = fibers.host_node(fiber) else {
                continue;
            };
            match fibers.effect_tag(fiber) {
                Some(EffectTag::Placement) => {
                    let Some(parent) = fibers
                        .host_ancestor(fiber)
                        .and_then(|ancestor| fibers.host_node(ancestor))
                    else {
                        panic!("placed fiber {fiber:?} has no ancestor with a host node");
                    };
                    if let Err(err) = host.append_child(parent, node) {
                        let error = RenderError::host(Phase::Commit, fiber, err);
                        if !host_touched(summary) {
                            return Err(error);
                        }
                        first_error.get_or_insert(error);
                        unplaced.push(fiber);
                        continue;
                    }
                    summary.placements += 1;
                    #[cfg(feature = "trace-rich")]
                    tracer.host_mutation(&HostMutationEvent {
                        tick_index,
                        fiber: fiber.index(),
                        kind: MutationKind::Append,
                    });
                }
                Some(EffectTag::Update) => {
                    let Some(alternate) = fibers.alternate(fiber) else {
                        panic!("updated fiber {fiber:?} has no alternate");
                    };
                    if let Err(err) =
                        host.apply_props_diff(node, fibers.props(alternate), fibers.props(fiber))
                    {
                        let error = RenderError::host(Phase::Commit, fiber, err);
                        if !host_touched(summary) {
                            return Err(error);
                        }
                        first_error.get_or_insert(error);
                        continue;
                    }
                    summary.updates += 1;
                    #[cfg(feature = "trace-rich")]
                    tracer.host_mutation(&HostMutationEvent {
                        tick_index,
                        fiber: fiber.index(),
                        kind: MutationKind::Update,
                    });
                }
                Some(EffectTag::Deletion) | None => {}
            }
        }
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = tracer;
        }
        Ok(())
    }

    /// Runs effects in pre-order. Each effect cell inherits the pending
    /// cleanup of the alternate's cell at the same position, so a skipped
    /// effect keeps the cleanup of the run that produced it.
    fn run_effects(&mut self, root: FiberId, summary: &mut CommitSummary) {
        let order: Vec<FiberId> = self
            .fibers
            .pre_order(root)
            .filter(|fiber| self.fibers.hook_count(*fiber) > 0)
            .collect();

        for fiber in order {
            let alternate = self.fibers.alternate(fiber);
            for index in 0..self.fibers.hook_count(fiber) {
                let should_run = {
                    let Some(HookCell::Effect(cell)) =
                        self.fibers.hooks(fiber).and_then(|cells| cells.get(index))
                    else {
                        continue;
                    };
                    match alternate
                        .and_then(|alt| self.fibers.hooks(alt))
                        .and_then(|cells| cells.get(index))
                    {
                        Some(HookCell::Effect(prev)) => {
                            deps_changed(cell.deps.as_deref(), prev.deps.as_deref())
                        }
                        _ => true,
                    }
                };

                let inherited = alternate
                    .and_then(|alt| self.fibers.hooks_mut(alt))
                    .and_then(|cells| cells.get_mut(index))
                    .and_then(HookCell::take_cleanup);
                let Some(HookCell::Effect(cell)) = self
                    .fibers
                    .hooks_mut(fiber)
                    .and_then(|cells| cells.get_mut(index))
                else {
                    continue;
                };
                cell.cleanup = inherited;
                let body = cell.body.take();
                if !should_run {
                    continue;
                }
                if let Some(cleanup) = cell.cleanup.take() {
                    cleanup.run();
                    summary.cleanups_run += 1;
                }
                if let Some(body) = body {
                    cell.cleanup = body();
                    summary.effects_run += 1;
                }
            }
        }
    }
}
