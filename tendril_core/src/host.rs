// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host adapter contract.
//!
//! Tendril never touches a concrete UI toolkit. Platform integration is split
//! the same way for every host:
//!
//! - **Driver**: delivers work slices from a platform mechanism (e.g.
//!   `requestAnimationFrame` plus a timer fallback) and hands each one a
//!   [`Deadline`](crate::timing::Deadline). This is host-specific and not
//!   abstracted by a trait because setup and lifecycle differ fundamentally.
//!
//! - **Clock**: a [`Clock`](crate::timing::Clock) reading the platform's
//!   monotonic time, used to build
//!   [`SliceDeadline`](crate::timing::SliceDeadline)s.
//!
//! - **Adapter**: implements [`HostAdapter`] to create, patch, attach and
//!   detach native nodes.
//!
//! `tendril_core` ships one adapter, the in-memory
//! [`HeadlessHost`](crate::headless::HeadlessHost). The browser adapter lives
//! in `tendril_backend_web`.

use crate::element::HostTag;
use crate::props::Props;

/// Creates and mutates the native node tree on behalf of the commit engine.
///
/// Node creation happens during the render phase; every other call happens
/// during commit, in tree order. Errors are returned to the caller of
/// [`Runtime::tick`](crate::runtime::Runtime::tick) wrapped in a
/// [`RenderError`](crate::error::RenderError).
///
/// A render can be thrown away after it created nodes (a state update
/// restarts it, a new tree is rendered, or a host call fails). Nodes that
/// were never attached are then passed to
/// [`discard_node`](Self::discard_node).
///
/// # Driver pseudocode
///
/// ```rust,ignore
/// fn on_animation_frame(now: HostTime) {
///     let deadline = SliceDeadline::new(&clock, now, config.slice_budget);
///     match runtime.tick(&deadline) {
///         Ok(TickOutcome::Committed { summary, .. }) => log(summary),
///         Ok(_) => {}
///         Err(err) => report(err),
///     }
///     schedule_next_slice();
/// }
/// ```
pub trait HostAdapter {
    /// Handle to a native node. Cloning must yield a handle to the same node.
    type Node: Clone;

    /// Failure reported by the native toolkit.
    type Error;

    /// Creates a detached node for `tag` and applies every prop in `props`
    /// to it. [`HostTag::TEXT`] must produce a text node whose content is
    /// the `nodeValue` prop.
    fn create_node(&mut self, tag: &HostTag, props: &Props) -> Result<Self::Node, Self::Error>;

    /// Patches `node` from `prev` to `next`. Implementations usually walk
    /// [`props::diff`](crate::props::diff).
    fn apply_props_diff(
        &mut self,
        node: &Self::Node,
        prev: &Props,
        next: &Props,
    ) -> Result<(), Self::Error>;

    /// Appends `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

    /// Detaches `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

    /// Releases a node created by [`create_node`](Self::create_node) that will
    /// never be attached. It may already hold discarded children, which are
    /// also passed here. The default does nothing.
    fn discard_node(&mut self, node: &Self::Node) {
        _ = node;
    }
}
