// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber arena.
//!
//! A *fiber* is the mutable work record behind one element in one render
//! generation. Each fiber has:
//!
//! - An identity ([`FiberId`]): a generational handle that goes stale when
//!   the fiber is freed.
//! - Topology: `parent`, first `child` and next `sibling` links, plus an
//!   `alternate` link to the matching fiber of the other generation.
//! - Element data: the [`ElementType`](crate::element::ElementType) and the
//!   shared [`Props`](crate::props::Props) it was built from.
//! - Render output: the host node it owns (host fibers only), the
//!   [`EffectTag`] decided by reconciliation, and the hook cells recorded by
//!   its last render (component fibers only).
//!
//! Both the committed tree and the work-in-progress tree live in one
//! [`FiberStore`]. After each commit the store frees everything the new
//! current tree cannot reach and clears the survivors' `alternate` links, so
//! at rest the store holds exactly one generation.

mod id;
mod store;
mod traverse;

pub use id::{FiberId, INVALID};
pub use store::FiberStore;
pub use traverse::{Children, PreOrder};

/// What the commit phase must do with a fiber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// New fiber: create and append its host node.
    Placement,
    /// Same type as its alternate: patch the reused host node's props.
    Update,
    /// Old fiber with no counterpart: remove its host subtree.
    Deletion,
}
