// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays fiber storage with allocation, topology, and sweep.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::element::ElementType;
use crate::hooks::HookCell;
use crate::props::Props;

use super::EffectTag;
use super::id::{FiberId, INVALID};
use super::traverse::{Children, PreOrder};

/// Struct-of-arrays storage for every fiber of both render generations.
///
/// Fibers are addressed by [`FiberId`] handles. Freed slots are recycled via a
/// free list and generation counters reject stale handles. `N` is the host
/// adapter's node type.
pub struct FiberStore<N> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) child: Vec<u32>,
    pub(crate) sibling: Vec<u32>,
    pub(crate) alternate: Vec<u32>,

    // -- Element data --
    pub(crate) ty: Vec<Option<ElementType>>,
    pub(crate) props: Vec<Rc<Props>>,

    // -- Render output --
    pub(crate) host_node: Vec<Option<N>>,
    pub(crate) effect_tag: Vec<Option<EffectTag>>,
    pub(crate) hooks: Vec<Option<Vec<HookCell>>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl<N> Default for FiberStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> fmt::Debug for FiberStore<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiberStore")
            .field("len", &self.len)
            .field("live", &self.live_count())
            .finish_non_exhaustive()
    }
}

impl<N> FiberStore<N> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            child: Vec::new(),
            sibling: Vec::new(),
            alternate: Vec::new(),
            ty: Vec::new(),
            props: Vec::new(),
            host_node: Vec::new(),
            effect_tag: Vec::new(),
            hooks: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    // -- Allocation API --

    /// Allocates a detached fiber for an element type and its props.
    ///
    /// The fiber starts with no links, no host node, no effect tag and no
    /// hook list.
    pub(crate) fn create_fiber(&mut self, ty: ElementType, props: Rc<Props>) -> FiberId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.child[i] = INVALID;
            self.sibling[i] = INVALID;
            self.alternate[i] = INVALID;
            self.ty[i] = Some(ty);
            self.props[i] = props;
            self.host_node[i] = None;
            self.effect_tag[i] = None;
            self.hooks[i] = None;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.child.push(INVALID);
            self.sibling.push(INVALID);
            self.alternate.push(INVALID);
            self.ty.push(Some(ty));
            self.props.push(props);
            self.host_node.push(None);
            self.effect_tag.push(None);
            self.hooks.push(None);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees a fiber slot. Its host node handle and hook cells are dropped;
    /// nothing is run.
    fn free_slot(&mut self, idx: u32) {
        let i = idx as usize;
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.alive[i] = false;
        self.ty[i] = None;
        self.props[i] = Rc::default();
        self.host_node[i] = None;
        self.hooks[i] = None;
        self.effect_tag[i] = None;
        self.free_list.push(idx);
    }

    /// Returns whether the handle refers to a live fiber.
    #[must_use]
    pub fn is_alive(&self, id: FiberId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Number of live fibers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    /// Frees every fiber not reachable from `root` through child/sibling
    /// links and clears the `alternate` link of every fiber that survives.
    ///
    /// Returns the number of fibers freed.
    pub(crate) fn retain_tree(&mut self, root: FiberId) -> u32 {
        self.validate(root);
        let mut reachable = vec![false; self.len as usize];
        for id in self.pre_order(root) {
            reachable[id.idx as usize] = true;
        }

        let mut freed = 0;
        for idx in 0..self.len {
            let i = idx as usize;
            if !self.alive[i] {
                continue;
            }
            if reachable[i] {
                self.alternate[i] = INVALID;
            } else {
                self.free_slot(idx);
                freed += 1;
            }
        }
        freed
    }

    // -- Topology API --

    /// The fiber's parent, if any.
    #[must_use]
    pub fn parent(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.handle(self.parent[id.idx as usize])
    }

    /// The fiber's first child, if any.
    #[must_use]
    pub fn child(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.handle(self.child[id.idx as usize])
    }

    /// The fiber's next sibling, if any.
    #[must_use]
    pub fn sibling(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.handle(self.sibling[id.idx as usize])
    }

    /// The matching fiber of the other generation, if any.
    #[must_use]
    pub fn alternate(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.handle(self.alternate[id.idx as usize])
    }

    /// Iterates the direct children in order.
    #[must_use]
    pub fn children(&self, id: FiberId) -> Children<'_, N> {
        self.validate(id);
        Children::new(self, self.child[id.idx as usize])
    }

    /// Iterates `root` and its descendants in pre-order (child before
    /// sibling).
    #[must_use]
    pub fn pre_order(&self, root: FiberId) -> PreOrder<'_, N> {
        self.validate(root);
        PreOrder::new(self, root.idx)
    }

    /// The nearest proper ancestor that owns a host node.
    #[must_use]
    pub fn host_ancestor(&self, id: FiberId) -> Option<FiberId> {
        let mut current = self.parent(id);
        while let Some(fiber) = current {
            if self.host_node[fiber.idx as usize].is_some() {
                return Some(fiber);
            }
            current = self.parent(fiber);
        }
        None
    }

    pub(crate) fn set_parent(&mut self, id: FiberId, parent: Option<FiberId>) {
        self.validate(id);
        self.parent[id.idx as usize] = self.raw(parent);
    }

    pub(crate) fn set_child(&mut self, id: FiberId, child: Option<FiberId>) {
        self.validate(id);
        self.child[id.idx as usize] = self.raw(child);
    }

    pub(crate) fn set_sibling(&mut self, id: FiberId, sibling: Option<FiberId>) {
        self.validate(id);
        self.sibling[id.idx as usize] = self.raw(sibling);
    }

    pub(crate) fn set_alternate(&mut self, id: FiberId, alternate: Option<FiberId>) {
        self.validate(id);
        self.alternate[id.idx as usize] = self.raw(alternate);
    }

    /// Unlinks `id` from its parent's child list. Its own subtree stays
    /// attached to it.
    pub(crate) fn detach(&mut self, id: FiberId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let next = self.sibling(id);
        if self.child(parent) == Some(id) {
            self.set_child(parent, next);
        } else {
            let mut current = self.child(parent);
            while let Some(fiber) = current {
                if self.sibling(fiber) == Some(id) {
                    self.set_sibling(fiber, next);
                    break;
                }
                current = self.sibling(fiber);
            }
        }
        self.set_parent(id, None);
        self.set_sibling(id, None);
    }

    // -- Element data --

    /// The element type the fiber was built from.
    #[must_use]
    pub fn element_type(&self, id: FiberId) -> &ElementType {
        self.validate(id);
        match &self.ty[id.idx as usize] {
            Some(ty) => ty,
            None => unreachable!("live fiber without an element type"),
        }
    }

    /// The props the fiber was built from.
    #[must_use]
    pub fn props(&self, id: FiberId) -> &Props {
        self.validate(id);
        &self.props[id.idx as usize]
    }

    pub(crate) fn shared_props(&self, id: FiberId) -> &Rc<Props> {
        self.validate(id);
        &self.props[id.idx as usize]
    }

    // -- Render output --

    /// The host node owned by the fiber, if any.
    #[must_use]
    pub fn host_node(&self, id: FiberId) -> Option<&N> {
        self.validate(id);
        self.host_node[id.idx as usize].as_ref()
    }

    pub(crate) fn set_host_node(&mut self, id: FiberId, node: Option<N>) {
        self.validate(id);
        self.host_node[id.idx as usize] = node;
    }

    /// The effect tag assigned by the last reconciliation that touched the
    /// fiber.
    #[must_use]
    pub fn effect_tag(&self, id: FiberId) -> Option<EffectTag> {
        self.validate(id);
        self.effect_tag[id.idx as usize]
    }

    pub(crate) fn set_effect_tag(&mut self, id: FiberId, tag: Option<EffectTag>) {
        self.validate(id);
        self.effect_tag[id.idx as usize] = tag;
    }

    /// Number of hook cells recorded by the fiber's last render (zero for
    /// host fibers).
    #[must_use]
    pub fn hook_count(&self, id: FiberId) -> usize {
        self.validate(id);
        self.hooks[id.idx as usize].as_ref().map_or(0, Vec::len)
    }

    pub(crate) fn hooks(&self, id: FiberId) -> Option<&[HookCell]> {
        self.validate(id);
        self.hooks[id.idx as usize].as_deref()
    }

    pub(crate) fn hooks_mut(&mut self, id: FiberId) -> Option<&mut [HookCell]> {
        self.validate(id);
        self.hooks[id.idx as usize].as_deref_mut()
    }

    pub(crate) fn set_hooks(&mut self, id: FiberId, cells: Vec<HookCell>) {
        self.validate(id);
        self.hooks[id.idx as usize] = Some(cells);
    }

    // -- Internal helpers --

    pub(crate) fn handle(&self, idx: u32) -> Option<FiberId> {
        (idx != INVALID).then(|| FiberId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    fn raw(&self, id: Option<FiberId>) -> u32 {
        match id {
            Some(id) => {
                self.validate(id);
                id.idx
            }
            None => INVALID,
        }
    }

    /// Panics if the handle is stale.
    pub(super) fn validate(&self, id: FiberId) {
        assert!(
            self.is_alive(id),
            "stale FiberId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}

// ----- Tests -----
