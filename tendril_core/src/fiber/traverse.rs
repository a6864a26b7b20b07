// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{FiberId, INVALID};
use super::store::FiberStore;

/// An iterator over the direct children of a fiber.
///
/// Created by [`FiberStore::children`].
#[derive(Debug)]
pub struct Children<'a, N> {
    store: &'a FiberStore<N>,
    current: u32,
}

impl<'a, N> Children<'a, N> {
    pub(crate) fn new(store: &'a FiberStore<N>, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl<N> Iterator for Children<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.store.handle(self.current)?;
        self.current = self.store.sibling[id.idx as usize];
        Some(id)
    }
}

/// A pre-order walk of a subtree: each fiber, then its children, then its
/// next sibling. Never leaves the subtree rooted at the starting fiber.
///
/// Created by [`FiberStore::pre_order`].
#[derive(Debug)]
pub struct PreOrder<'a, N> {
    store: &'a FiberStore<N>,
    root: u32,
    next: u32,
}

impl<'a, N> PreOrder<'a, N> {
    pub(crate) fn new(store: &'a FiberStore<N>, root: u32) -> Self {
        Self {
            store,
            root,
            next: root,
        }
    }
}

impl<N> Iterator for PreOrder<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.store.handle(self.next)?;
        self.next = successor(self.store, id.idx, self.root);
        Some(id)
    }
}

/// Pre-order successor of `idx`, bounded by `root`.
fn successor<N>(store: &FiberStore<N>, idx: u32, root: u32) -> u32 {
    let child = store.child[idx as usize];
    if child != INVALID {
        return child;
    }
    let mut current = idx;
    loop {
        if current == root {
            return INVALID;
        }
        let sibling = store.sibling[current as usize];
        if sibling != INVALID {
            return sibling;
        }
        current = store.parent[current as usize];
        if current == INVALID {
            return INVALID;
        }
    }
}

impl<N> FiberStore<N> {
    /// The fiber the work loop visits after `id`: its first child, else its
    /// own or the nearest ancestor's next sibling, else `None`.
    #[must_use]
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.handle(successor(self, id.idx, INVALID))
    }
}

// ----- Tests -----

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    use crate::element::{ElementType, HostTag};
    use crate::fiber::{FiberId, FiberStore};

    /// root ── a ── a1
    ///       │    └ a2
    ///       └ b ── b1
    fn sample() -> (FiberStore<()>, [FiberId; 6]) {
        fn make(store: &mut FiberStore<()>) -> FiberId {
            store.create_fiber(ElementType::Host(HostTag::from("n")), Rc::default())
        }
        let mut store = FiberStore::new();
        let ids = [
            make(&mut store),
            make(&mut store),
            make(&mut store),
            make(&mut store),
            make(&mut store),
            make(&mut store),
        ];
        let [root, a, a1, a2, b, b1] = ids;
        let edges: [(FiberId, &[FiberId]); 3] = [(root, &[a, b]), (a, &[a1, a2]), (b, &[b1])];
        for (parent, kids) in edges {
            store.set_child(parent, Some(kids[0]));
            for pair in kids.windows(2) {
                store.set_sibling(pair[0], Some(pair[1]));
            }
            for kid in kids {
                store.set_parent(*kid, Some(parent));
            }
        }
        (store, ids)
    }

    #[test]
    fn pre_order_visits_child_before_sibling() {
        let (store, [root, a, a1, a2, b, b1]) = sample();
        let order: Vec<FiberId> = store.pre_order(root).collect();
        assert_eq!(order, [root, a, a1, a2, b, b1]);
    }

    #[test]
    fn pre_order_stays_inside_subtree() {
        let (store, [_, a, a1, a2, ..]) = sample();
        let order: Vec<FiberId> = store.pre_order(a).collect();
        assert_eq!(order, [a, a1, a2]);
    }

    #[test]
    fn next_unit_climbs_to_uncle() {
        let (store, [root, a, a1, a2, b, b1]) = sample();
        assert_eq!(store.next_unit(root), Some(a));
        assert_eq!(store.next_unit(a), Some(a1));
        assert_eq!(store.next_unit(a1), Some(a2));
        assert_eq!(store.next_unit(a2), Some(b));
        assert_eq!(store.next_unit(b), Some(b1));
        assert_eq!(store.next_unit(b1), None);
    }

    #[test]
    fn children_in_order() {
        let (store, [root, a, _, _, b, _]) = sample();
        let kids: Vec<FiberId> = store.children(root).collect();
        assert_eq!(kids, [a, b]);
    }
}
