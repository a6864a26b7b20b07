// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional child reconciliation.
//!
//! The new children of a work-in-progress fiber are paired with the
//! alternate's old children by index. There are no keys: an element that
//! moved position is seen as a change at every index it passed through.
//!
//! For each index:
//!
//! | new element | old fiber | same type | result |
//! |-------------|-----------|-----------|--------|
//! | yes | yes | yes | new fiber tagged `Update`, reusing the old host node |
//! | yes | yes | no  | new fiber tagged `Placement`; old fiber tagged `Deletion` |
//! | yes | no  | -   | new fiber tagged `Placement` |
//! | no  | yes | -   | old fiber tagged `Deletion` |

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::element::Element;
use crate::fiber::{EffectTag, FiberId, FiberStore};

/// Rebuilds `wip`'s child list from `elements`, pushing superseded old fibers
/// onto `deletions`.
pub(crate) fn reconcile_children<N: Clone>(
    store: &mut FiberStore<N>,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: &[Element],
) {
    let mut old = store.alternate(wip).and_then(|alt| store.child(alt));
    let mut previous: Option<FiberId> = None;
    store.set_child(wip, None);

    let mut index = 0;
    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let same_type = match (element, old) {
            (Some(element), Some(old)) => element.ty() == store.element_type(old),
            _ => false,
        };

        let fiber = match element {
            Some(element) => {
                let fiber =
                    store.create_fiber(element.ty().clone(), Rc::clone(element.shared_props()));
                match old {
                    Some(old) if same_type => {
                        let node = store.host_node(old).cloned();
                        store.set_host_node(fiber, node);
                        store.set_alternate(fiber, Some(old));
                        store.set_effect_tag(fiber, Some(EffectTag::Update));
                    }
                    _ => store.set_effect_tag(fiber, Some(EffectTag::Placement)),
                }
                Some(fiber)
            }
            None => None,
        };

        if let Some(stale) = old {
            if !same_type {
                store.set_effect_tag(stale, Some(EffectTag::Deletion));
                deletions.push(stale);
            }
            old = store.sibling(stale);
        }

        if let Some(fiber) = fiber {
            store.set_parent(fiber, Some(wip));
            match previous {
                None => store.set_child(wip, Some(fiber)),
                Some(prev) => store.set_sibling(prev, Some(fiber)),
            }
            previous = Some(fiber);
        }
        index += 1;
    }
}

// ----- Tests -----

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementType, HostTag, h, text};
    use crate::props::{NODE_VALUE, Value};

    struct Harness {
        store: FiberStore<u32>,
        deletions: Vec<FiberId>,
        next_node: u32,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                store: FiberStore::new(),
                deletions: Vec::new(),
                next_node: 0,
            }
        }

        /// Reconciles a fresh root against `previous` and gives every placed
        /// fiber a fake host node, the way the work loop would.
        fn round(&mut self, previous: Option<FiberId>, elements: &[Element]) -> FiberId {
            let root = self
                .store
                .create_fiber(ElementType::Host(HostTag::ROOT), Rc::default());
            self.store.set_alternate(root, previous);
            self.deletions.clear();
            reconcile_children(&mut self.store, &mut self.deletions, root, elements);
            let kids: Vec<FiberId> = self.store.children(root).collect();
            for kid in kids {
                if self.store.host_node(kid).is_none() {
                    self.next_node += 1;
                    self.store.set_host_node(kid, Some(self.next_node));
                }
            }
            root
        }

        fn tags(&self, root: FiberId) -> Vec<Option<EffectTag>> {
            self.store
                .children(root)
                .map(|f| self.store.effect_tag(f))
                .collect()
        }
    }

    fn item(label: &str) -> Element {
        h("li").child(label).build()
    }

    #[test]
    fn first_render_places_everything() {
        let mut t = Harness::new();
        let root = t.round(None, &[item("a"), item("b")]);
        assert_eq!(
            t.tags(root),
            [Some(EffectTag::Placement), Some(EffectTag::Placement)]
        );
        assert!(t.deletions.is_empty());
    }

    #[test]
    fn same_types_update_and_reuse_nodes() {
        let mut t = Harness::new();
        let first = t.round(None, &[item("a"), item("b")]);
        let old_nodes: Vec<u32> = t
            .store
            .children(first)
            .filter_map(|f| t.store.host_node(f).copied())
            .collect();

        let second = t.round(Some(first), &[item("a"), item("b")]);
        assert_eq!(t.tags(second), [Some(EffectTag::Update), Some(EffectTag::Update)]);
        let new_nodes: Vec<u32> = t
            .store
            .children(second)
            .filter_map(|f| t.store.host_node(f).copied())
            .collect();
        assert_eq!(old_nodes, new_nodes);
        assert!(t.deletions.is_empty());
    }

    /// Removing the middle of three same-type siblings is seen positionally:
    /// index 1 now describes "c" and updates the old "b" fiber, and the old
    /// third fiber is deleted. There is no key to match "c" with "c".
    #[test]
    fn removal_from_middle_is_positional_for_same_types() {
        let mut t = Harness::new();
        let first = t.round(None, &[item("a"), item("b"), item("c")]);
        let old: Vec<FiberId> = t.store.children(first).collect();

        let second = t.round(Some(first), &[item("a"), item("c")]);
        assert_eq!(t.tags(second), [Some(EffectTag::Update), Some(EffectTag::Update)]);
        assert_eq!(t.deletions, [old[2]]);
        assert_eq!(t.store.effect_tag(old[2]), Some(EffectTag::Deletion));

        let kids: Vec<FiberId> = t.store.children(second).collect();
        assert_eq!(t.store.alternate(kids[1]), Some(old[1]));
        let label = t.store.props(kids[1]).children()[0].props().get(NODE_VALUE);
        assert_eq!(label, Some(&Value::from("c")));
    }

    /// With differing types the same removal replaces instead of updating.
    #[test]
    fn removal_from_middle_with_differing_types() {
        let mut t = Harness::new();
        let first = t.round(
            None,
            &[h("li").build(), h("p").build(), h("span").build()],
        );
        let old: Vec<FiberId> = t.store.children(first).collect();

        let second = t.round(Some(first), &[h("li").build(), h("span").build()]);
        assert_eq!(t.tags(second), [Some(EffectTag::Update), Some(EffectTag::Placement)]);
        assert_eq!(t.deletions, [old[1], old[2]]);
    }

    #[test]
    fn shrinking_to_nothing_deletes_all() {
        let mut t = Harness::new();
        let first = t.round(None, &[text("x"), text("y")]);
        let old: Vec<FiberId> = t.store.children(first).collect();
        let second = t.round(Some(first), &[]);
        assert_eq!(t.store.child(second), None);
        assert_eq!(t.deletions, old);
    }

    #[test]
    fn children_are_linked_to_parent() {
        let mut t = Harness::new();
        let root = t.round(None, &[item("a"), item("b"), item("c")]);
        for kid in t.store.children(root) {
            assert_eq!(t.store.parent(kid), Some(root));
        }
        assert_eq!(t.store.children(root).count(), 3);
    }
}
