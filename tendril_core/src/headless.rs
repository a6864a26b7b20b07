// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host adapter.
//!
//! [`HeadlessHost`] keeps a node tree in plain vectors and records every
//! mutation the commit engine asks for in a [`Mutation`] log. It is what the
//! core's own tests render into, and it is useful anywhere a real toolkit is
//! unavailable (trace tooling, server-side snapshots).
//!
//! Failures can be injected per operation with [`HeadlessHost::fail_next`] to
//! exercise the runtime's error paths.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{self, Write as _};

use crate::element::HostTag;
use crate::host::HostAdapter;
use crate::props::{self, AttrMap, Event, EventHandler, NODE_VALUE, PropChange, Props, Value};

/// Handle to a node owned by a [`HeadlessHost`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessNode(u32);

impl HeadlessNode {
    /// Slot index of the node.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for HeadlessNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One recorded host mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// A node was created.
    Create {
        /// The new node.
        node: HeadlessNode,
        /// Its tag.
        tag: HostTag,
    },
    /// An attribute was set.
    SetAttribute {
        /// Target node.
        node: HeadlessNode,
        /// Attribute key.
        name: Rc<str>,
        /// New value.
        value: Value,
    },
    /// An attribute was removed.
    RemoveAttribute {
        /// Target node.
        node: HeadlessNode,
        /// Attribute key.
        name: Rc<str>,
    },
    /// A text node's content changed.
    SetText {
        /// Target text node.
        node: HeadlessNode,
        /// New content.
        text: String,
    },
    /// A listener was attached.
    AddListener {
        /// Target node.
        node: HeadlessNode,
        /// Event name.
        event: String,
    },
    /// A listener was detached.
    RemoveListener {
        /// Target node.
        node: HeadlessNode,
        /// Event name.
        event: String,
    },
    /// `child` became the last child of `parent`.
    Append {
        /// New parent.
        parent: HeadlessNode,
        /// Appended node.
        child: HeadlessNode,
    },
    /// `child` was detached from `parent`.
    Remove {
        /// Old parent.
        parent: HeadlessNode,
        /// Removed node.
        child: HeadlessNode,
    },
}

/// Adapter operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostOp {
    /// `create_node`.
    Create,
    /// `apply_props_diff`.
    Update,
    /// `append_child`.
    Append,
    /// `remove_child`.
    Remove,
}

/// Errors reported by [`HeadlessHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HeadlessError {
    /// The handle does not belong to this host.
    #[error("unknown node {0:?}")]
    UnknownNode(HeadlessNode),
    /// `remove_child` was asked to detach a node from a parent it is not
    /// attached to.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Claimed parent.
        parent: HeadlessNode,
        /// Claimed child.
        child: HeadlessNode,
    },
    /// A failure armed with [`HeadlessHost::fail_next`].
    #[error("injected {0:?} failure")]
    Injected(HostOp),
}

struct NodeData {
    tag: HostTag,
    attrs: AttrMap,
    listeners: Vec<(String, EventHandler)>,
    parent: Option<HeadlessNode>,
    children: Vec<HeadlessNode>,
}

/// An in-memory node tree with a mutation log.
#[derive(Default)]
pub struct HeadlessHost {
    nodes: Vec<NodeData>,
    log: Vec<Mutation>,
    armed: Vec<HostOp>,
    discarded: Vec<HeadlessNode>,
}

impl fmt::Debug for HeadlessHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessHost")
            .field("nodes", &self.nodes.len())
            .field("log", &self.log.len())
            .finish_non_exhaustive()
    }
}

impl HeadlessHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached container node to render into. Not logged.
    pub fn create_container(&mut self) -> HeadlessNode {
        self.alloc(HostTag::new("container"))
    }

    /// Makes the next call of `op` fail with [`HeadlessError::Injected`].
    pub fn fail_next(&mut self, op: HostOp) {
        self.armed.push(op);
    }

    // -- Inspection --

    /// The mutation log since the last [`take_log`](Self::take_log).
    #[must_use]
    pub fn log(&self) -> &[Mutation] {
        &self.log
    }

    /// Drains the mutation log.
    pub fn take_log(&mut self) -> Vec<Mutation> {
        core::mem::take(&mut self.log)
    }

    /// Nodes handed back through [`HostAdapter::discard_node`], oldest first.
    #[must_use]
    pub fn discarded(&self) -> &[HeadlessNode] {
        &self.discarded
    }

    /// Number of nodes ever created, containers included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The node's tag.
    #[must_use]
    pub fn tag(&self, node: HeadlessNode) -> Option<&HostTag> {
        self.node(node).map(|data| &data.tag)
    }

    /// The node's children in order.
    #[must_use]
    pub fn children(&self, node: HeadlessNode) -> &[HeadlessNode] {
        self.node(node).map_or(&[][..], |data| data.children.as_slice())
    }

    /// The node's parent, if attached.
    #[must_use]
    pub fn parent(&self, node: HeadlessNode) -> Option<HeadlessNode> {
        self.node(node).and_then(|data| data.parent)
    }

    /// An attribute of the node.
    #[must_use]
    pub fn attribute(&self, node: HeadlessNode, name: &str) -> Option<&Value> {
        self.node(node).and_then(|data| data.attrs.get(name))
    }

    /// Number of listeners attached for `event`.
    #[must_use]
    pub fn listener_count(&self, node: HeadlessNode, event: &str) -> usize {
        self.node(node).map_or(0, |data| {
            data.listeners.iter().filter(|(name, _)| name == event).count()
        })
    }

    /// Concatenated content of every text node under `node`.
    #[must_use]
    pub fn text(&self, node: HeadlessNode) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// First node under `root` (pre-order, `root` excluded) with tag `tag`.
    #[must_use]
    pub fn find_by_tag(&self, root: HeadlessNode, tag: &str) -> Option<HeadlessNode> {
        for &child in self.children(root) {
            if self.tag(child).is_some_and(|t| t.as_str() == tag) {
                return Some(child);
            }
            if let Some(found) = self.find_by_tag(child, tag) {
                return Some(found);
            }
        }
        None
    }

    /// Serializes the children of `node` as markup. Attributes are written in
    /// insertion order; listeners are omitted.
    #[must_use]
    pub fn to_markup(&self, node: HeadlessNode) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_markup(child, &mut out);
        }
        out
    }

    /// Calls every listener for `event.name` on `node` and returns how many
    /// ran. Events do not bubble.
    pub fn dispatch(&self, node: HeadlessNode, event: &Event) -> usize {
        let Some(data) = self.node(node) else {
            return 0;
        };
        let handlers: Vec<EventHandler> = data
            .listeners
            .iter()
            .filter(|(name, _)| **name == *event.name)
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in &handlers {
            handler.call(event);
        }
        handlers.len()
    }

    // -- Internals --

    #[expect(
        clippy::cast_possible_truncation,
        reason = "a headless tree never holds 2^32 nodes"
    )]
    fn alloc(&mut self, tag: HostTag) -> HeadlessNode {
        let node = HeadlessNode(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            tag,
            attrs: AttrMap::default(),
            listeners: Vec::new(),
            parent: None,
            children: Vec::new(),
        });
        node
    }

    fn node(&self, node: HeadlessNode) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn node_mut(&mut self, node: HeadlessNode) -> Result<&mut NodeData, HeadlessError> {
        self.nodes
            .get_mut(node.0 as usize)
            .ok_or(HeadlessError::UnknownNode(node))
    }

    fn check_armed(&mut self, op: HostOp) -> Result<(), HeadlessError> {
        match self.armed.iter().position(|armed| *armed == op) {
            Some(index) => {
                self.armed.remove(index);
                Err(HeadlessError::Injected(op))
            }
            None => Ok(()),
        }
    }

    fn apply(
        &mut self,
        node: HeadlessNode,
        changes: Vec<PropChange<'_>>,
    ) -> Result<(), HeadlessError> {
        let is_text = self.node_mut(node)?.tag.is_text();
        for change in changes {
            let data = self.node_mut(node)?;
            let entry = match change {
                PropChange::RemoveListener { event, handler } => {
                    data.listeners
                        .retain(|(name, h)| !(*name == event && h.ptr_eq(handler)));
                    Mutation::RemoveListener { node, event }
                }
                PropChange::RemoveAttribute { name } => {
                    data.attrs.shift_remove(name);
                    Mutation::RemoveAttribute {
                        node,
                        name: name.into(),
                    }
                }
                PropChange::SetAttribute { name, value } => {
                    data.attrs.insert(name.into(), value.clone());
                    if is_text && name == NODE_VALUE {
                        Mutation::SetText {
                            node,
                            text: format!("{value}"),
                        }
                    } else {
                        Mutation::SetAttribute {
                            node,
                            name: name.into(),
                            value: value.clone(),
                        }
                    }
                }
                PropChange::AddListener { event, handler } => {
                    data.listeners.push((event.clone(), handler.clone()));
                    Mutation::AddListener { node, event }
                }
            };
            self.log.push(entry);
        }
        Ok(())
    }

    fn collect_text(&self, node: HeadlessNode, out: &mut String) {
        let Some(data) = self.node(node) else {
            return;
        };
        if data.tag.is_text() {
            if let Some(value) = data.attrs.get(NODE_VALUE) {
                let _ = write!(out, "{value}");
            }
            return;
        }
        for &child in &data.children {
            self.collect_text(child, out);
        }
    }

    fn write_markup(&self, node: HeadlessNode, out: &mut String) {
        let Some(data) = self.node(node) else {
            return;
        };
        if data.tag.is_text() {
            if let Some(value) = data.attrs.get(NODE_VALUE) {
                let _ = write!(out, "{value}");
            }
            return;
        }
        let _ = write!(out, "<{}", data.tag);
        for (name, value) in &data.attrs {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        out.push('>');
        for &child in &data.children {
            self.write_markup(child, out);
        }
        let _ = write!(out, "</{}>", data.tag);
    }
}

impl HostAdapter for HeadlessHost {
    type Node = HeadlessNode;
    type Error = HeadlessError;

    fn create_node(&mut self, tag: &HostTag, props: &Props) -> Result<HeadlessNode, HeadlessError> {
        self.check_armed(HostOp::Create)?;
        let node = self.alloc(tag.clone());
        self.log.push(Mutation::Create {
            node,
            tag: tag.clone(),
        });
        let empty = Props::new();
        self.apply(node, props::diff(&empty, props))?;
        Ok(node)
    }

    fn apply_props_diff(
        &mut self,
        node: &HeadlessNode,
        prev: &Props,
        next: &Props,
    ) -> Result<(), HeadlessError> {
        self.check_armed(HostOp::Update)?;
        self.apply(*node, props::diff(prev, next))
    }

    fn append_child(
        &mut self,
        parent: &HeadlessNode,
        child: &HeadlessNode,
    ) -> Result<(), HeadlessError> {
        self.check_armed(HostOp::Append)?;
        self.node_mut(*parent)?;
        if let Some(old) = self.node_mut(*child)?.parent.take() {
            self.node_mut(old)?.children.retain(|c| c != child);
        }
        self.node_mut(*parent)?.children.push(*child);
        self.node_mut(*child)?.parent = Some(*parent);
        self.log.push(Mutation::Append {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn remove_child(
        &mut self,
        parent: &HeadlessNode,
        child: &HeadlessNode,
    ) -> Result<(), HeadlessError> {
        self.check_armed(HostOp::Remove)?;
        let siblings = &mut self.node_mut(*parent)?.children;
        let Some(index) = siblings.iter().position(|c| c == child) else {
            return Err(HeadlessError::NotAChild {
                parent: *parent,
                child: *child,
            });
        };
        siblings.remove(index);
        self.node_mut(*child)?.parent = None;
        self.log.push(Mutation::Remove {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn discard_node(&mut self, node: &HeadlessNode) {
        self.discarded.push(*node);
        let mut stack = vec![*node];
        while let Some(next) = stack.pop() {
            if let Ok(data) = self.node_mut(next) {
                data.listeners.clear();
                stack.extend(data.children.iter().copied());
            }
        }
    }
}

// ----- Tests -----

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;
    use crate::deps;
    use crate::element::{Component, Element, component, h, text};
    use crate::error::Phase;
    use crate::hooks::Cleanup;
    use crate::runtime::{Runtime, RuntimeConfig, TickOutcome, WorkPhase};
    use crate::timing::UnitBudget;

    type Rt = Runtime<HeadlessHost>;

    fn mount(element: Element) -> (Rt, HeadlessNode) {
        let mut rt = Runtime::new(HeadlessHost::new(), RuntimeConfig::headless());
        let container = rt.host_mut().create_container();
        rt.render(element, container);
        rt.flush().unwrap();
        (rt, container)
    }

    fn count(log: &[Mutation], pred: impl Fn(&Mutation) -> bool) -> usize {
        log.iter().filter(|m| pred(m)).count()
    }

    fn is_structural(m: &Mutation) -> bool {
        matches!(
            m,
            Mutation::Create { .. } | Mutation::Append { .. } | Mutation::Remove { .. }
        )
    }

    fn counter() -> Component {
        Component::new("Counter", |hooks, _| {
            let (count, set_count) = hooks.use_state(0_i64);
            h("button")
                .on("click", move |_| set_count.update(|c| c + 1))
                .child(text(format!("Count: {count}")))
                .build()
        })
    }

    fn click(rt: &Rt, node: HeadlessNode) -> usize {
        rt.host().dispatch(node, &Event::new("click", Value::Null))
    }

    // -- Host adapter --

    #[test]
    fn create_node_applies_initial_props() {
        let mut host = HeadlessHost::new();
        let mut props = Props::new();
        props.insert("id", "main");
        props.insert("onClick", EventHandler::new(|_| {}));
        let node = host.create_node(&HostTag::new("div"), &props).unwrap();
        assert_eq!(host.attribute(node, "id"), Some(&Value::from("main")));
        assert_eq!(host.listener_count(node, "click"), 1);
        assert_eq!(
            host.take_log(),
            vec![
                Mutation::Create {
                    node,
                    tag: HostTag::new("div")
                },
                Mutation::SetAttribute {
                    node,
                    name: "id".into(),
                    value: Value::from("main")
                },
                Mutation::AddListener {
                    node,
                    event: "click".to_string()
                },
            ]
        );
    }

    #[test]
    fn remove_child_rejects_strangers() {
        let mut host = HeadlessHost::new();
        let a = host.create_container();
        let b = host.create_container();
        assert_eq!(
            host.remove_child(&a, &b),
            Err(HeadlessError::NotAChild { parent: a, child: b })
        );
    }

    #[test]
    fn append_moves_attached_nodes() {
        let mut host = HeadlessHost::new();
        let a = host.create_container();
        let b = host.create_container();
        let c = host.create_container();
        host.append_child(&a, &c).unwrap();
        host.append_child(&b, &c).unwrap();
        assert!(host.children(a).is_empty());
        assert_eq!(host.children(b), &[c]);
        assert_eq!(host.parent(c), Some(b));
    }

    #[test]
    fn injected_failures_fire_once() {
        let mut host = HeadlessHost::new();
        host.fail_next(HostOp::Create);
        let props = Props::new();
        let tag = HostTag::new("p");
        assert_eq!(
            host.create_node(&tag, &props),
            Err(HeadlessError::Injected(HostOp::Create))
        );
        assert!(host.create_node(&tag, &props).is_ok());
    }

    // -- Rendering --

    #[test]
    fn one_host_node_per_host_element() {
        let wrapper = Component::new("Wrapper", |_, props| {
            h("section").children(props.children().iter().cloned()).build()
        });
        let tree = component(&wrapper)
            .child(h("h1").child("title"))
            .child(h("p").child("body"))
            .build();
        let (rt, container) = mount(tree);
        // section, h1, text, p, text
        assert_eq!(count(rt.host().log(), |m| matches!(m, Mutation::Create { .. })), 5);
        assert_eq!(
            rt.host().to_markup(container),
            "<section><h1>title</h1><p>body</p></section>"
        );
        assert_eq!(rt.host().text(container), "titlebody");
    }

    #[test]
    fn identical_rerender_only_updates() {
        let tree = || h("ul").child(h("li").attr("class", "x").child("a")).build();
        let (mut rt, container) = mount(tree());
        rt.host_mut().take_log();

        rt.render(tree(), container);
        let summary = rt.flush().unwrap().unwrap();
        assert_eq!(summary.placements, 0);
        assert_eq!(summary.deletions, 0);
        assert_eq!(summary.updates, 3);
        assert!(rt.host().log().is_empty());
    }

    #[test]
    fn deletions_commit_before_placements() {
        let (mut rt, container) = mount(h("div").child(h("p")).build());
        rt.host_mut().take_log();

        rt.render(h("div").child(h("span")).build(), container);
        rt.flush().unwrap();
        let log = rt.host_mut().take_log();
        let removed = log.iter().position(|m| matches!(m, Mutation::Remove { .. }));
        let appended = log.iter().position(|m| matches!(m, Mutation::Append { .. }));
        assert!(removed.unwrap() < appended.unwrap());
        assert_eq!(rt.host().to_markup(container), "<div><span></span></div>");
    }

    #[test]
    fn removing_the_middle_item_is_positional() {
        let list = |items: &[&str]| {
            h("ul")
                .children(items.iter().map(|i| h("li").child(*i).build()))
                .build()
        };
        let (mut rt, container) = mount(list(&["a", "b", "c"]));
        rt.host_mut().take_log();

        rt.render(list(&["a", "c"]), container);
        rt.flush().unwrap();
        let log = rt.host_mut().take_log();
        assert_eq!(count(&log, |m| matches!(m, Mutation::Remove { .. })), 1);
        assert_eq!(count(&log, |m| matches!(m, Mutation::Append { .. })), 0);
        assert!(log.iter().any(|m| matches!(m, Mutation::SetText { text, .. } if text == "c")));
        assert_eq!(rt.host().to_markup(container), "<ul><li>a</li><li>c</li></ul>");
    }

    #[test]
    fn removed_attributes_are_removed() {
        let (mut rt, container) = mount(h("p").attr("title", "t").attr("id", 1).build());
        rt.render(h("p").attr("id", 2).build(), container);
        rt.flush().unwrap();
        assert_eq!(rt.host().to_markup(container), "<p id=\"2\"></p>");
    }

    // -- State --

    #[test]
    fn click_updates_only_the_text() {
        let (mut rt, container) = mount(component(&counter()).build());
        let button = rt.host().find_by_tag(container, "button").unwrap();
        rt.host_mut().take_log();

        assert_eq!(click(&rt, button), 1);
        assert!(rt.has_pending_update());
        rt.flush().unwrap();

        let log = rt.host_mut().take_log();
        assert_eq!(count(&log, is_structural), 0);
        assert!(
            log.iter()
                .any(|m| matches!(m, Mutation::SetText { text, .. } if text == "Count: 1"))
        );
        assert_eq!(rt.host().text(container), "Count: 1");
        // The fresh closure replaced the old listener.
        assert_eq!(rt.host().listener_count(button, "click"), 1);
    }

    #[test]
    fn setter_during_render_restarts_from_committed_tree() {
        let (mut rt, container) = mount(component(&counter()).build());
        let button = rt.host().find_by_tag(container, "button").unwrap();

        click(&rt, button);
        assert!(matches!(
            rt.tick(&UnitBudget::new(1)),
            Ok(TickOutcome::Yielded { units: 1 })
        ));
        let first = rt.wip_root();
        assert!(first.is_some());

        // The committed handler is still attached; its queue gets both clicks.
        click(&rt, button);
        let _ = rt.tick(&UnitBudget::new(1));
        assert_ne!(rt.wip_root(), first);

        rt.flush().unwrap();
        assert_eq!(rt.host().text(container), "Count: 2");
    }

    #[test]
    fn effect_setting_state_settles_in_flush() {
        let loader = Component::new("Loader", |hooks, _| {
            let (label, set_label) = hooks.use_state(String::from("loading"));
            hooks.use_effect(move || set_label.set(String::from("ready")), deps![]);
            text(label)
        });
        let (rt, container) = mount(component(&loader).build());
        assert_eq!(rt.host().text(container), "ready");
    }

    #[test]
    fn fiber_count_stays_bounded() {
        let (mut rt, container) = mount(component(&counter()).build());
        let button = rt.host().find_by_tag(container, "button").unwrap();
        let live = rt.fibers().live_count();
        for _ in 0..20 {
            click(&rt, button);
            rt.flush().unwrap();
            assert_eq!(rt.fibers().live_count(), live);
        }
        assert_eq!(rt.host().text(container), "Count: 20");
    }

    // -- Effects --

    fn effect_logger(journal: Rc<RefCell<Vec<String>>>) -> Component {
        Component::new("EffectLogger", move |hooks, props| {
            let dep = props.get("dep").and_then(Value::as_int).unwrap_or(0);
            let journal = Rc::clone(&journal);
            hooks.use_effect(
                move || {
                    journal.borrow_mut().push(format!("run {dep}"));
                    Cleanup::new(move || journal.borrow_mut().push(format!("clean {dep}")))
                },
                deps![dep],
            );
            h("i").build()
        })
    }

    #[test]
    fn effects_follow_their_deps() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let logger = effect_logger(Rc::clone(&journal));
        let (mut rt, container) = mount(component(&logger).attr("dep", 1).build());
        assert_eq!(*journal.borrow(), ["run 1"]);

        rt.render(component(&logger).attr("dep", 1).build(), container);
        rt.flush().unwrap();
        assert_eq!(*journal.borrow(), ["run 1"]);

        rt.render(component(&logger).attr("dep", 2).build(), container);
        rt.flush().unwrap();
        assert_eq!(*journal.borrow(), ["run 1", "clean 1", "run 2"]);

        rt.render(h("b").build(), container);
        let summary = rt.flush().unwrap().unwrap();
        assert_eq!(*journal.borrow(), ["run 1", "clean 1", "run 2", "clean 2"]);
        assert_eq!(summary.cleanups_run, 1);
        assert_eq!(rt.host().to_markup(container), "<b></b>");
    }

    #[test]
    fn removing_a_host_subtree_unmounts_nested_components() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let logger = effect_logger(Rc::clone(&journal));
        let (mut rt, container) = mount(
            h("div")
                .child(component(&logger).attr("dep", 7))
                .child(h("span").child(component(&logger).attr("dep", 8)))
                .build(),
        );
        assert_eq!(*journal.borrow(), ["run 7", "run 8"]);

        rt.render(h("p").build(), container);
        let summary = rt.flush().unwrap().unwrap();
        assert_eq!(
            *journal.borrow(),
            ["run 7", "run 8", "clean 7", "clean 8"]
        );
        assert_eq!(summary.cleanups_run, 2);
        // Only the top host node is detached; its descendants go with it.
        assert_eq!(summary.deletions, 1);
    }

    #[test]
    fn effects_without_deps_run_every_commit() {
        let runs = Rc::new(core::cell::Cell::new(0_u32));
        let seen = Rc::clone(&runs);
        let ticker = Component::new("Ticker", move |hooks, _| {
            let seen = Rc::clone(&seen);
            hooks.use_effect(move || seen.set(seen.get() + 1), None);
            h("i").build()
        });
        let (mut rt, container) = mount(component(&ticker).build());
        rt.render(component(&ticker).build(), container);
        rt.flush().unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn effects_run_parent_before_child() {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let j = Rc::clone(&journal);
        let child = Component::new("Child", move |hooks, _| {
            let j = Rc::clone(&j);
            hooks.use_effect(move || j.borrow_mut().push("child"), deps![]);
            h("i").build()
        });
        let j = Rc::clone(&journal);
        let parent = Component::new("Parent", move |hooks, _| {
            let j = Rc::clone(&j);
            hooks.use_effect(move || j.borrow_mut().push("parent"), deps![]);
            component(&child).build()
        });
        mount(component(&parent).build());
        assert_eq!(*journal.borrow(), ["parent", "child"]);
    }

    // -- Hook order --

    #[test]
    #[should_panic(expected = "hook order violation")]
    fn conditional_hook_panics() {
        let flaky = Component::new("Flaky", |hooks, props| {
            if props.get("extra").and_then(Value::as_bool) == Some(true) {
                let _ = hooks.use_state(0_u8);
            }
            let _ = hooks.use_ref::<u8>(None);
            h("i").build()
        });
        let (mut rt, container) = mount(component(&flaky).attr("extra", true).build());
        rt.render(component(&flaky).attr("extra", false).build(), container);
        let _ = rt.flush();
    }

    // -- Errors --

    #[test]
    fn commit_failure_keeps_current_tree() {
        let (mut rt, container) = mount(h("p").child("old").build());
        let current = rt.current_root();

        rt.host_mut().fail_next(HostOp::Remove);
        rt.render(h("div").build(), container);
        let err = rt.flush().unwrap_err();
        assert_eq!(err.phase(), Phase::Commit);
        assert_eq!(err.host_error(), &HeadlessError::Injected(HostOp::Remove));
        assert_eq!(rt.host().to_markup(container), "<p>old</p>");
        assert_eq!(rt.current_root(), current);
        assert_eq!(rt.phase(), WorkPhase::Idle);

        rt.render(h("div").build(), container);
        rt.flush().unwrap();
        assert_eq!(rt.host().to_markup(container), "<div></div>");
    }

    #[test]
    fn commit_failure_after_host_changed_promotes_and_retries() {
        let (mut rt, container) = mount(h("div").child(h("p")).build());
        let before = rt.current_root();

        rt.host_mut().fail_next(HostOp::Append);
        rt.render(h("div").child(h("span")).build(), container);
        let err = rt.flush().unwrap_err();
        assert_eq!(err.phase(), Phase::Commit);
        assert_eq!(err.host_error(), &HeadlessError::Injected(HostOp::Append));
        // The `p` was already gone, so the new tree is current without the span.
        assert_eq!(rt.host().to_markup(container), "<div></div>");
        assert_ne!(rt.current_root(), before);
        assert_eq!(rt.phase(), WorkPhase::Idle);
        assert_eq!(rt.host().discarded().len(), 1);

        rt.render(h("div").child(h("span")).build(), container);
        let summary = rt.flush().unwrap().unwrap();
        assert_eq!(summary.placements, 1);
        assert_eq!(summary.deletions, 0);
        assert_eq!(rt.host().to_markup(container), "<div><span></span></div>");
    }

    #[test]
    fn restarted_render_discards_created_nodes() {
        let (mut rt, container) = mount(h("p").build());
        rt.host_mut().take_log();

        rt.render(h("button").on("click", |_| {}).build(), container);
        // The root, then the button: its node exists but is not attached.
        rt.tick(&UnitBudget::new(2)).unwrap();
        let created: Vec<HeadlessNode> = rt
            .host()
            .log()
            .iter()
            .filter_map(|m| match m {
                Mutation::Create { node, .. } => Some(*node),
                _ => None,
            })
            .collect();
        assert_eq!(created.len(), 1);
        assert_eq!(rt.host().listener_count(created[0], "click"), 1);

        rt.render(h("div").build(), container);
        assert_eq!(rt.host().discarded(), &created[..]);
        assert_eq!(rt.host().listener_count(created[0], "click"), 0);
        rt.flush().unwrap();
        assert_eq!(rt.host().to_markup(container), "<div></div>");
    }

    #[test]
    fn render_failure_leaves_host_untouched() {
        let (mut rt, container) = mount(h("p").child("old").build());
        rt.host_mut().take_log();

        rt.host_mut().fail_next(HostOp::Create);
        rt.render(h("div").build(), container);
        let err = rt.flush().unwrap_err();
        assert_eq!(err.phase(), Phase::Render);
        assert_eq!(count(rt.host().log(), is_structural), 0);
        assert_eq!(rt.host().to_markup(container), "<p>old</p>");
        assert_eq!(rt.phase(), WorkPhase::Idle);
    }
}
