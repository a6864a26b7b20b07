// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element properties and the host-prop diff.
//!
//! [`Props`] is an ordered attribute map plus an ordered child list. Keys are
//! classified by [`classify`]:
//!
//! - keys starting with `on` are event-handler keys (`onClick` → `click`),
//! - `children` is reserved and never reaches a host node,
//! - everything else is a plain attribute.
//!
//! [`diff`] turns a pair of prop maps into the ordered list of
//! [`PropChange`]s a [`HostAdapter`](crate::host::HostAdapter) applies: stale
//! listeners come off first, then vanished attributes, then new or changed
//! attributes, then new or changed listeners.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;

use crate::element::Element;

/// Reserved key for the child list.
pub const CHILDREN: &str = "children";

/// Attribute key carrying a text node's content.
pub const NODE_VALUE: &str = "nodeValue";

/// Ordered attribute storage.
pub type AttrMap = IndexMap<Rc<str>, Value, DefaultHashBuilder>;

// -- Values --

/// A property value.
///
/// Equality is identity-like: scalars and strings compare by value, handlers
/// and opaque values by allocation. This is the comparison used both for
/// prop diffing and for hook dependency lists.
#[derive(Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float. `NaN` never equals itself.
    Float(f64),
    /// A shared string.
    Str(Rc<str>),
    /// An event handler.
    Handler(EventHandler),
    /// Any other shared value, compared by pointer.
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// Wraps an arbitrary value; equality is by allocation.
    #[must_use]
    pub fn opaque<T: Any>(value: T) -> Self {
        Self::Opaque(Rc::new(value))
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The handler payload, if any.
    #[must_use]
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Borrows an opaque payload as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Handler(h) => fmt::Debug::fmt(h, f),
            Self::Opaque(v) => write!(f, "Opaque({:p})", Rc::as_ptr(v)),
        }
    }
}

/// Attribute text, as a host would serialize it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Handler(_) => f.write_str("[handler]"),
            Self::Opaque(_) => f.write_str("[object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(v: Rc<str>) -> Self {
        Self::Str(v)
    }
}

impl From<EventHandler> for Value {
    fn from(v: EventHandler) -> Self {
        Self::Handler(v)
    }
}

// -- Events --

/// An event delivered by a host to a handler.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Lowercase event name (`click`, `input`, ...).
    pub name: Rc<str>,
    /// Event payload; for input events, the target's current value.
    pub value: Value,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A shared event callback. Two handlers are equal only if they are the same
/// allocation.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    /// Wraps a callback.
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Invokes the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Returns `true` if both handles share one allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

// -- Props --

/// Properties of an element: ordered attributes plus ordered children.
#[derive(Clone, Debug, Default)]
pub struct Props {
    attrs: AttrMap,
    children: Vec<Element>,
}

impl Props {
    /// Creates an empty prop set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an attribute or handler.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Sets an attribute or handler, returning the previous value.
    ///
    /// # Panics
    ///
    /// Panics if `key` is the reserved `children` key.
    pub fn insert(&mut self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        assert!(
            &*key != CHILDREN,
            "`children` is reserved; use Props::push_child"
        );
        self.attrs.insert(key, value.into())
    }

    /// Removes an attribute or handler, preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attrs.shift_remove(key)
    }

    /// Iterates attributes and handlers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (&**k, v))
    }

    /// Number of attributes and handlers (children excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Returns `true` if there are no attributes or handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// The ordered child list.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Appends a child.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }
}

// -- Key classification --

/// What a prop key means to a host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropKind {
    /// `on*`: an event handler.
    Event,
    /// The reserved `children` key.
    Children,
    /// Anything else.
    Attribute,
}

/// Classifies a prop key.
#[must_use]
pub fn classify(key: &str) -> PropKind {
    if key == CHILDREN {
        PropKind::Children
    } else if key.starts_with("on") {
        PropKind::Event
    } else {
        PropKind::Attribute
    }
}

/// Derives the host event name from a handler key: `onClick` → `click`.
#[must_use]
pub fn event_name(key: &str) -> String {
    key.strip_prefix("on").unwrap_or(key).to_lowercase()
}

// -- Diff --

/// One host-side step of a prop update.
#[derive(Clone, Debug, PartialEq)]
pub enum PropChange<'a> {
    /// Detach a listener that is gone or replaced.
    RemoveListener {
        /// Host event name.
        event: String,
        /// The listener that was attached.
        handler: &'a EventHandler,
    },
    /// Remove an attribute absent from the new props.
    RemoveAttribute {
        /// Attribute key.
        name: &'a str,
    },
    /// Set a new or changed attribute. For text nodes, `nodeValue` carries the
    /// text content.
    SetAttribute {
        /// Attribute key.
        name: &'a str,
        /// New value.
        value: &'a Value,
    },
    /// Attach a new or replaced listener.
    AddListener {
        /// Host event name.
        event: String,
        /// The listener to attach.
        handler: &'a EventHandler,
    },
}

/// Computes the ordered changes that turn `prev` into `next` on a host node.
///
/// Values are compared with [`Value`]'s identity-like equality, so a freshly
/// allocated handler always counts as changed.
#[must_use]
pub fn diff<'a>(prev: &'a Props, next: &'a Props) -> Vec<PropChange<'a>> {
    let mut changes = Vec::new();

    for (key, old) in prev.iter() {
        if classify(key) != PropKind::Event {
            continue;
        }
        let Some(handler) = old.as_handler() else {
            continue;
        };
        if next.get(key) != Some(old) {
            changes.push(PropChange::RemoveListener {
                event: event_name(key),
                handler,
            });
        }
    }

    for (key, _) in prev.iter() {
        if classify(key) == PropKind::Attribute && next.get(key).is_none() {
            changes.push(PropChange::RemoveAttribute { name: key });
        }
    }

    for (key, value) in next.iter() {
        if classify(key) == PropKind::Attribute && prev.get(key) != Some(value) {
            changes.push(PropChange::SetAttribute { name: key, value });
        }
    }

    for (key, value) in next.iter() {
        if classify(key) != PropKind::Event {
            continue;
        }
        let Some(handler) = value.as_handler() else {
            continue;
        };
        if prev.get(key) != Some(value) {
            changes.push(PropChange::AddListener {
                event: event_name(key),
                handler,
            });
        }
    }

    changes
}

// ----- Tests -----

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn props(pairs: &[(&str, Value)]) -> Props {
        let mut p = Props::new();
        for (k, v) in pairs {
            p.insert(*k, v.clone());
        }
        p
    }

    #[test]
    fn classifies_keys() {
        assert_eq!(classify("onClick"), PropKind::Event);
        assert_eq!(classify("children"), PropKind::Children);
        assert_eq!(classify("id"), PropKind::Attribute);
        assert_eq!(classify(NODE_VALUE), PropKind::Attribute);
        assert_eq!(event_name("onClick"), "click");
        assert_eq!(event_name("onInput"), "input");
    }

    #[test]
    fn value_equality_is_identity_for_handlers() {
        let a = EventHandler::new(|_| {});
        let b = EventHandler::new(|_| {});
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
        assert_eq!(Value::from("x"), Value::from(String::from("x")));
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        let shared = Value::opaque(5_u8);
        assert_eq!(shared, shared.clone());
        assert_ne!(shared, Value::opaque(5_u8));
    }

    #[test]
    fn diff_orders_changes() {
        let old_click = EventHandler::new(|_| {});
        let new_click = EventHandler::new(|_| {});
        let prev = props(&[
            ("id", Value::from("a")),
            ("title", Value::from("t")),
            ("onClick", Value::from(old_click.clone())),
        ]);
        let next = props(&[
            ("id", Value::from("b")),
            ("onClick", Value::from(new_click.clone())),
        ]);

        let changes = diff(&prev, &next);
        assert_eq!(
            changes,
            vec![
                PropChange::RemoveListener {
                    event: "click".into(),
                    handler: &old_click,
                },
                PropChange::RemoveAttribute { name: "title" },
                PropChange::SetAttribute {
                    name: "id",
                    value: &Value::from("b"),
                },
                PropChange::AddListener {
                    event: "click".into(),
                    handler: &new_click,
                },
            ]
        );
    }

    #[test]
    fn unchanged_props_produce_no_changes() {
        let click = EventHandler::new(|_| {});
        let prev = props(&[("id", Value::from("a")), ("onClick", click.clone().into())]);
        let next = props(&[("id", Value::from("a")), ("onClick", click.into())]);
        assert!(diff(&prev, &next).is_empty(), "identical props must not diff");
    }

    #[test]
    fn removed_handler_is_detached() {
        let click = EventHandler::new(|_| {});
        let prev = props(&[("onClick", click.clone().into())]);
        let next = Props::new();
        assert_eq!(
            diff(&prev, &next),
            vec![PropChange::RemoveListener {
                event: "click".into(),
                handler: &click,
            }]
        );
    }

    #[test]
    fn node_value_is_an_attribute_change() {
        let prev = props(&[(NODE_VALUE, Value::from("Count: 0"))]);
        let next = props(&[(NODE_VALUE, Value::from("Count: 1"))]);
        assert_eq!(
            diff(&prev, &next),
            vec![PropChange::SetAttribute {
                name: NODE_VALUE,
                value: &Value::from("Count: 1"),
            }]
        );
    }

    #[test]
    fn insertion_order_is_preserved() {
        let p = props(&[
            ("b", Value::Int(1)),
            ("a", Value::Int(2)),
            ("c", Value::Int(3)),
        ]);
        let keys: Vec<&str> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    #[should_panic(expected = "`children` is reserved")]
    fn children_key_is_reserved() {
        let mut p = Props::new();
        p.insert(CHILDREN, Value::Null);
    }
}
