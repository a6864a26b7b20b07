// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable element descriptions.
//!
//! An [`Element`] says *what* should be on screen: a type (a host tag or a
//! [`Component`]) and its [`Props`]. Elements are cheap to clone; the props
//! sit behind an `Rc` so fibers can alias them without copying.
//!
//! Build trees with [`h`] and [`component`]:
//!
//! ```
//! use tendril_core::element::h;
//!
//! let list = h("ul")
//!     .attr("id", "todo")
//!     .child(h("li").child("first"))
//!     .child(h("li").child("second"))
//!     .build();
//! assert_eq!(list.children().len(), 2);
//! ```
//!
//! Strings and integers passed as children become [`HostTag::TEXT`] elements
//! whose only prop is `nodeValue`.

use alloc::borrow::Cow;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use crate::hooks::Hooks;
use crate::props::{Event, EventHandler, NODE_VALUE, Props, Value};

/// The tag of a host element. Compared by value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HostTag(Cow<'static, str>);

impl HostTag {
    /// Synthetic tag for text nodes.
    pub const TEXT: Self = Self(Cow::Borrowed("TEXT_ELEMENT"));

    /// Synthetic tag for the root fiber that owns the container.
    pub const ROOT: Self = Self(Cow::Borrowed("ROOT"));

    /// Creates a tag.
    #[must_use]
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    /// The tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for [`HostTag::TEXT`].
    #[must_use]
    pub fn is_text(&self) -> bool {
        *self == Self::TEXT
    }
}

impl From<&'static str> for HostTag {
    fn from(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }
}

impl From<String> for HostTag {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

impl fmt::Debug for HostTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTag({})", self.0)
    }
}

impl fmt::Display for HostTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signature of a component body.
pub type RenderFn = dyn Fn(&mut Hooks<'_>, &Props) -> Element;

/// A render function that produces exactly one element.
///
/// Identity is allocation identity: clones of one `Component` are the same
/// type to the reconciler, two separately created components never are, even
/// if they wrap the same function.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    render: Rc<RenderFn>,
}

impl Component {
    /// Wraps a render function. `name` is used in diagnostics only.
    pub fn new(
        name: &'static str,
        render: impl Fn(&mut Hooks<'_>, &Props) -> Element + 'static,
    ) -> Self {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    /// Diagnostic name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Element {
        (self.render)(hooks, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// What kind of node an element describes.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// A host node (`div`, text, ...).
    Host(HostTag),
    /// A component, rendered by calling its body.
    Component(Component),
}

impl ElementType {
    /// Returns `true` for components.
    #[must_use]
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    /// The host tag, if this is a host type.
    #[must_use]
    pub fn host_tag(&self) -> Option<&HostTag> {
        match self {
            Self::Host(tag) => Some(tag),
            Self::Component(_) => None,
        }
    }
}

impl From<&'static str> for ElementType {
    fn from(tag: &'static str) -> Self {
        Self::Host(tag.into())
    }
}

impl From<HostTag> for ElementType {
    fn from(tag: HostTag) -> Self {
        Self::Host(tag)
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        Self::Component(component)
    }
}

impl From<&Component> for ElementType {
    fn from(component: &Component) -> Self {
        Self::Component(component.clone())
    }
}

/// An immutable description of one node and its subtree.
#[derive(Clone, Debug)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    /// Creates an element from a type and finished props.
    #[must_use]
    pub fn new(ty: impl Into<ElementType>, props: Props) -> Self {
        Self {
            ty: ty.into(),
            props: Rc::new(props),
        }
    }

    /// The element type.
    #[must_use]
    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    /// The element props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The ordered children.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        self.props.children()
    }

    pub(crate) fn shared_props(&self) -> &Rc<Props> {
        &self.props
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        text(s)
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        text(s)
    }
}

impl From<i64> for Element {
    fn from(n: i64) -> Self {
        text(n)
    }
}

impl From<i32> for Element {
    fn from(n: i32) -> Self {
        text(n)
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// Creates an element with the given props and children.
///
/// Children are normalized: anything convertible into an [`Element`] is
/// accepted, with strings and integers becoming text elements.
pub fn create_element<I>(ty: impl Into<ElementType>, mut props: Props, children: I) -> Element
where
    I: IntoIterator,
    I::Item: Into<Element>,
{
    for child in children {
        props.push_child(child.into());
    }
    Element::new(ty, props)
}

/// Creates a text element.
pub fn text(value: impl Into<Value>) -> Element {
    let mut props = Props::new();
    props.insert(NODE_VALUE, value);
    Element::new(HostTag::TEXT, props)
}

/// Starts building a host element.
pub fn h(tag: impl Into<HostTag>) -> ElementBuilder {
    ElementBuilder::new(ElementType::Host(tag.into()))
}

/// Starts building a component element.
pub fn component(component: &Component) -> ElementBuilder {
    ElementBuilder::new(ElementType::Component(component.clone()))
}

/// Fluent element construction; see [`h`] and [`component`].
#[derive(Clone, Debug)]
#[must_use]
pub struct ElementBuilder {
    ty: ElementType,
    props: Props,
}

impl ElementBuilder {
    fn new(ty: ElementType) -> Self {
        Self {
            ty,
            props: Props::new(),
        }
    }

    /// Sets an attribute.
    pub fn attr(mut self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.props.insert(key, value);
        self
    }

    /// Attaches a listener for `event` (`"click"` is stored as `onclick`).
    pub fn on(self, event: &str, callback: impl Fn(&Event) + 'static) -> Self {
        self.handler(event, EventHandler::new(callback))
    }

    /// Attaches an existing handler, keeping its identity.
    pub fn handler(mut self, event: &str, handler: EventHandler) -> Self {
        self.props.insert(format!("on{event}"), handler);
        self
    }

    /// Appends a child.
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.props.push_child(child.into());
        self
    }

    /// Appends several children.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        for child in children {
            self.props.push_child(child.into());
        }
        self
    }

    /// Finishes the element.
    pub fn build(self) -> Element {
        Element::new(self.ty, self.props)
    }
}

// ----- Tests -----
