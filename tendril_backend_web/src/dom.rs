// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM host adapter.
//!
//! [`DomHost`] creates and patches real DOM nodes for the commit engine.
//! Attribute changes become JS property assignments when the node already has
//! a property of that name (`value`, `checked`, `nodeValue`, `className`) and
//! `setAttribute` calls otherwise. Event props become listeners wrapping the
//! component's [`EventHandler`]; the host keeps each wrapper alive until the
//! listener is removed, matching removals by handler identity, or until its
//! node is removed or discarded.

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString as _};
use alloc::vec::Vec;

use js_sys::Reflect;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, HtmlInputElement, Node};

use tendril_core::element::HostTag;
use tendril_core::host::HostAdapter;
use tendril_core::props::{self, Event, EventHandler, PropChange, Props, Value};

/// A DOM call failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// There is no global `window` (not running in a browser main thread).
    #[error("no global `window`")]
    NoWindow,
    /// The window or container has no owning document.
    #[error("no `document` available")]
    NoDocument,
    /// A DOM method threw.
    #[error("`{op}` failed: {message}")]
    Js {
        /// The DOM operation that threw.
        op: &'static str,
        /// The thrown value, stringified.
        message: String,
    },
}

impl DomError {
    fn js(op: &'static str, thrown: &JsValue) -> Self {
        let message = thrown.as_string().unwrap_or_else(|| format!("{thrown:?}"));
        Self::Js { op, message }
    }
}

type ListenerClosure = Closure<dyn FnMut(web_sys::Event)>;

struct Listener {
    node: Node,
    event: String,
    handler: EventHandler,
    closure: ListenerClosure,
}

/// [`HostAdapter`] over the browser DOM.
pub struct DomHost {
    document: Document,
    listeners: Vec<Listener>,
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("document", &"Document")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DomHost {
    /// Creates an adapter that builds nodes in `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            listeners: Vec::new(),
        }
    }

    /// Creates an adapter for the global window's document.
    pub fn from_window() -> Result<Self, DomError> {
        let window = web_sys::window().ok_or(DomError::NoWindow)?;
        let document = window.document().ok_or(DomError::NoDocument)?;
        Ok(Self::new(document))
    }

    /// Returns the document nodes are created in.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of listeners currently attached by this adapter.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn apply(&mut self, node: &Node, changes: Vec<PropChange<'_>>) -> Result<(), DomError> {
        for change in changes {
            match change {
                PropChange::RemoveListener { event, handler } => {
                    self.remove_listener(node, &event, handler)?;
                }
                PropChange::RemoveAttribute { name } => remove_attribute(node, name)?,
                PropChange::SetAttribute { name, value } => set_attribute(node, name, value)?,
                PropChange::AddListener { event, handler } => {
                    self.add_listener(node, event, handler)?;
                }
            }
        }
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: &Node,
        event: String,
        handler: &EventHandler,
    ) -> Result<(), DomError> {
        let name: Rc<str> = event.as_str().into();
        let callback = handler.clone();
        let closure = Closure::wrap(Box::new(move |dom_event: web_sys::Event| {
            let value = dom_event
                .target()
                .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
                .map_or(Value::Null, |input| Value::from(input.value()));
            callback.call(&Event::new(Rc::clone(&name), value));
        }) as Box<dyn FnMut(web_sys::Event)>);

        node.add_event_listener_with_callback(&event, closure.as_ref().unchecked_ref())
            .map_err(|e| DomError::js("addEventListener", &e))?;
        self.listeners.push(Listener {
            node: node.clone(),
            event,
            handler: handler.clone(),
            closure,
        });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: &Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), DomError> {
        let Some(idx) = self.listeners.iter().position(|l| {
            l.event == event && l.handler.ptr_eq(handler) && l.node.is_same_node(Some(node))
        }) else {
            return Ok(());
        };
        let listener = self.listeners.swap_remove(idx);
        detach(&listener)
    }

    /// Drops every listener registered on `root` or its descendants.
    fn release_subtree(&mut self, root: &Node) -> Result<(), DomError> {
        let mut idx = 0;
        while idx < self.listeners.len() {
            if root.contains(Some(&self.listeners[idx].node)) {
                let listener = self.listeners.swap_remove(idx);
                detach(&listener)?;
            } else {
                idx += 1;
            }
        }
        Ok(())
    }
}

fn detach(listener: &Listener) -> Result<(), DomError> {
    listener
        .node
        .remove_event_listener_with_callback(
            &listener.event,
            listener.closure.as_ref().unchecked_ref(),
        )
        .map_err(|e| DomError::js("removeEventListener", &e))
}

fn to_js(value: &Value) -> JsValue {
    match value {
        Value::Null => JsValue::NULL,
        Value::Bool(b) => JsValue::from_bool(*b),
        Value::Int(i) => {
            #[expect(
                clippy::cast_precision_loss,
                reason = "JS numbers are f64; integers past 2^53 lose precision there anyway"
            )]
            let n = *i as f64;
            JsValue::from_f64(n)
        }
        Value::Float(f) => JsValue::from_f64(*f),
        Value::Str(s) => JsValue::from_str(s),
        Value::Handler(_) | Value::Opaque(_) => JsValue::UNDEFINED,
    }
}

fn has_property(node: &Node, name: &str) -> Result<bool, DomError> {
    let target: &JsValue = node.as_ref();
    Reflect::has(target, &JsValue::from_str(name)).map_err(|e| DomError::js("Reflect.has", &e))
}

fn set_attribute(node: &Node, name: &str, value: &Value) -> Result<(), DomError> {
    if has_property(node, name)? {
        let target: &JsValue = node.as_ref();
        Reflect::set(target, &JsValue::from_str(name), &to_js(value))
            .map_err(|e| DomError::js("Reflect.set", &e))?;
        return Ok(());
    }
    match node.dyn_ref::<web_sys::Element>() {
        Some(element) => element
            .set_attribute(name, &value.to_string())
            .map_err(|e| DomError::js("setAttribute", &e)),
        None => Ok(()),
    }
}

fn remove_attribute(node: &Node, name: &str) -> Result<(), DomError> {
    if has_property(node, name)? {
        let target: &JsValue = node.as_ref();
        Reflect::set(target, &JsValue::from_str(name), &JsValue::from_str(""))
            .map_err(|e| DomError::js("Reflect.set", &e))?;
        return Ok(());
    }
    match node.dyn_ref::<web_sys::Element>() {
        Some(element) => element
            .remove_attribute(name)
            .map_err(|e| DomError::js("removeAttribute", &e)),
        None => Ok(()),
    }
}

impl HostAdapter for DomHost {
    type Node = Node;
    type Error = DomError;

    fn create_node(&mut self, tag: &HostTag, props: &Props) -> Result<Node, DomError> {
        let node: Node = if tag.is_text() {
            self.document.create_text_node("").into()
        } else {
            self.document
                .create_element(tag.as_str())
                .map_err(|e| DomError::js("createElement", &e))?
                .into()
        };
        let empty = Props::new();
        self.apply(&node, props::diff(&empty, props))?;
        Ok(node)
    }

    fn apply_props_diff(
        &mut self,
        node: &Node,
        prev: &Props,
        next: &Props,
    ) -> Result<(), DomError> {
        self.apply(node, props::diff(prev, next))
    }

    fn append_child(&mut self, parent: &Node, child: &Node) -> Result<(), DomError> {
        parent
            .append_child(child)
            .map(drop)
            .map_err(|e| DomError::js("appendChild", &e))
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) -> Result<(), DomError> {
        parent
            .remove_child(child)
            .map_err(|e| DomError::js("removeChild", &e))?;
        self.release_subtree(child)
    }

    fn discard_node(&mut self, node: &Node) {
        // Never attached, so no event can reach these; dropping the closures
        // is enough.
        self.listeners.retain(|l| !node.contains(Some(&l.node)));
    }
}
