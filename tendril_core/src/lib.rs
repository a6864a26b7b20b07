// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental UI-tree reconciliation with fibers, hooks, and time-sliced
//! commits.
//!
//! `tendril_core` turns a declarative [`Element`](element::Element)
//! description into mutations of a native node tree. It is `no_std`
//! compatible (with `alloc`), keeps every fiber in one struct-of-arrays store
//! addressed by generational handles, and never talks to a toolkit directly:
//! a [`HostAdapter`](host::HostAdapter) does that.
//!
//! # Architecture
//!
//! Rendering is split into an interruptible render phase and an atomic
//! commit:
//!
//! ```text
//!   Runtime::render(element) / Setter::set(..)
//!       │
//!       ▼
//!   seed WIP root ──► tick(deadline) ──► perform unit ──► reconcile children
//!                         ▲    │                               │
//!                         │    └─ deadline expired: Yielded ◄──┘
//!                         │
//!                     next slice       no units left
//!                                           │
//!                                           ▼
//!   commit: deletions ──► placements/updates ──► effects ──► sweep
//! ```
//!
//! **[`element`]**: element descriptions, components and the builder API.
//!
//! **[`props`]**: ordered prop maps, the [`Value`](props::Value) type and the
//! host prop diff.
//!
//! **[`fiber`]**: struct-of-arrays fiber store with pre-order traversal and
//! post-commit sweep.
//!
//! **[`hooks`]**: positional hook cells (`use_state`, `use_effect`,
//! `use_memo`, `use_callback`, `use_ref`) and state setters.
//!
//! **[`runtime`]**: the work loop: scheduling, units of work and commit.
//!
//! **[`timing`]**: the [`Deadline`](timing::Deadline) capability each slice
//! runs against, plus clocks and deterministic budgets.
//!
//! **[`host`]**: the [`HostAdapter`](host::HostAdapter) contract;
//! **[`headless`]** is an in-memory implementation.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! work-loop instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Example
//!
//! ```
//! use tendril_core::element::{Component, component, h, text};
//! use tendril_core::headless::HeadlessHost;
//! use tendril_core::runtime::{Runtime, RuntimeConfig};
//!
//! let greeting = Component::new("Greeting", |hooks, props| {
//!     let (name, _set_name) = hooks.use_state(String::from("world"));
//!     let tag = props.get("tag").and_then(|v| v.as_str()).unwrap_or("p").to_owned();
//!     h(tag).child(text(format!("hello, {name}"))).build()
//! });
//!
//! let mut runtime = Runtime::new(HeadlessHost::new(), RuntimeConfig::headless());
//! let container = runtime.host_mut().create_container();
//! runtime.render(component(&greeting).attr("tag", "h1").build(), container);
//! runtime.flush().unwrap();
//! assert_eq!(runtime.host().to_markup(container), "<h1>hello, world</h1>");
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-unit and
//!   per-host-mutation events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod commit;
pub mod element;
pub mod error;
pub mod fiber;
pub mod headless;
pub mod hooks;
pub mod host;
pub mod props;
mod reconcile;
pub mod runtime;
pub mod time;
pub mod timing;
pub mod trace;
