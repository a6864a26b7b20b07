// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless work loop that exercises the tracing and diagnostics pipeline.
//!
//! Mounts a small todo list into a [`HeadlessHost`], then adds and removes
//! items through event handlers. Every pass runs in slices of
//! [`UNITS_PER_SLICE`] units, recording events to both a
//! [`PrettyPrintSink`](tendril_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](tendril_debug::recorder::RecorderSink), then exports a
//! Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use tendril_core::element::{Component, Element, component, h, text};
use tendril_core::headless::{HeadlessHost, HeadlessNode};
use tendril_core::props::{Event, Value};
use tendril_core::runtime::{Runtime, RuntimeConfig, TickOutcome};
use tendril_core::time::{HostTime, Timebase};
use tendril_core::timing::{UnitBudget, WorkTick};
use tendril_core::trace::{
    CommitEvent, HostMutationEvent, RootScheduledEvent, SliceEndEvent, TickEvent, TraceSink,
    Tracer, UnitEvent, WorkAbandonedEvent,
};

use tendril_debug::pretty::PrettyPrintSink;
use tendril_debug::recorder::RecorderSink;

const UNITS_PER_SLICE: u32 = 3;
/// Simulated gap between slices: one 60 Hz frame, in nanoseconds.
const FRAME_NS: u64 = 16_666_667;

/// Forwards every event to two sinks.
struct Tee<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

impl TraceSink for Tee<'_> {
    fn on_tick(&mut self, e: &TickEvent) {
        self.pretty.on_tick(e);
        self.recorder.on_tick(e);
    }

    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        self.pretty.on_root_scheduled(e);
        self.recorder.on_root_scheduled(e);
    }

    fn on_slice_end(&mut self, e: &SliceEndEvent) {
        self.pretty.on_slice_end(e);
        self.recorder.on_slice_end(e);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.pretty.on_commit(e);
        self.recorder.on_commit(e);
    }

    fn on_work_abandoned(&mut self, e: &WorkAbandonedEvent) {
        self.pretty.on_work_abandoned(e);
        self.recorder.on_work_abandoned(e);
    }

    fn on_unit(&mut self, e: &UnitEvent) {
        self.pretty.on_unit(e);
        self.recorder.on_unit(e);
    }

    fn on_host_mutation(&mut self, e: &HostMutationEvent) {
        self.pretty.on_host_mutation(e);
        self.recorder.on_host_mutation(e);
    }
}

fn todo_list() -> Component {
    Component::new("TodoList", |hooks, _| {
        let (items, set_items) = hooks.use_state(vec![String::from("write docs")]);
        let add = {
            let set_items = set_items.clone();
            move |_: &Event| {
                set_items.update(|items| {
                    let mut next = items.clone();
                    next.push(format!("task {}", items.len() + 1));
                    next
                });
            }
        };
        let pop = move |_: &Event| {
            set_items.update(|items| {
                let mut next = items.clone();
                next.pop();
                next
            });
        };
        h("section")
            .child(h("h1").child(text(format!("{} open", items.len()))))
            .child(h("button").attr("id", "add").on("click", add).child("add"))
            .child(h("button").attr("id", "pop").on("click", pop).child("pop"))
            .child(
                h("ul").children(
                    items
                        .iter()
                        .map(|item| Element::from(h("li").child(text(item.as_str())))),
                ),
            )
            .build()
    })
}

fn find_button(host: &HeadlessHost, root: HeadlessNode, id: &str) -> HeadlessNode {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if host.attribute(node, "id") == Some(&Value::from(id)) {
            return node;
        }
        stack.extend_from_slice(host.children(node));
    }
    panic!("no button with id {id}");
}

fn main() {
    let timebase = Timebase::NANOS;

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()), timebase);
    let mut recorder = RecorderSink::new();

    // -- runtime -----------------------------------------------------------
    let mut runtime = Runtime::new(HeadlessHost::new(), RuntimeConfig::headless());
    let container = runtime.host_mut().create_container();
    let app = todo_list();

    let mut now_ticks: u64 = 1_000_000_000; // start at 1s
    let mut drive = |runtime: &mut Runtime<HeadlessHost>,
                     pretty: &mut PrettyPrintSink,
                     recorder: &mut RecorderSink| {
        let mut slices = 0;
        while runtime.needs_work() {
            let tick = WorkTick::manual(HostTime(now_ticks));
            let mut tee = Tee {
                pretty: &mut *pretty,
                recorder: &mut *recorder,
            };
            let mut tracer = Tracer::new(&mut tee);
            let outcome = runtime
                .tick_traced(&tick, &UnitBudget::new(UNITS_PER_SLICE), &mut tracer)
                .expect("headless host never fails");
            slices += 1;
            now_ticks += FRAME_NS;
            if let TickOutcome::Committed { .. } = outcome {
                break;
            }
        }
        slices
    };

    runtime.render(component(&app).build(), container);
    let slices = drive(&mut runtime, &mut pretty, &mut recorder);
    println!("mounted in {slices} slices: {}", runtime.host().to_markup(container));

    // -- interaction -------------------------------------------------------
    for (label, id) in [("add", "add"), ("add", "add"), ("pop", "pop")] {
        let button = find_button(runtime.host(), container, id);
        runtime
            .host()
            .dispatch(button, &Event::new("click", Value::Null));
        let slices = drive(&mut runtime, &mut pretty, &mut recorder);
        println!("{label} took {slices} slices: {}", runtime.host().to_markup(container));
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    tendril_debug::chrome::export(recorder.as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({} fibers live)", runtime.fibers().live_count());
}
