// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counter and text-mirror demo for the browser backend.
//!
//! Mounts an `App` component into `#app`. Clicking the buttons updates a
//! counter, typing into the field mirrors its value below it, and an effect
//! logs every committed count to the console.
//!
//! Build with: `wasm-pack build --target web demos/web_counter`
//! Then serve `demos/web_counter/` and open `index.html`.

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::format;
use alloc::string::String;

use tendril_backend_web::mount;
use tendril_core::deps;
use tendril_core::element::{Component, Element, component, h, text};
use tendril_core::props::Event;
use tendril_core::runtime::RuntimeConfig;
use wasm_bindgen::prelude::*;

fn counter() -> Component {
    Component::new("Counter", |hooks, props| {
        let step = props.get("step").and_then(|v| v.as_int()).unwrap_or(1);
        let (count, set_count) = hooks.use_state(0_i64);
        let parity = hooks.use_memo(
            || if count % 2 == 0 { "even" } else { "odd" },
            deps![count],
        );
        let renders = hooks.use_ref(Some(0_u32));
        renders.with(|n| *n = Some(n.unwrap_or(0) + 1));

        hooks.use_effect(
            move || {
                web_sys::console::log_1(&JsValue::from_str(&format!("count is now {count}")));
            },
            deps![count],
        );

        let dec = set_count.clone();
        h("div")
            .attr("class", "counter")
            .child(
                h("button")
                    .on("click", move |_| dec.update(move |c| c - step))
                    .child("-"),
            )
            .child(h("span").child(text(format!("{count} ({parity})"))))
            .child(
                h("button")
                    .on("click", move |_| set_count.update(move |c| c + step))
                    .child("+"),
            )
            .child(h("small").child(text(format!(
                "renders: {}",
                renders.current().unwrap_or(0)
            ))))
            .build()
    })
}

fn mirror() -> Component {
    Component::new("Mirror", |hooks, _| {
        let (value, set_value) = hooks.use_state(String::new());
        h("div")
            .child(
                h("input")
                    .attr("placeholder", "type here")
                    .attr("value", value.as_str())
                    .on("input", move |event: &Event| {
                        let typed = event.value.as_str().unwrap_or_default();
                        set_value.set(String::from(typed));
                    }),
            )
            .child(h("p").child(text(format!("you typed: {value}"))))
            .build()
    })
}

fn app() -> Element {
    let counter = counter();
    let mirror = mirror();
    let root = Component::new("App", move |_, _| {
        h("main")
            .child(h("h1").child("tendril"))
            .child(component(&counter).attr("step", 1))
            .child(component(&counter).attr("step", 5))
            .child(component(&mirror))
            .build()
    });
    component(&root).build()
}

/// Mounts the demo into `#app`.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let container = document
        .get_element_by_id("app")
        .ok_or_else(|| JsValue::from_str("missing #app"))?;

    let mounted = mount(app(), &container, RuntimeConfig::web())
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    // Keep the runtime and its work loop alive for the page's lifetime.
    core::mem::forget(mounted);
    Ok(())
}
