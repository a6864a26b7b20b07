// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for tendril.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomHost`]: [`HostAdapter`](tendril_core::host::HostAdapter) over the DOM
//! - [`WorkLoop`]: `requestAnimationFrame` work slices with a `setTimeout`
//!   fallback
//! - [`PerformanceClock`]: `performance.now()` as a
//!   [`Clock`](tendril_core::timing::Clock)
//! - [`mount`]: wires the three together around a
//!   [`Runtime`](tendril_core::runtime::Runtime)

#![no_std]

extern crate alloc;

mod dom;
mod driver;

pub use dom::{DomError, DomHost};
pub use driver::{DEFAULT_FALLBACK_MS, WorkLoop};

use alloc::format;
use alloc::rc::Rc;
use core::cell::RefCell;

use wasm_bindgen::JsValue;
use web_sys::Node;

use tendril_core::element::Element;
use tendril_core::runtime::{Runtime, RuntimeConfig};
use tendril_core::time::{HostTime, Timebase};
use tendril_core::timing::{Clock, WorkTick};
use tendril_core::trace::Tracer;

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    driver::host_time_from_millis(driver::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

/// [`Clock`] backed by `performance.now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now(&self) -> HostTime {
        now()
    }
}

/// A runtime mounted into the page, driven by a running [`WorkLoop`].
///
/// Dropping the handle stops the loop. Keep it alive for as long as the UI
/// should stay interactive.
#[derive(Debug)]
pub struct Mounted {
    runtime: Rc<RefCell<Runtime<DomHost>>>,
    work_loop: WorkLoop,
}

impl Mounted {
    /// The shared runtime. Borrow it to re-render or inspect the tree
    /// between slices.
    #[must_use]
    pub fn runtime(&self) -> &Rc<RefCell<Runtime<DomHost>>> {
        &self.runtime
    }

    /// The driver delivering work slices.
    #[must_use]
    pub fn work_loop(&self) -> &WorkLoop {
        &self.work_loop
    }
}

/// Renders `element` into `container` and starts driving the runtime.
///
/// The first render is scheduled immediately; the DOM changes at the commit
/// that follows, on a later animation frame or timer.
pub fn mount(
    element: Element,
    container: &web_sys::Element,
    config: RuntimeConfig,
) -> Result<Mounted, DomError> {
    let document = container.owner_document().ok_or(DomError::NoDocument)?;
    let mut runtime = Runtime::new(DomHost::new(document), config);
    runtime.render(element, Node::from(container.clone()));
    let runtime = Rc::new(RefCell::new(runtime));

    let work_loop = WorkLoop::new({
        let runtime = Rc::clone(&runtime);
        move |tick| run_slice(&runtime, &tick)
    });
    work_loop.start();

    Ok(Mounted { runtime, work_loop })
}

fn run_slice(runtime: &RefCell<Runtime<DomHost>>, tick: &WorkTick) {
    // Already inside a slice (a handler re-entered the loop); skip this one.
    let Ok(mut runtime) = runtime.try_borrow_mut() else {
        return;
    };
    if !runtime.needs_work() {
        return;
    }
    let clock = PerformanceClock;
    let deadline = runtime.slice_deadline(&clock, tick);
    if let Err(err) = runtime.tick_traced(tick, &deadline, &mut Tracer::none()) {
        web_sys::console::error_1(&JsValue::from_str(&format!("tendril: {err}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timebase_is_microsecond() {
        let tb = timebase();
        // 1 tick = 1 µs = 1000 ns
        assert_eq!(tb.ticks_to_nanos(1), 1000);
        assert_eq!(tb.ticks_to_nanos(1_000_000), 1_000_000_000);
    }
}
