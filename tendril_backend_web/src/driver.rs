// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser work-slice driver.
//!
//! [`WorkLoop`] asks for a work slice through two channels at once:
//! `requestAnimationFrame` and a `setTimeout` fallback. Whichever fires first
//! cancels the other, delivers a [`WorkTick`] to the callback, and registers
//! both again. Background tabs throttle animation frames to zero, so the
//! timer keeps rendering alive there.
//!
//! Animation-frame ticks carry the callback's [`DOMHighResTimeStamp`][mdn];
//! timer ticks read `performance.now()`. Both are converted to microsecond
//! [`HostTime`] ticks.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use tendril_core::time::HostTime;
use tendril_core::timing::{TickKind, WorkTick};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, millis: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// Delay of the timer fallback, in milliseconds: one slice of
/// [`RuntimeConfig::web`](tendril_core::runtime::RuntimeConfig::web).
pub const DEFAULT_FALLBACK_MS: i32 = 5;

/// Converts a `DOMHighResTimeStamp` (milliseconds) into microsecond ticks.
pub(crate) fn host_time_from_millis(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "browser timestamps are small positive f64; µs fits in u64"
    )]
    let us = (ms.max(0.0) * 1000.0) as u64;
    HostTime(us)
}

/// A work loop fed by `requestAnimationFrame` with a `setTimeout` fallback.
///
/// Create with [`WorkLoop::new`], then call [`start`](Self::start). The loop
/// re-registers after every tick, whether or not the callback found work,
/// until [`stop`](Self::stop) is called or the `WorkLoop` is dropped.
pub struct WorkLoop {
    inner: Rc<LoopInner>,
}

type FrameClosure = Closure<dyn FnMut(f64)>;
type TimerClosure = Closure<dyn FnMut()>;

struct LoopInner {
    frame_closure: RefCell<Option<FrameClosure>>,
    timer_closure: RefCell<Option<TimerClosure>>,

    /// Receives one [`WorkTick`] per slice.
    callback: RefCell<Box<dyn FnMut(WorkTick)>>,

    running: Cell<bool>,
    /// Pending `requestAnimationFrame` id, if any.
    frame_id: Cell<Option<i32>>,
    /// Pending `setTimeout` id, if any.
    timer_id: Cell<Option<i32>>,
    fallback_ms: i32,
}

impl LoopInner {
    fn cancel_pending(&self) {
        if let Some(id) = self.frame_id.take() {
            cancel_animation_frame(id);
        }
        if let Some(id) = self.timer_id.take() {
            clear_timeout(id);
        }
    }

    fn schedule(&self) {
        if !self.running.get() {
            return;
        }
        if let Some(ref closure) = *self.frame_closure.borrow() {
            self.frame_id
                .set(Some(request_animation_frame(closure.as_ref().unchecked_ref())));
        }
        if let Some(ref closure) = *self.timer_closure.borrow() {
            self.timer_id.set(Some(set_timeout(
                closure.as_ref().unchecked_ref(),
                self.fallback_ms,
            )));
        }
    }

    fn fire(&self, tick: WorkTick) {
        if !self.running.get() {
            return;
        }
        self.cancel_pending();
        // A tick that arrives while the callback is still running is dropped;
        // the next registration picks the work up.
        if let Ok(mut callback) = self.callback.try_borrow_mut() {
            callback(tick);
        }
        self.schedule();
    }
}

impl WorkLoop {
    /// Creates a `WorkLoop` that is **not yet running**, with the default
    /// timer fallback.
    pub fn new(callback: impl FnMut(WorkTick) + 'static) -> Self {
        Self::with_fallback(callback, DEFAULT_FALLBACK_MS)
    }

    /// Creates a `WorkLoop` whose timer fallback fires after `fallback_ms`.
    pub fn with_fallback(callback: impl FnMut(WorkTick) + 'static, fallback_ms: i32) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                frame_closure: RefCell::new(None),
                timer_closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                running: Cell::new(false),
                frame_id: Cell::new(None),
                timer_id: Cell::new(None),
                fallback_ms: fallback_ms.max(0),
            }),
        }
    }

    /// Starts requesting slices.
    ///
    /// If already running, this is a no-op.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.frame_closure.borrow().is_none() {
            let inner = Rc::clone(&self.inner);
            let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
                inner.frame_id.set(None);
                inner.fire(WorkTick {
                    now: host_time_from_millis(timestamp_ms),
                    kind: TickKind::AnimationFrame,
                });
            }) as Box<dyn FnMut(f64)>);
            *self.inner.frame_closure.borrow_mut() = Some(closure);
        }

        if self.inner.timer_closure.borrow().is_none() {
            let inner = Rc::clone(&self.inner);
            let closure = Closure::wrap(Box::new(move || {
                inner.timer_id.set(None);
                inner.fire(WorkTick {
                    now: host_time_from_millis(performance_now()),
                    kind: TickKind::Timeout,
                });
            }) as Box<dyn FnMut()>);
            *self.inner.timer_closure.borrow_mut() = Some(closure);
        }

        self.inner.schedule();
    }

    /// Stops the loop and cancels both pending registrations. Can be
    /// restarted by calling [`start`](Self::start) again.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        self.inner.cancel_pending();
    }

    /// Returns `true` if the loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl Drop for WorkLoop {
    fn drop(&mut self) {
        self.stop();
        // The closures hold an `Rc` to `inner`; drop them to break the cycle.
        self.inner.frame_closure.borrow_mut().take();
        self.inner.timer_closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for WorkLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkLoop")
            .field("running", &self.inner.running.get())
            .field("fallback_ms", &self.inner.fallback_ms)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_convert_to_microsecond_ticks() {
        assert_eq!(host_time_from_millis(16.5), HostTime(16_500));
        assert_eq!(host_time_from_millis(0.0), HostTime(0));
    }

    #[test]
    fn negative_timestamps_clamp_to_zero() {
        assert_eq!(host_time_from_millis(-3.0), HostTime(0));
    }

    #[test]
    fn fallback_waits_one_web_slice() {
        let fallback = host_time_from_millis(f64::from(DEFAULT_FALLBACK_MS));
        let slice = tendril_core::runtime::RuntimeConfig::web().slice_budget;
        assert_eq!(fallback.ticks(), slice.ticks());
    }
}
