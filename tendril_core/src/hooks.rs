// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional per-component state.
//!
//! A component body receives a [`Hooks`] context. Every `use_*` call claims
//! the next cell in the fiber's hook list; identity is the call position, so
//! a component must make the same sequence of hook calls, of the same kinds,
//! on every render. A differing sequence is a contract violation and panics
//! with a `hook order violation` message. Hooks are only reachable through
//! the context, so calling one outside a component body does not compile.
//!
//! Cells from the previous render are read from the fiber's `alternate`:
//!
//! - **state**: value from the previous cell with its pending transitions
//!   replayed in order; the [`Setter`] queues transitions and raises the
//!   runtime's update signal.
//! - **effect**: recorded now, decided at commit; see
//!   [`Runtime`](crate::runtime::Runtime) for when bodies and cleanups run.
//! - **memo** / **callback**: reuse the stored value unless the dependency
//!   list changed; a missing list follows [`HookConfig`].
//! - **ref**: the same mutable box on every render.
//!
//! Dependency lists are compared element-wise with [`Value`]'s identity-like
//! equality; a length change counts as changed.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

use crate::fiber::FiberId;
use crate::props::Value;

/// A hook dependency list.
pub type Deps = SmallVec<[Value; 4]>;

/// Builds an optional dependency list for the `use_*` hooks.
///
/// `deps![a, b]` expands to `Some(Deps)` holding `Value::from(a)` and
/// `Value::from(b)`; `deps![]` is an empty list (run/compute once). Pass
/// `None` instead to omit the list.
#[macro_export]
macro_rules! deps {
    () => {
        ::core::option::Option::Some($crate::hooks::Deps::new())
    };
    ($($dep:expr),+ $(,)?) => {
        ::core::option::Option::Some(
            <$crate::hooks::Deps as ::core::iter::FromIterator<$crate::props::Value>>::from_iter([
                $($crate::props::Value::from($dep)),+
            ]),
        )
    };
}

// -- Configuration --

/// What memo-like hooks do when called without a dependency list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MissingDeps {
    /// Recompute on every render.
    #[default]
    AlwaysRecompute,
    /// Compute once and keep the value for the fiber's lifetime.
    MemoizeForever,
}

/// Hook behaviour knobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HookConfig {
    /// Policy for [`Hooks::use_memo`] without deps.
    pub memo_missing_deps: MissingDeps,
    /// Policy for [`Hooks::use_callback`] without deps.
    pub callback_missing_deps: MissingDeps,
}

impl HookConfig {
    /// Recompute memo and callback values whenever deps are omitted.
    pub const DEFAULT: Self = Self {
        memo_missing_deps: MissingDeps::AlwaysRecompute,
        callback_missing_deps: MissingDeps::AlwaysRecompute,
    };
}

// -- Cells --

/// The kind of a hook cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// [`Hooks::use_state`].
    State,
    /// [`Hooks::use_effect`].
    Effect,
    /// [`Hooks::use_memo`].
    Memo,
    /// [`Hooks::use_callback`].
    Callback,
    /// [`Hooks::use_ref`].
    Ref,
}

/// A function returned by an effect body, run before the body re-runs and
/// when the fiber is deleted.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    /// Wraps a cleanup function.
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self(Box::new(cleanup))
    }

    pub(crate) fn run(self) {
        (self.0)();
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

/// Effect body return values: nothing, a [`Cleanup`], or an optional one.
pub trait IntoCleanup {
    /// Converts into an optional cleanup.
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

type EffectBody = Box<dyn FnOnce() -> Option<Cleanup>>;

pub(crate) struct EffectCell {
    pub(crate) body: Option<EffectBody>,
    pub(crate) deps: Option<Deps>,
    pub(crate) cleanup: Option<Cleanup>,
}

pub(crate) struct MemoCell {
    value: Rc<dyn Any>,
    deps: Option<Deps>,
}

pub(crate) struct StateCell {
    value: Rc<dyn Any>,
    queue: Rc<dyn Any>,
}

/// One recorded hook call.
pub(crate) enum HookCell {
    State(StateCell),
    Effect(EffectCell),
    Memo(MemoCell),
    Callback(MemoCell),
    Ref(Rc<dyn Any>),
}

impl HookCell {
    pub(crate) fn kind(&self) -> HookKind {
        match self {
            Self::State(_) => HookKind::State,
            Self::Effect(_) => HookKind::Effect,
            Self::Memo(_) => HookKind::Memo,
            Self::Callback(_) => HookKind::Callback,
            Self::Ref(_) => HookKind::Ref,
        }
    }

    /// Takes the pending cleanup of an effect cell.
    pub(crate) fn take_cleanup(&mut self) -> Option<Cleanup> {
        match self {
            Self::Effect(cell) => cell.cleanup.take(),
            _ => None,
        }
    }
}

/// Returns `true` if an effect with `next` deps must run given the previous
/// render's `prev` deps. A missing list on either side always runs.
pub(crate) fn deps_changed(next: Option<&[Value]>, prev: Option<&[Value]>) -> bool {
    match (next, prev) {
        (Some(next), Some(prev)) => {
            next.len() != prev.len() || next.iter().zip(prev).any(|(a, b)| a != b)
        }
        _ => true,
    }
}

fn should_recompute(policy: MissingDeps, next: Option<&[Value]>, prev: Option<&[Value]>) -> bool {
    match next {
        None => policy == MissingDeps::AlwaysRecompute,
        Some(_) => deps_changed(next, prev),
    }
}

// -- Update signalling --

/// Shared flag a setter raises to ask the runtime for a re-render.
#[derive(Clone, Debug, Default)]
pub(crate) struct UpdateSignal(Rc<Cell<bool>>);

impl UpdateSignal {
    pub(crate) fn request(&self) {
        self.0.set(true);
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.0.get()
    }

    pub(crate) fn clear(&self) {
        self.0.set(false);
    }
}

type Transition<T> = Rc<dyn Fn(&T) -> T>;

struct StateQueue<T> {
    transitions: RefCell<Vec<Transition<T>>>,
}

impl<T> StateQueue<T> {
    fn new() -> Self {
        Self {
            transitions: RefCell::new(Vec::new()),
        }
    }
}

/// Queues state transitions for one state cell.
///
/// Calling the setter never re-renders synchronously: the transition is
/// queued on the cell it came from and the runtime restarts work from the
/// committed tree on its next slice, discarding any in-flight render.
pub struct Setter<T> {
    queue: Rc<StateQueue<T>>,
    updates: UpdateSignal,
}

impl<T: 'static> Setter<T> {
    /// Queues a transition computed from the latest state.
    pub fn update(&self, transition: impl Fn(&T) -> T + 'static) {
        self.queue.transitions.borrow_mut().push(Rc::new(transition));
        self.updates.request();
    }

    /// Queues a replacement value.
    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        self.update(move |_| value.clone());
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
            updates: self.updates.clone(),
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("pending", &self.queue.transitions.borrow().len())
            .finish_non_exhaustive()
    }
}

/// A mutable box that persists across renders.
pub struct Ref<T>(Rc<RefCell<Option<T>>>);

impl<T> Ref<T> {
    /// A copy of the current contents.
    #[must_use]
    pub fn current(&self) -> Option<T>
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }

    /// Replaces the contents, returning the old value.
    pub fn set(&self, value: Option<T>) -> Option<T> {
        self.0.replace(value)
    }

    /// Runs `f` with mutable access to the contents.
    pub fn with<R>(&self, f: impl FnOnce(&mut Option<T>) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Returns `true` if both handles share one box.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({:p})", Rc::as_ptr(&self.0))
    }
}

// -- Context --

/// Hook context for one render of one component fiber.
pub struct Hooks<'a> {
    fiber: FiberId,
    component: &'static str,
    previous: Option<&'a [HookCell]>,
    cells: Vec<HookCell>,
    updates: &'a UpdateSignal,
    config: &'a HookConfig,
}

impl fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("fiber", &self.fiber)
            .field("component", &self.component)
            .field("called", &self.cells.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(
        fiber: FiberId,
        component: &'static str,
        previous: Option<&'a [HookCell]>,
        updates: &'a UpdateSignal,
        config: &'a HookConfig,
    ) -> Self {
        Self {
            fiber,
            component,
            previous,
            cells: Vec::new(),
            updates,
            config,
        }
    }

    /// The fiber being rendered.
    #[must_use]
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// The component's diagnostic name.
    #[must_use]
    pub fn component_name(&self) -> &'static str {
        self.component
    }

    /// Returns the previous render's cell at the current position, checking
    /// that it has the same kind.
    fn previous(&self, kind: HookKind) -> Option<&'a HookCell> {
        let previous = self.previous?;
        let index = self.cells.len();
        match previous.get(index) {
            Some(cell) if cell.kind() == kind => Some(cell),
            Some(cell) => panic!(
                "hook order violation: `{}` called {kind:?} as hook #{index}, \
                 but the previous render recorded {:?} there",
                self.component,
                cell.kind()
            ),
            None => panic!(
                "hook order violation: `{}` called more hooks than the previous render ({})",
                self.component,
                previous.len()
            ),
        }
    }

    fn type_changed(&self) -> ! {
        panic!(
            "hook order violation: `{}` hook #{} changed its value type",
            self.component,
            self.cells.len()
        )
    }

    /// Ends the render and returns the recorded cells.
    pub(crate) fn finish(self) -> Vec<HookCell> {
        if let Some(previous) = self.previous {
            assert!(
                previous.len() == self.cells.len(),
                "hook order violation: `{}` called {} hooks, but the previous render called {}",
                self.component,
                self.cells.len(),
                previous.len()
            );
        }
        self.cells
    }

    /// Local state. Returns the current value and a setter.
    ///
    /// On the first render the value is `initial`; afterwards it is the
    /// previous value with every transition queued since then applied in
    /// order.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
        let value = match self.previous(HookKind::State) {
            Some(HookCell::State(prev)) => {
                let Some(base) = prev.value.downcast_ref::<T>() else {
                    self.type_changed()
                };
                let Ok(queue) = Rc::clone(&prev.queue).downcast::<StateQueue<T>>() else {
                    self.type_changed()
                };
                let pending: Vec<Transition<T>> = queue.transitions.borrow().clone();
                pending.iter().fold(base.clone(), |state, transition| transition(&state))
            }
            _ => initial,
        };

        let queue = Rc::new(StateQueue::<T>::new());
        self.cells.push(HookCell::State(StateCell {
            value: Rc::new(value.clone()),
            queue: Rc::clone(&queue) as Rc<dyn Any>,
        }));
        let setter = Setter {
            queue,
            updates: self.updates.clone(),
        };
        (value, setter)
    }

    /// Registers a side effect to run after commit.
    ///
    /// The body runs after the first commit of this fiber, and after later
    /// commits when `deps` is `None` or differs from the previous render's
    /// list. Before a re-run, the previous run's cleanup is invoked; when the
    /// fiber is deleted the latest cleanup is invoked and the body is not run.
    pub fn use_effect<F, R>(&mut self, body: F, deps: Option<Deps>)
    where
        F: FnOnce() -> R + 'static,
        R: IntoCleanup,
    {
        let _ = self.previous(HookKind::Effect);
        self.cells.push(HookCell::Effect(EffectCell {
            body: Some(Box::new(move || body().into_cleanup())),
            deps,
            cleanup: None,
        }));
    }

    /// A value recomputed only when `deps` change.
    pub fn use_memo<T: Clone + 'static>(
        &mut self,
        compute: impl FnOnce() -> T,
        deps: Option<Deps>,
    ) -> T {
        let policy = self.config.memo_missing_deps;
        let reused = match self.previous(HookKind::Memo) {
            Some(HookCell::Memo(prev)) => self.reuse(prev, policy, deps.as_deref()),
            _ => None,
        };
        let value = reused.unwrap_or_else(|| Rc::new(compute()) as Rc<dyn Any>);
        let Some(out) = value.downcast_ref::<T>().cloned() else {
            self.type_changed()
        };
        self.cells.push(HookCell::Memo(MemoCell { value, deps }));
        out
    }

    /// A stored value (typically a handler) replaced only when `deps`
    /// change, so its identity is stable across renders otherwise.
    pub fn use_callback<C: Clone + 'static>(&mut self, callback: C, deps: Option<Deps>) -> C {
        let policy = self.config.callback_missing_deps;
        let reused = match self.previous(HookKind::Callback) {
            Some(HookCell::Callback(prev)) => self.reuse(prev, policy, deps.as_deref()),
            _ => None,
        };
        let value = reused.unwrap_or_else(|| Rc::new(callback) as Rc<dyn Any>);
        let Some(out) = value.downcast_ref::<C>().cloned() else {
            self.type_changed()
        };
        self.cells.push(HookCell::Callback(MemoCell { value, deps }));
        out
    }

    fn reuse(
        &self,
        prev: &MemoCell,
        policy: MissingDeps,
        deps: Option<&[Value]>,
    ) -> Option<Rc<dyn Any>> {
        (!should_recompute(policy, deps, prev.deps.as_deref())).then(|| Rc::clone(&prev.value))
    }

    /// A mutable box that is the same object on every render. `initial` is
    /// only used on the first render.
    pub fn use_ref<T: 'static>(&mut self, initial: Option<T>) -> Ref<T> {
        let cell = match self.previous(HookKind::Ref) {
            Some(HookCell::Ref(prev)) => match Rc::clone(prev).downcast::<RefCell<Option<T>>>() {
                Ok(cell) => cell,
                Err(_) => self.type_changed(),
            },
            _ => Rc::new(RefCell::new(initial)),
        };
        self.cells.push(HookCell::Ref(Rc::clone(&cell) as Rc<dyn Any>));
        Ref(cell)
    }
}

// ----- Tests -----

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;
    use crate::props::EventHandler;

    const FIBER: FiberId = FiberId {
        idx: 0,
        generation: 0,
    };

    fn render<R>(
        previous: Option<&[HookCell]>,
        signal: &UpdateSignal,
        config: &HookConfig,
        body: impl FnOnce(&mut Hooks<'_>) -> R,
    ) -> (R, Vec<HookCell>) {
        let mut hooks = Hooks::new(FIBER, "Test", previous, signal, config);
        let out = body(&mut hooks);
        (out, hooks.finish())
    }

    #[test]
    fn state_replays_queued_transitions() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let ((count, set), first) = render(None, &signal, &config, |h| h.use_state(0_i32));
        assert_eq!(count, 0);
        assert!(!signal.is_requested());

        set.update(|c| c + 1);
        set.update(|c| c * 10);
        assert!(signal.is_requested());

        let ((count, _), second) = render(Some(&first), &signal, &config, |h| h.use_state(0_i32));
        assert_eq!(count, 10);

        // The old queue is not drained; re-rendering from the same alternate
        // replays it again.
        let ((again, _), _) = render(Some(&first), &signal, &config, |h| h.use_state(0_i32));
        assert_eq!(again, 10);

        // The new cell starts with an empty queue.
        let ((settled, _), _) = render(Some(&second), &signal, &config, |h| h.use_state(0_i32));
        assert_eq!(settled, 10);
    }

    #[test]
    fn set_replaces_value() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let ((_, set), first) = render(None, &signal, &config, |h| h.use_state(5_u8));
        set.set(9);
        let ((value, _), _) = render(Some(&first), &signal, &config, |h| h.use_state(5_u8));
        assert_eq!(value, 9);
    }

    #[test]
    fn memo_respects_deps() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let calls = Rc::new(Cell::new(0));
        let memo = |h: &mut Hooks<'_>, dep: i32| {
            let calls = Rc::clone(&calls);
            h.use_memo(
                move || {
                    calls.set(calls.get() + 1);
                    dep * 2
                },
                deps![dep],
            )
        };

        let (v, first) = render(None, &signal, &config, |h| memo(h, 1));
        assert_eq!((v, calls.get()), (2, 1));
        let (v, second) = render(Some(&first), &signal, &config, |h| memo(h, 1));
        assert_eq!((v, calls.get()), (2, 1));
        let (v, _) = render(Some(&second), &signal, &config, |h| memo(h, 4));
        assert_eq!((v, calls.get()), (8, 2));
    }

    #[test]
    fn memo_without_deps_follows_policy() {
        let signal = UpdateSignal::default();
        let mut config = HookConfig::DEFAULT;
        let counter = Rc::new(Cell::new(0));
        let next = |h: &mut Hooks<'_>| {
            let counter = Rc::clone(&counter);
            h.use_memo(
                move || {
                    counter.set(counter.get() + 1);
                    counter.get()
                },
                None,
            )
        };

        let (_, first) = render(None, &signal, &config, next);
        let (v, _) = render(Some(&first), &signal, &config, next);
        assert_eq!(v, 2, "omitted deps recompute by default");

        config.memo_missing_deps = MissingDeps::MemoizeForever;
        let (_, first) = render(None, &signal, &config, next);
        let (v, _) = render(Some(&first), &signal, &config, next);
        assert_eq!(v, 3, "memoize-forever keeps the first value");
    }

    #[test]
    fn callback_identity_is_stable_with_same_deps() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let make =
            |h: &mut Hooks<'_>, dep: i32| h.use_callback(EventHandler::new(|_| {}), deps![dep]);

        let (a, first) = render(None, &signal, &config, |h| make(h, 1));
        let (b, second) = render(Some(&first), &signal, &config, |h| make(h, 1));
        assert!(a.ptr_eq(&b));
        let (c, _) = render(Some(&second), &signal, &config, |h| make(h, 2));
        assert!(!b.ptr_eq(&c));
    }

    #[test]
    fn callback_without_deps_follows_policy() {
        let signal = UpdateSignal::default();
        let mut config = HookConfig::DEFAULT;
        let make = |h: &mut Hooks<'_>| h.use_callback(EventHandler::new(|_| {}), None);

        let (a, first) = render(None, &signal, &config, make);
        let (b, _) = render(Some(&first), &signal, &config, make);
        assert!(!a.ptr_eq(&b), "omitted deps hand out a fresh handler by default");

        config.callback_missing_deps = MissingDeps::MemoizeForever;
        let (a, first) = render(None, &signal, &config, make);
        let (b, second) = render(Some(&first), &signal, &config, make);
        let (c, _) = render(Some(&second), &signal, &config, make);
        assert!(a.ptr_eq(&b), "memoize-forever keeps the first handler");
        assert!(b.ptr_eq(&c));
    }

    #[test]
    fn ref_box_persists() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let (r1, first) = render(None, &signal, &config, |h| h.use_ref::<i32>(None));
        assert_eq!(r1.current(), None);
        r1.set(Some(3));
        let (r2, _) = render(Some(&first), &signal, &config, |h| h.use_ref(Some(100)));
        assert!(r1.ptr_eq(&r2));
        assert_eq!(r2.current(), Some(3));
    }

    #[test]
    fn deps_comparison() {
        let a: Deps = [Value::Int(1), Value::from("x")].into_iter().collect();
        let b: Deps = [Value::Int(1), Value::from("x")].into_iter().collect();
        let shorter: Deps = [Value::Int(1)].into_iter().collect();
        assert!(!deps_changed(Some(&a), Some(&b)));
        assert!(deps_changed(Some(&a), Some(&shorter)));
        assert!(deps_changed(None, Some(&a)));
        assert!(deps_changed(Some(&a), None));
        assert!(deps_changed(None, None));
    }

    #[test]
    fn deps_macro_builds_lists() {
        let empty: Option<Deps> = deps![];
        assert_eq!(empty.map(|d| d.len()), Some(0));
        let two = deps![1_i32, "a"];
        assert_eq!(two.as_deref(), Some(&[Value::Int(1), Value::from("a")][..]));
    }

    #[test]
    #[should_panic(expected = "hook order violation")]
    fn kind_mismatch_panics() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let (_, first) = render(None, &signal, &config, |h| {
            h.use_state(0_i32);
        });
        let _ = render(Some(&first), &signal, &config, |h| {
            h.use_ref::<i32>(None);
        });
    }

    #[test]
    #[should_panic(expected = "hook order violation")]
    fn fewer_hooks_panics() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let (_, first) = render(None, &signal, &config, |h| {
            h.use_state(0_i32);
            h.use_state(1_i32);
        });
        let _ = render(Some(&first), &signal, &config, |h| {
            h.use_state(0_i32);
        });
    }

    #[test]
    #[should_panic(expected = "hook order violation")]
    fn more_hooks_panics() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let (_, first) = render(None, &signal, &config, |_| {});
        let _ = render(Some(&first), &signal, &config, |h| {
            h.use_state(0_i32);
        });
    }

    #[test]
    #[should_panic(expected = "changed its value type")]
    fn state_type_change_panics() {
        let signal = UpdateSignal::default();
        let config = HookConfig::DEFAULT;
        let (_, first) = render(None, &signal, &config, |h| {
            h.use_state(0_i32);
        });
        let _ = render(Some(&first), &signal, &config, |h| {
            h.use_state(0_u64);
        });
    }
}
