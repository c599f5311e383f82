//! Hooks - Persistent per-component state addressed by call order.
//!
//! A template receives a [`Scope`] for the component being generated. Every
//! hook call claims the next slot of its family's [`Capacitor`], so the same
//! call sequence on every render yields the same slots.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{component, tag, Scope, Node};
//!
//! fn counter(scope: &mut Scope<'_>) -> spark_dom::Result<Node> {
//!     let count = scope.state(0)?;
//!     let click = count.clone();
//!     scope.effect(move || tracing::debug!("rendered"));
//!     Ok(tag("button", (
//!         spark_dom::props().on("click", move |_| click.update(|n| n + 1)),
//!         spark_dom::nodes![count.get().to_string()],
//!     )))
//! }
//! ```

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{EngineError, Result};
use crate::pipeline::{Runtime, Scheduler};
use crate::primitives::Cleanup;
use crate::state::{ContextHandle, Provider};
use crate::types::{ComponentId, TreeId};

use super::capacitor::Capacitor;
use super::component::ComponentCell;

/// Deferred effect body, optionally yielding a cleanup.
pub(crate) type Effect = Box<dyn FnOnce() -> Option<Cleanup>>;

type ErasedSlot = Rc<dyn Any>;

// =============================================================================
// Hook Slots
// =============================================================================

/// The five slot stores a component owns.
#[derive(Default)]
pub struct HookSlots {
    pub(crate) state: Capacitor<ErasedSlot>,
    pub(crate) memory: Capacitor<ErasedSlot>,
    pub(crate) effect: Capacitor<Effect>,
    pub(crate) clean_up: Capacitor<Cleanup>,
    pub(crate) provided: Capacitor<ErasedSlot>,
}

impl HookSlots {
    /// Point every read cursor back at the first slot.
    pub(crate) fn rewind(&mut self) {
        self.state.rewind();
        self.memory.rewind();
        self.provided.rewind();
    }

    /// Close the positional stores that received slots this pass.
    pub(crate) fn close(&mut self) {
        for store in [&mut self.state, &mut self.memory, &mut self.provided] {
            if !store.is_empty() {
                store.set_closed(true);
            }
        }
    }

    /// Drop every slot and reopen all stores.
    pub(crate) fn reset(&mut self) {
        self.state.reset();
        self.memory.reset();
        self.effect.reset();
        self.clean_up.reset();
        self.provided.reset();
    }
}

impl fmt::Debug for HookSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSlots")
            .field("state", &self.state.len())
            .field("memory", &self.memory.len())
            .field("effect", &self.effect.len())
            .field("clean_up", &self.clean_up.len())
            .field("provided", &self.provided.len())
            .finish()
    }
}

fn slot_mismatch<T>(family: &str) -> EngineError {
    EngineError::hook(format!(
        "{family} slot does not hold a `{}`; hook call order changed between renders",
        type_name::<T>()
    ))
}

// =============================================================================
// Scope
// =============================================================================

/// Execution context of the component currently being generated.
pub struct Scope<'a> {
    component: &'a Rc<ComponentCell>,
    runtime: &'a Runtime,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(component: &'a Rc<ComponentCell>, runtime: &'a Runtime) -> Self {
        Self { component, runtime }
    }

    pub fn component_id(&self) -> ComponentId {
        self.component.id()
    }

    pub fn tree_id(&self) -> Option<TreeId> {
        self.component.tree_id()
    }

    /// Claim the next slot of a positional store, creating it with `init`
    /// while the store is open.
    fn claim<T: 'static>(
        &self,
        family: &str,
        store: fn(&mut HookSlots) -> &mut Capacitor<ErasedSlot>,
        init: impl FnOnce() -> T,
    ) -> Result<Rc<RefCell<T>>> {
        let closed = store(&mut self.component.hooks.borrow_mut()).is_closed();
        if closed {
            let slot = Rc::clone(store(&mut self.component.hooks.borrow_mut()).get()?);
            return slot
                .downcast::<RefCell<T>>()
                .map_err(|_| slot_mismatch::<T>(family));
        }

        let value = Rc::new(RefCell::new(init()));
        store(&mut self.component.hooks.borrow_mut()).add(value.clone() as ErasedSlot);
        Ok(value)
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// Persistent value whose setter schedules a re-render.
    pub fn state<T: 'static>(&mut self, init: T) -> Result<State<T>> {
        self.state_with(|| init)
    }

    /// Like [`Scope::state`], computing the initial value only on first render.
    pub fn state_with<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Result<State<T>> {
        let value = self.claim("state", |h| &mut h.state, init)?;
        Ok(State {
            value,
            owner: Rc::downgrade(self.component),
            scheduler: Rc::downgrade(&self.runtime.scheduler),
        })
    }

    /// Persistent holder that does not trigger renders.
    pub fn memory<T: 'static>(&mut self, init: T) -> Result<Holder<T>> {
        let value = self.claim("memory", |h| &mut h.memory, || init)?;
        Ok(Holder { value })
    }

    /// Handle that re-renders this component on demand.
    pub fn updater(&mut self) -> Updater {
        Updater {
            owner: Rc::downgrade(self.component),
            scheduler: Rc::downgrade(&self.runtime.scheduler),
        }
    }

    // -------------------------------------------------------------------------
    // Effects
    // -------------------------------------------------------------------------

    /// Run `f` on the microtask after this render is committed.
    pub fn effect(&mut self, f: impl FnOnce() + 'static) {
        self.component.hooks.borrow_mut().effect.add(Box::new(move || {
            f();
            None
        }));
    }

    /// Like [`Scope::effect`]; the returned closure runs before the next
    /// generation of this component (and on unmount).
    pub fn effect_with_cleanup<C>(&mut self, f: impl FnOnce() -> C + 'static)
    where
        C: FnOnce() + 'static,
    {
        self.component
            .hooks
            .borrow_mut()
            .effect
            .add(Box::new(move || Some(Box::new(f()) as Cleanup)));
    }

    // -------------------------------------------------------------------------
    // Context
    // -------------------------------------------------------------------------

    fn require_tree(&self) -> Result<TreeId> {
        self.tree_id().ok_or_else(|| {
            EngineError::context(format!(
                "component {} is not linked into a tree",
                self.component.id()
            ))
        })
    }

    /// Register `P` for this tree on first render; later renders return the
    /// same handle.
    pub fn provide<P: Provider>(&mut self, init: impl FnOnce() -> P) -> Result<ContextHandle<P>> {
        let closed = self.component.hooks.borrow().provided.is_closed();
        if closed {
            let slot = Rc::clone(self.component.hooks.borrow_mut().provided.get()?);
            return slot
                .downcast::<ContextHandle<P>>()
                .map(|handle| (*handle).clone())
                .map_err(|_| slot_mismatch::<P>("provided"));
        }

        let tree = self.require_tree()?;
        let handle = self.runtime.contexts.provide(
            self.component,
            tree,
            init(),
            &self.runtime.scheduler,
        );
        self.component
            .hooks
            .borrow_mut()
            .provided
            .add(Rc::new(handle.clone()) as ErasedSlot);
        Ok(handle)
    }

    /// Subscribe to the `P` provider of this tree.
    ///
    /// Fails with a context error when none is registered.
    pub fn consume<P: Provider>(&mut self) -> Result<ContextHandle<P>> {
        let tree = self.require_tree()?;
        self.runtime.contexts.subscribe::<P>(tree, self.component)
    }

    /// Look up the `P` provider of this tree without subscribing.
    pub fn link<P: Provider>(&self) -> Result<ContextHandle<P>> {
        let tree = self.require_tree()?;
        self.runtime.contexts.lookup::<P>(tree)
    }
}

// =============================================================================
// Hook Handles
// =============================================================================

fn schedule(owner: &Weak<ComponentCell>, scheduler: &Weak<Scheduler>) {
    if let (Some(owner), Some(scheduler)) = (owner.upgrade(), scheduler.upgrade()) {
        scheduler.enqueue(&owner);
    }
}

/// State slot handle returned by [`Scope::state`].
pub struct State<T> {
    value: Rc<RefCell<T>>,
    owner: Weak<ComponentCell>,
    scheduler: Weak<Scheduler>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            owner: Weak::clone(&self.owner),
            scheduler: Weak::clone(&self.scheduler),
        }
    }
}

impl<T: 'static> State<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Store `value` and schedule a re-render, unless it equals the current
    /// value.
    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        if *self.value.borrow() == value {
            return;
        }
        *self.value.borrow_mut() = value;
        schedule(&self.owner, &self.scheduler);
    }

    /// Functional form of [`State::set`].
    pub fn update(&self, f: impl FnOnce(&T) -> T)
    where
        T: PartialEq,
    {
        let next = f(&self.value.borrow());
        self.set(next);
    }

    /// Mutate in place. Always schedules.
    pub fn mutate(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        schedule(&self.owner, &self.scheduler);
    }

    pub fn ptr_eq(&self, other: &State<T>) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("State").field(&self.value.borrow()).finish()
    }
}

/// Memory slot handle returned by [`Scope::memory`].
pub struct Holder<T> {
    value: Rc<RefCell<T>>,
}

impl<T> Clone for Holder<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
        }
    }
}

impl<T> Holder<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value.borrow_mut())
    }

    pub fn ptr_eq(&self, other: &Holder<T>) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Holder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Holder").field(&self.value.borrow()).finish()
    }
}

/// Forces a re-render of the component that created it.
#[derive(Clone)]
pub struct Updater {
    owner: Weak<ComponentCell>,
    scheduler: Weak<Scheduler>,
}

impl Updater {
    pub fn trigger(&self) {
        schedule(&self.owner, &self.scheduler);
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("alive", &(self.owner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::component::Template;
    use crate::primitives::tag;
    use crate::engine::node::Node;
    use crate::types::NodeFlags;

    fn blank(_scope: &mut Scope<'_>) -> Node {
        tag("div", ())
    }

    fn cell() -> Rc<ComponentCell> {
        Rc::new(ComponentCell::new(Template::new(blank), None))
    }

    /// Simulate one generation pass: rewind, run `body`, close.
    fn pass<R>(cell: &Rc<ComponentCell>, runtime: &Runtime, body: impl FnOnce(&mut Scope<'_>) -> R) -> R {
        cell.hooks.borrow_mut().rewind();
        let mut scope = Scope::new(cell, runtime);
        let out = body(&mut scope);
        cell.hooks.borrow_mut().close();
        out
    }

    #[test]
    fn test_state_slots_persist_across_passes() {
        let runtime = Runtime::new(EngineConfig::default());
        let cell = cell();

        let first = pass(&cell, &runtime, |s| s.state(1).unwrap());
        first.set(5);
        let second = pass(&cell, &runtime, |s| s.state(1).unwrap());

        assert!(first.ptr_eq(&second));
        assert_eq!(second.get(), 5);
        assert_eq!(cell.state_slots(), 1);
    }

    #[test]
    fn test_set_equal_value_does_not_schedule() {
        let runtime = Runtime::new(EngineConfig::default());
        let cell = cell();
        let count = pass(&cell, &runtime, |s| s.state(3).unwrap());

        count.set(3);
        assert!(!runtime.scheduler.is_queued(cell.id()));

        count.set(4);
        assert!(runtime.scheduler.is_queued(cell.id()));
        assert!(cell.meta.borrow().flags.contains(NodeFlags::NEEDS_REHYDRATE));
    }

    #[test]
    fn test_mutate_always_schedules() {
        let runtime = Runtime::new(EngineConfig::default());
        let cell = cell();
        let items = pass(&cell, &runtime, |s| s.state(Vec::<i32>::new()).unwrap());
        items.mutate(|v| v.push(1));
        assert!(runtime.scheduler.is_queued(cell.id()));
        assert_eq!(items.with(|v| v.len()), 1);
    }

    #[test]
    fn test_swapped_state_types_fail_as_hook_error() {
        let runtime = Runtime::new(EngineConfig::default());
        let cell = cell();
        pass(&cell, &runtime, |s| {
            s.state(0i32).unwrap();
            s.state(String::new()).unwrap();
        });
        let err = pass(&cell, &runtime, |s| s.state(String::new()).unwrap_err());
        assert!(err.is_hook());
    }

    #[test]
    fn test_memory_does_not_schedule() {
        let runtime = Runtime::new(EngineConfig::default());
        let cell = cell();
        let memo = pass(&cell, &runtime, |s| s.memory(0u32).unwrap());
        memo.set(9);
        assert!(!runtime.scheduler.is_queued(cell.id()));

        let again = pass(&cell, &runtime, |s| s.memory(0u32).unwrap());
        assert_eq!(again.get(), 9);
    }

    #[test]
    fn test_updater_enqueues_owner() {
        let runtime = Runtime::new(EngineConfig::default());
        let cell = cell();
        let updater = pass(&cell, &runtime, |s| s.updater());
        updater.trigger();
        assert!(runtime.scheduler.is_queued(cell.id()));
    }

    #[test]
    fn test_effects_accumulate_per_pass() {
        let runtime = Runtime::new(EngineConfig::default());
        let cell = cell();
        pass(&cell, &runtime, |s| {
            s.effect(|| {});
            s.effect_with_cleanup(|| || {});
        });
        assert_eq!(cell.hooks.borrow().effect.len(), 2);
    }

    #[test]
    fn test_provide_without_tree_is_context_error() {
        #[derive(Debug)]
        struct Theme;
        impl Provider for Theme {}

        let runtime = Runtime::new(EngineConfig::default());
        let cell = cell();
        let err = pass(&cell, &runtime, |s| s.provide(|| Theme).unwrap_err());
        assert!(err.is_context());
    }
}
