//! Context graph - Provide/consume scoped by tree identity.
//!
//! A provider is registered under `(provider type, tree_id)`. Any component
//! linked into the same tree can reach it, however deep, without it being
//! passed down as props. Consumers subscribe; `ContextHandle::update()`
//! re-renders every subscriber.
//!
//! ```text
//! providers:  (Theme, tree#0) ──> entry { owner: c1, value }
//! consumers:  (Theme, tree#0) ──> { c4, c7 }
//! consumes:   c4 ──> { (Theme, tree#0) }
//! provides:   c1 ──> { (Theme, tree#0) }
//! ```
//!
//! Clearing the owner withdraws its providers (running `Provider::destroy`)
//! and drops their consumer sets; clearing a consumer leaves every set it
//! joined.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use crate::engine::ComponentCell;
use crate::error::{EngineError, Result};
use crate::pipeline::Scheduler;
use crate::types::{ComponentId, TreeId};

/// A value shared down a tree through [`Scope::provide`](crate::Scope::provide).
///
/// Use interior mutability for state that changes, then call
/// [`ContextHandle::update`] to re-render consumers.
pub trait Provider: 'static {
    /// Called once when the providing component is cleared.
    fn destroy(&self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ProviderKey {
    provider: TypeId,
    tree: TreeId,
}

impl ProviderKey {
    fn of<P: Provider>(tree: TreeId) -> Self {
        Self {
            provider: TypeId::of::<P>(),
            tree,
        }
    }
}

// =============================================================================
// Provided Values
// =============================================================================

struct ProvidedInner<P> {
    value: P,
    key: ProviderKey,
    graph: Weak<ContextGraph>,
    scheduler: Weak<Scheduler>,
}

trait ErasedProvider {
    fn destroy(&self);
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<P: Provider> ErasedProvider for ProvidedInner<P> {
    fn destroy(&self) {
        self.value.destroy();
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

struct ProviderEntry {
    owner: ComponentId,
    value: Rc<dyn ErasedProvider>,
}

/// Shared handle to a registered provider.
pub struct ContextHandle<P> {
    inner: Rc<ProvidedInner<P>>,
}

impl<P> Clone for ContextHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P> Deref for ContextHandle<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.inner.value
    }
}

impl<P: Provider> ContextHandle<P> {
    pub fn tree_id(&self) -> TreeId {
        self.inner.key.tree
    }

    /// Re-render every component subscribed to this provider.
    ///
    /// Returns how many were enqueued.
    pub fn update(&self) -> usize {
        let (Some(graph), Some(scheduler)) = (self.inner.graph.upgrade(), self.inner.scheduler.upgrade())
        else {
            return 0;
        };
        let consumers = graph.consumers(self.inner.key);
        for consumer in &consumers {
            scheduler.enqueue(consumer);
        }
        tracing::debug!(
            provider = type_name::<P>(),
            tree = %self.inner.key.tree,
            consumers = consumers.len(),
            "provider updated"
        );
        consumers.len()
    }

    /// Reach a sibling provider of the same tree without subscribing.
    pub fn link<Q: Provider>(&self) -> Result<ContextHandle<Q>> {
        let graph = self
            .inner
            .graph
            .upgrade()
            .ok_or_else(|| EngineError::context("context graph has been dropped"))?;
        graph.lookup::<Q>(self.inner.key.tree)
    }

    pub fn consumer_count(&self) -> usize {
        self.inner
            .graph
            .upgrade()
            .map_or(0, |g| g.consumers(self.inner.key).len())
    }

    pub fn ptr_eq(&self, other: &ContextHandle<P>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P: fmt::Debug> fmt::Debug for ContextHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("tree", &self.inner.key.tree)
            .field("value", &self.inner.value)
            .finish()
    }
}

// =============================================================================
// Context Graph
// =============================================================================

#[derive(Default)]
pub struct ContextGraph {
    providers: RefCell<HashMap<ProviderKey, ProviderEntry>>,
    consumers: RefCell<HashMap<ProviderKey, BTreeMap<ComponentId, Weak<ComponentCell>>>>,
    consumes: RefCell<HashMap<ComponentId, HashSet<ProviderKey>>>,
    provides: RefCell<HashMap<ComponentId, HashSet<ProviderKey>>>,
}

impl ContextGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` as the `P` provider of `tree`, owned by `owner`.
    ///
    /// Replaces any provider of the same type already registered in the
    /// tree; existing subscribers stay subscribed.
    pub(crate) fn provide<P: Provider>(
        self: &Rc<Self>,
        owner: &ComponentCell,
        tree: TreeId,
        value: P,
        scheduler: &Rc<Scheduler>,
    ) -> ContextHandle<P> {
        let key = ProviderKey::of::<P>(tree);
        let inner = Rc::new(ProvidedInner {
            value,
            key,
            graph: Rc::downgrade(self),
            scheduler: Rc::downgrade(scheduler),
        });

        let previous = self.providers.borrow_mut().insert(
            key,
            ProviderEntry {
                owner: owner.id(),
                value: inner.clone(),
            },
        );
        if let Some(previous) = previous {
            tracing::debug!(
                provider = type_name::<P>(),
                %tree,
                replaced = %previous.owner,
                "provider replaced"
            );
        }
        self.provides
            .borrow_mut()
            .entry(owner.id())
            .or_default()
            .insert(key);

        ContextHandle { inner }
    }

    /// Look up the `P` provider of `tree`.
    pub fn lookup<P: Provider>(&self, tree: TreeId) -> Result<ContextHandle<P>> {
        let value = self
            .providers
            .borrow()
            .get(&ProviderKey::of::<P>(tree))
            .map(|entry| Rc::clone(&entry.value))
            .ok_or_else(|| EngineError::provider_missing(type_name::<P>(), tree))?;
        value
            .into_any()
            .downcast::<ProvidedInner<P>>()
            .map(|inner| ContextHandle { inner })
            .map_err(|_| EngineError::context(format!("provider slot for `{}` holds another type", type_name::<P>())))
    }

    /// Look up the `P` provider of `tree` and subscribe `consumer` to it.
    pub(crate) fn subscribe<P: Provider>(
        &self,
        tree: TreeId,
        consumer: &Rc<ComponentCell>,
    ) -> Result<ContextHandle<P>> {
        let handle = self.lookup::<P>(tree)?;
        let key = handle.inner.key;
        self.consumers
            .borrow_mut()
            .entry(key)
            .or_default()
            .insert(consumer.id(), Rc::downgrade(consumer));
        self.consumes
            .borrow_mut()
            .entry(consumer.id())
            .or_default()
            .insert(key);
        Ok(handle)
    }

    /// Live subscribers of `key`, in component creation order.
    fn consumers(&self, key: ProviderKey) -> Vec<Rc<ComponentCell>> {
        self.consumers
            .borrow()
            .get(&key)
            .map(|set| set.values().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    /// Remove `consumer` from every consumer set it joined.
    pub(crate) fn leave(&self, consumer: ComponentId) {
        let Some(keys) = self.consumes.borrow_mut().remove(&consumer) else {
            return;
        };
        let mut consumers = self.consumers.borrow_mut();
        for key in keys {
            if let Some(set) = consumers.get_mut(&key) {
                set.remove(&consumer);
            }
        }
    }

    /// Tear down every provider `owner` registered.
    pub(crate) fn withdraw(&self, owner: ComponentId) {
        let Some(keys) = self.provides.borrow_mut().remove(&owner) else {
            return;
        };
        for key in keys {
            let entry = self
                .providers
                .borrow()
                .get(&key)
                .filter(|e| e.owner == owner)
                .map(|e| Rc::clone(&e.value));
            let Some(value) = entry else {
                continue;
            };
            value.destroy();

            self.providers.borrow_mut().remove(&key);
            let dropped = self.consumers.borrow_mut().remove(&key).unwrap_or_default();
            let mut consumes = self.consumes.borrow_mut();
            for consumer in dropped.keys() {
                if let Some(keys) = consumes.get_mut(consumer) {
                    keys.remove(&key);
                }
            }
            tracing::debug!(%owner, tree = %key.tree, "provider withdrawn");
        }
    }

    /// Whether a `P` provider is registered for `tree`.
    pub fn is_provided<P: Provider>(&self, tree: TreeId) -> bool {
        self.providers
            .borrow()
            .contains_key(&ProviderKey::of::<P>(tree))
    }

    /// Number of components subscribed to the `P` provider of `tree`.
    pub fn consumer_count<P: Provider>(&self, tree: TreeId) -> usize {
        self.consumers
            .borrow()
            .get(&ProviderKey::of::<P>(tree))
            .map_or(0, BTreeMap::len)
    }

    pub fn provider_count(&self) -> usize {
        self.providers.borrow().len()
    }
}

impl fmt::Debug for ContextGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextGraph")
            .field("providers", &self.providers.borrow().len())
            .field("consumers", &self.consumes.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Node, Scope, Template};
    use crate::pipeline::MicrotaskQueue;
    use crate::primitives::tag;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Theme {
        dark: Cell<bool>,
        destroyed: Rc<Cell<bool>>,
    }

    impl Provider for Theme {
        fn destroy(&self) {
            self.destroyed.set(true);
        }
    }

    #[derive(Debug)]
    struct Locale;

    impl Provider for Locale {}

    fn blank(_scope: &mut Scope<'_>) -> Node {
        tag("div", ())
    }

    fn cell() -> Rc<ComponentCell> {
        Rc::new(ComponentCell::new(Template::new(blank), None))
    }

    fn setup() -> (Rc<ContextGraph>, Rc<Scheduler>, Rc<MicrotaskQueue>) {
        let tasks = Rc::new(MicrotaskQueue::new());
        let scheduler = Rc::new(Scheduler::new(tasks.clone()));
        (Rc::new(ContextGraph::new()), scheduler, tasks)
    }

    fn theme(destroyed: &Rc<Cell<bool>>) -> Theme {
        Theme {
            dark: Cell::new(false),
            destroyed: destroyed.clone(),
        }
    }

    #[test]
    fn test_lookup_is_scoped_by_tree() {
        let (graph, scheduler, _) = setup();
        let (tree, other) = (TreeId::next(), TreeId::next());
        let owner = cell();
        graph.provide(&owner, tree, theme(&Rc::default()), &scheduler);

        assert!(graph.lookup::<Theme>(tree).is_ok());
        assert!(graph.lookup::<Theme>(other).unwrap_err().is_context());
        assert!(graph.lookup::<Locale>(tree).unwrap_err().is_context());
    }

    #[test]
    fn test_update_enqueues_consumers() {
        let (graph, scheduler, _) = setup();
        let tree = TreeId::next();
        let owner = cell();
        let handle = graph.provide(&owner, tree, theme(&Rc::default()), &scheduler);
        let (a, b) = (cell(), cell());
        graph.subscribe::<Theme>(tree, &a).unwrap();
        graph.subscribe::<Theme>(tree, &b).unwrap();

        handle.dark.set(true);
        assert_eq!(handle.update(), 2);
        assert!(scheduler.is_queued(a.id()));
        assert!(scheduler.is_queued(b.id()));
        assert!(!scheduler.is_queued(owner.id()));
    }

    #[test]
    fn test_withdraw_destroys_and_drops_consumers() {
        let (graph, scheduler, _) = setup();
        let tree = TreeId::next();
        let destroyed = Rc::new(Cell::new(false));
        let owner = cell();
        graph.provide(&owner, tree, theme(&destroyed), &scheduler);
        let consumer = cell();
        graph.subscribe::<Theme>(tree, &consumer).unwrap();

        graph.withdraw(owner.id());

        assert!(destroyed.get());
        assert!(!graph.is_provided::<Theme>(tree));
        assert_eq!(graph.consumer_count::<Theme>(tree), 0);
        assert!(graph.subscribe::<Theme>(tree, &consumer).unwrap_err().is_context());
    }

    #[test]
    fn test_leave_stops_updates() {
        let (graph, scheduler, _) = setup();
        let tree = TreeId::next();
        let owner = cell();
        let handle = graph.provide(&owner, tree, theme(&Rc::default()), &scheduler);
        let consumer = cell();
        graph.subscribe::<Theme>(tree, &consumer).unwrap();

        graph.leave(consumer.id());
        assert_eq!(handle.update(), 0);
        assert!(!scheduler.is_queued(consumer.id()));
    }

    #[test]
    fn test_handle_link_reaches_sibling_provider() {
        let (graph, scheduler, _) = setup();
        let tree = TreeId::next();
        let owner = cell();
        let theme_handle = graph.provide(&owner, tree, theme(&Rc::default()), &scheduler);
        graph.provide(&owner, tree, Locale, &scheduler);

        assert!(theme_handle.link::<Locale>().is_ok());
        assert_eq!(theme_handle.consumer_count(), 0);
    }

    #[test]
    fn test_replaced_provider_survives_old_owner_withdraw() {
        let (graph, scheduler, _) = setup();
        let tree = TreeId::next();
        let (first, second) = (cell(), cell());
        graph.provide(&first, tree, Locale, &scheduler);
        graph.provide(&second, tree, Locale, &scheduler);

        graph.withdraw(first.id());
        assert!(graph.is_provided::<Locale>(tree));
    }
}
