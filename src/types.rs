//! Core types shared by every layer of the reconciler.
//!
//! Identifiers, node kinds, lifecycle flags and the small value types that
//! travel between the node model and the host renderer.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Identifiers
// =============================================================================

thread_local! {
    /// Counter for tree identities.
    static TREE_COUNTER: Cell<u64> = const { Cell::new(0) };

    /// Counter for component identities.
    static COMPONENT_COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// Identity of a render tree.
///
/// Assigned once per `Root` and stamped top-down on every linked node. Context
/// lookups are scoped by this value, not by lexical nesting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u64);

impl TreeId {
    /// Allocate a fresh tree identity.
    pub fn next() -> Self {
        TREE_COUNTER.with(|counter| {
            let id = counter.get();
            counter.set(id + 1);
            TreeId(id)
        })
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// Identity of a component instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Allocate a fresh component identity.
    pub fn next() -> Self {
        COMPONENT_COUNTER.with(|counter| {
            let id = counter.get();
            counter.set(id + 1);
            ComponentId(id)
        })
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Handle to a node owned by the host renderer.
///
/// The core never looks inside; it only hands these back to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNodeId(pub u64);

impl fmt::Display for HostNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

// =============================================================================
// Node Kind
// =============================================================================

/// Discriminant of the five node variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Fragment,
    Tag,
    Content,
    Component,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Fragment => "fragment",
            NodeKind::Tag => "tag",
            NodeKind::Content => "content",
            NodeKind::Component => "component",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Lifecycle Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Lifecycle flags carried by every node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const NONE = 0;
        /// Invalidated and waiting for the next scheduler flush.
        const NEEDS_REHYDRATE = 1 << 0;
        /// Tombstoned by `clear`; must never be revisited.
        const DELETED = 1 << 1;
    }
}

// =============================================================================
// Events
// =============================================================================

/// An event delivered by the host to a listener.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event name without the `on` prefix (e.g. "click").
    pub name: String,
    /// Host node the event was dispatched on.
    pub target: HostNodeId,
    /// Live value of the target, when the host has one (inputs).
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, target: HostNodeId) -> Self {
        Self {
            name: name.into(),
            target,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Event listener callback.
///
/// `Rc<dyn Fn>` so the same listener can be shared between the node that
/// declares it and the host that invokes it.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Wrap a closure as a [`Listener`].
pub fn listener(f: impl Fn(&Event) + 'static) -> Listener {
    Rc::new(f)
}

// =============================================================================
// Node Ref
// =============================================================================

/// Holder that receives the live host element of a `Tag` carrying a `ref` prop.
///
/// Set on attach, cleared on detach.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<RefCell<Option<HostNodeId>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The element currently held, if attached.
    pub fn get(&self) -> Option<HostNodeId> {
        *self.0.borrow()
    }

    pub(crate) fn set(&self, host: Option<HostNodeId>) {
        *self.0.borrow_mut() = host;
    }

    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.get()).finish()
    }
}
