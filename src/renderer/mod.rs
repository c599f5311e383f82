//! Renderer - The host tree the reconciler patches.
//!
//! The core never mutates a host tree directly. Every host effect goes
//! through [`HostRenderer`], the narrow set of DOM-style primitives the
//! reconciler needs:
//!
//! ```text
//! reconcile::render ──> HostRenderer ──> MemoryHost (tests, headless)
//!                                   └──> your DOM / native binding
//! ```
//!
//! Host operations are infallible from the core's point of view. A host that
//! is handed a node it does not know logs and ignores the call.

mod memory;
pub(crate) mod props;

pub use memory::{HostNode, HostNodeKind, MemoryHost, Mutation};

use crate::types::{HostNodeId, Listener};

/// Primitives for a retained host tree.
pub trait HostRenderer {
    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    fn create_element(&mut self, name: &str) -> HostNodeId;

    fn create_text(&mut self, text: &str) -> HostNodeId;

    /// Replace the payload of a text node in place.
    fn set_text(&mut self, node: HostNodeId, text: &str);

    // -------------------------------------------------------------------------
    // Attributes, properties, style
    // -------------------------------------------------------------------------

    fn set_attribute(&mut self, node: HostNodeId, name: &str, value: &str);

    fn remove_attribute(&mut self, node: HostNodeId, name: &str);

    fn has_attribute(&self, node: HostNodeId, name: &str) -> bool;

    /// Set a live property (`value`, `className`), distinct from attributes.
    fn set_property(&mut self, node: HostNodeId, name: &str, value: &str);

    fn set_style(&mut self, node: HostNodeId, property: &str, value: &str);

    fn remove_style(&mut self, node: HostNodeId, property: &str);

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Register `listener` for `event` (name without the `on` prefix).
    fn add_event_listener(&mut self, node: HostNodeId, event: &str, listener: &Listener);

    /// Unregister the listener previously added with the same `Rc`.
    fn remove_event_listener(&mut self, node: HostNodeId, event: &str, listener: &Listener);

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// Whether `node` is attached, transitively, to a live container.
    fn is_connected(&self, node: HostNodeId) -> bool;

    fn child_count(&self, parent: HostNodeId) -> usize;

    fn child_at(&self, parent: HostNodeId, index: usize) -> Option<HostNodeId>;

    /// Insert `node` before `reference`, moving it if already attached.
    fn insert_before(&mut self, parent: HostNodeId, node: HostNodeId, reference: HostNodeId);

    /// Append `node` as the last child, moving it if already attached.
    fn append_child(&mut self, parent: HostNodeId, node: HostNodeId);

    /// Detach `node` from its parent.
    fn remove(&mut self, node: HostNodeId);

    /// Put `new` where `old` is and detach `old`.
    fn replace_with(&mut self, old: HostNodeId, new: HostNodeId);

    /// The core holds no further reference to `node`.
    ///
    /// Hosts that own node storage may free it. Children still attached to
    /// `node` are orphaned, not freed; the core releases each node it drops.
    fn release(&mut self, _node: HostNodeId) {}
}
