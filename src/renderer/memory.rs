//! MemoryHost - Retained in-memory host tree.
//!
//! Implements [`HostRenderer`] over a flat node table. Every mutation is also
//! appended to a journal so callers can assert exactly what a render did:
//!
//! ```ignore
//! let mut host = MemoryHost::new();
//! let container = host.create_container();
//! // ... render, then:
//! host.clear_journal();
//! // ... re-render an identical tree:
//! assert!(host.journal().is_empty());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::rc::Rc;

use crate::error::{EngineError, Result};
use crate::types::{Event, HostNodeId, Listener};

use super::HostRenderer;

// =============================================================================
// Host Nodes
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostNodeKind {
    /// Live mount point. Anything under a container is connected.
    Container,
    Element { name: String },
    Text { text: String },
}

pub struct HostNode {
    pub kind: HostNodeKind,
    pub parent: Option<HostNodeId>,
    pub children: Vec<HostNodeId>,
    pub attributes: BTreeMap<String, String>,
    pub properties: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    listeners: Vec<(String, Listener)>,
}

impl HostNode {
    fn new(kind: HostNodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            style: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            HostNodeKind::Element { name } => Some(name),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            HostNodeKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.iter().filter(|(e, _)| e == event).count()
    }
}

/// One recorded host mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { node: HostNodeId, name: String },
    CreateText { node: HostNodeId, text: String },
    SetText { node: HostNodeId, text: String },
    SetAttribute { node: HostNodeId, name: String, value: String },
    RemoveAttribute { node: HostNodeId, name: String },
    SetProperty { node: HostNodeId, name: String, value: String },
    SetStyle { node: HostNodeId, property: String, value: String },
    RemoveStyle { node: HostNodeId, property: String },
    AddListener { node: HostNodeId, event: String },
    RemoveListener { node: HostNodeId, event: String },
    InsertBefore { parent: HostNodeId, node: HostNodeId, reference: HostNodeId },
    AppendChild { parent: HostNodeId, node: HostNodeId },
    Remove { node: HostNodeId },
    ReplaceWith { old: HostNodeId, new: HostNodeId },
}

// =============================================================================
// MemoryHost
// =============================================================================

#[derive(Default)]
pub struct MemoryHost {
    nodes: HashMap<HostNodeId, HostNode>,
    next_id: u64,
    journal: Vec<Mutation>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: HostNodeKind) -> HostNodeId {
        let id = HostNodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, HostNode::new(kind));
        id
    }

    /// New live mount point. Not journaled.
    pub fn create_container(&mut self) -> HostNodeId {
        self.alloc(HostNodeKind::Container)
    }

    pub fn node(&self, id: HostNodeId) -> Result<&HostNode> {
        self.nodes
            .get(&id)
            .ok_or(EngineError::UnknownHostNode { node: id })
    }

    fn node_mut(&mut self, id: HostNodeId) -> Option<&mut HostNode> {
        let node = self.nodes.get_mut(&id);
        if node.is_none() {
            tracing::warn!(%id, "host operation on unknown node ignored");
        }
        node
    }

    pub fn children_of(&self, id: HostNodeId) -> &[HostNodeId] {
        self.nodes.get(&id).map_or(&[][..], |n| n.children.as_slice())
    }

    pub fn parent_of(&self, id: HostNodeId) -> Option<HostNodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn attribute(&self, id: HostNodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    pub fn property(&self, id: HostNodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)
            .and_then(|n| n.properties.get(name))
            .map(String::as_str)
    }

    pub fn style(&self, id: HostNodeId, property: &str) -> Option<&str> {
        self.nodes
            .get(&id)
            .and_then(|n| n.style.get(property))
            .map(String::as_str)
    }

    pub fn text(&self, id: HostNodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(HostNode::text)
    }

    pub fn listener_count(&self, id: HostNodeId, event: &str) -> usize {
        self.nodes.get(&id).map_or(0, |n| n.listener_count(event))
    }

    /// Number of live host nodes, containers included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // -------------------------------------------------------------------------
    // Journal
    // -------------------------------------------------------------------------

    pub fn journal(&self) -> &[Mutation] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Invoke every `event` listener registered on `target`.
    ///
    /// Returns how many listeners ran.
    pub fn dispatch(&self, target: HostNodeId, event: &str) -> Result<usize> {
        self.dispatch_event(&Event::new(event, target))
    }

    /// Like [`MemoryHost::dispatch`] with a caller-built event.
    pub fn dispatch_event(&self, event: &Event) -> Result<usize> {
        let listeners: Vec<Listener> = self
            .node(event.target)?
            .listeners
            .iter()
            .filter(|(name, _)| *name == event.name)
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in &listeners {
            listener(event);
        }
        Ok(listeners.len())
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    /// Markup of the children of `id` (or of `id` itself when it is not a
    /// container). Attributes are sorted; the `className` property prints as
    /// `class`.
    pub fn to_markup(&self, id: HostNodeId) -> String {
        let mut out = String::new();
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(HostNodeKind::Container) => {
                for child in self.children_of(id) {
                    self.write_markup(*child, &mut out);
                }
            }
            Some(_) => self.write_markup(id, &mut out),
            None => {}
        }
        out
    }

    fn write_markup(&self, id: HostNodeId, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match &node.kind {
            HostNodeKind::Text { text } => out.push_str(text),
            HostNodeKind::Container => {
                for child in &node.children {
                    self.write_markup(*child, out);
                }
            }
            HostNodeKind::Element { name } => {
                out.push('<');
                out.push_str(name);
                if let Some(class) = node.properties.get("className").filter(|c| !c.is_empty()) {
                    let _ = write!(out, " class=\"{class}\"");
                }
                for (key, value) in &node.attributes {
                    if value.is_empty() {
                        let _ = write!(out, " {key}");
                    } else {
                        let _ = write!(out, " {key}=\"{value}\"");
                    }
                }
                if !node.style.is_empty() {
                    let decls: Vec<String> = node.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    let _ = write!(out, " style=\"{}\"", decls.join("; "));
                }
                out.push('>');
                for child in &node.children {
                    self.write_markup(*child, out);
                }
                let _ = write!(out, "</{name}>");
            }
        }
    }

    fn detach(&mut self, node: HostNodeId) {
        let parent = self.nodes.get_mut(&node).and_then(|n| n.parent.take());
        if let Some(p) = parent.and_then(|id| self.nodes.get_mut(&id)) {
            p.children.retain(|c| *c != node);
        }
    }
}

impl HostRenderer for MemoryHost {
    fn create_element(&mut self, name: &str) -> HostNodeId {
        let node = self.alloc(HostNodeKind::Element {
            name: name.to_string(),
        });
        self.journal.push(Mutation::CreateElement {
            node,
            name: name.to_string(),
        });
        node
    }

    fn create_text(&mut self, text: &str) -> HostNodeId {
        let node = self.alloc(HostNodeKind::Text {
            text: text.to_string(),
        });
        self.journal.push(Mutation::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn set_text(&mut self, node: HostNodeId, text: &str) {
        let Some(n) = self.node_mut(node) else {
            return;
        };
        if let HostNodeKind::Text { text: current } = &mut n.kind {
            *current = text.to_string();
            self.journal.push(Mutation::SetText {
                node,
                text: text.to_string(),
            });
        }
    }

    fn set_attribute(&mut self, node: HostNodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attributes.insert(name.to_string(), value.to_string());
            self.journal.push(Mutation::SetAttribute {
                node,
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    fn remove_attribute(&mut self, node: HostNodeId, name: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attributes.remove(name);
            self.journal.push(Mutation::RemoveAttribute {
                node,
                name: name.to_string(),
            });
        }
    }

    fn has_attribute(&self, node: HostNodeId, name: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.attributes.contains_key(name))
    }

    fn set_property(&mut self, node: HostNodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.properties.insert(name.to_string(), value.to_string());
            self.journal.push(Mutation::SetProperty {
                node,
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    fn set_style(&mut self, node: HostNodeId, property: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.style.insert(property.to_string(), value.to_string());
            self.journal.push(Mutation::SetStyle {
                node,
                property: property.to_string(),
                value: value.to_string(),
            });
        }
    }

    fn remove_style(&mut self, node: HostNodeId, property: &str) {
        if let Some(n) = self.node_mut(node) {
            n.style.remove(property);
            self.journal.push(Mutation::RemoveStyle {
                node,
                property: property.to_string(),
            });
        }
    }

    fn add_event_listener(&mut self, node: HostNodeId, event: &str, listener: &Listener) {
        if let Some(n) = self.node_mut(node) {
            n.listeners.push((event.to_string(), Rc::clone(listener)));
            self.journal.push(Mutation::AddListener {
                node,
                event: event.to_string(),
            });
        }
    }

    fn remove_event_listener(&mut self, node: HostNodeId, event: &str, listener: &Listener) {
        if let Some(n) = self.node_mut(node) {
            let before = n.listeners.len();
            n.listeners
                .retain(|(e, l)| !(e == event && Rc::ptr_eq(l, listener)));
            if n.listeners.len() != before {
                self.journal.push(Mutation::RemoveListener {
                    node,
                    event: event.to_string(),
                });
            }
        }
    }

    fn is_connected(&self, node: HostNodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.nodes.get(&id) {
                Some(n) if n.kind == HostNodeKind::Container => return true,
                Some(n) => current = n.parent,
                None => return false,
            }
        }
        false
    }

    fn child_count(&self, parent: HostNodeId) -> usize {
        self.children_of(parent).len()
    }

    fn child_at(&self, parent: HostNodeId, index: usize) -> Option<HostNodeId> {
        self.children_of(parent).get(index).copied()
    }

    fn insert_before(&mut self, parent: HostNodeId, node: HostNodeId, reference: HostNodeId) {
        if self.node_mut(parent).is_none() || self.node_mut(node).is_none() {
            return;
        }
        self.detach(node);
        let Some(p) = self.nodes.get_mut(&parent) else {
            return;
        };
        match p.children.iter().position(|c| *c == reference) {
            Some(at) => p.children.insert(at, node),
            None => {
                tracing::warn!(%parent, %reference, "insert reference is not a child; appending");
                p.children.push(node);
            }
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }
        self.journal.push(Mutation::InsertBefore {
            parent,
            node,
            reference,
        });
    }

    fn append_child(&mut self, parent: HostNodeId, node: HostNodeId) {
        if self.node_mut(parent).is_none() || self.node_mut(node).is_none() {
            return;
        }
        self.detach(node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(node);
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }
        self.journal.push(Mutation::AppendChild { parent, node });
    }

    fn remove(&mut self, node: HostNodeId) {
        if self.node_mut(node).is_none() {
            return;
        }
        self.detach(node);
        self.journal.push(Mutation::Remove { node });
    }

    fn replace_with(&mut self, old: HostNodeId, new: HostNodeId) {
        if self.node_mut(new).is_none() {
            return;
        }
        let Some(parent) = self.parent_of(old) else {
            return;
        };
        self.detach(new);
        if let Some(p) = self.nodes.get_mut(&parent) {
            if let Some(at) = p.children.iter().position(|c| *c == old) {
                p.children[at] = new;
            }
        }
        if let Some(n) = self.nodes.get_mut(&old) {
            n.parent = None;
        }
        if let Some(n) = self.nodes.get_mut(&new) {
            n.parent = Some(parent);
        }
        self.journal.push(Mutation::ReplaceWith { old, new });
    }

    fn release(&mut self, node: HostNodeId) {
        if self.nodes.get(&node).is_some_and(|n| n.kind == HostNodeKind::Container) {
            return;
        }
        self.detach(node);
        let Some(released) = self.nodes.remove(&node) else {
            return;
        };
        for child in released.children {
            if let Some(c) = self.nodes.get_mut(&child) {
                c.parent = None;
            }
        }
        tracing::trace!(%node, "host node released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_insert_before_and_append() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let a = host.create_element("a");
        let b = host.create_element("b");
        let c = host.create_element("c");

        host.append_child(root, a);
        host.append_child(root, c);
        host.insert_before(root, b, c);

        assert_eq!(host.children_of(root), &[a, b, c]);
        assert_eq!(host.to_markup(root), "<a></a><b></b><c></c>");
    }

    #[test]
    fn test_insert_moves_attached_node() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let a = host.create_element("a");
        let b = host.create_element("b");
        host.append_child(root, a);
        host.append_child(root, b);

        host.insert_before(root, b, a);
        assert_eq!(host.children_of(root), &[b, a]);
    }

    #[test]
    fn test_connectivity_follows_container() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let outer = host.create_element("div");
        let inner = host.create_text("x");
        host.append_child(outer, inner);
        assert!(!host.is_connected(inner));

        host.append_child(root, outer);
        assert!(host.is_connected(inner));

        host.remove(outer);
        assert!(!host.is_connected(inner));
    }

    #[test]
    fn test_replace_with_swaps_in_place() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let a = host.create_element("a");
        let b = host.create_element("b");
        let z = host.create_element("z");
        host.append_child(root, a);
        host.append_child(root, b);

        host.replace_with(a, z);
        assert_eq!(host.children_of(root), &[z, b]);
        assert_eq!(host.parent_of(a), None);
    }

    #[test]
    fn test_markup_renders_props() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let input = host.create_element("input");
        host.set_attribute(input, "disabled", "");
        host.set_attribute(input, "name", "q");
        host.set_property(input, "className", "wide");
        host.set_style(input, "color", "red");
        host.append_child(root, input);

        assert_eq!(
            host.to_markup(root),
            "<input class=\"wide\" disabled name=\"q\" style=\"color: red\"></input>"
        );
    }

    #[test]
    fn test_dispatch_and_listener_removal() {
        let mut host = MemoryHost::new();
        let button = host.create_element("button");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let listener: Listener = Rc::new(move |_: &Event| counter.set(counter.get() + 1));

        host.add_event_listener(button, "click", &listener);
        assert_eq!(host.dispatch(button, "click").unwrap(), 1);
        assert_eq!(hits.get(), 1);

        host.remove_event_listener(button, "click", &listener);
        assert_eq!(host.dispatch(button, "click").unwrap(), 0);
        assert_eq!(host.listener_count(button, "click"), 0);
    }

    #[test]
    fn test_release_frees_node_and_orphans_children() {
        let mut host = MemoryHost::new();
        let root = host.create_container();
        let outer = host.create_element("div");
        let inner = host.create_text("x");
        host.append_child(outer, inner);
        host.append_child(root, outer);
        host.clear_journal();

        host.release(outer);
        assert_eq!(host.node_count(), 2);
        assert!(host.children_of(root).is_empty());
        assert_eq!(host.parent_of(inner), None);
        assert!(host.journal().is_empty());

        host.release(root);
        assert_eq!(host.node_count(), 2);
    }

    #[test]
    fn test_unknown_node_is_reported() {
        let host = MemoryHost::new();
        let err = host.node(HostNodeId(99)).err();
        assert!(matches!(err, Some(EngineError::UnknownHostNode { .. })));
    }
}
