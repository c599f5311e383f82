//! Diff - Merge a freshly built subtree into the committed one.
//!
//! Children are matched by position only. Diff mutates the committed tree in
//! place and removes host nodes that disappear; creating and attaching new
//! host nodes is left to the render pass that always follows.

use std::rc::Rc;

use crate::engine::node::{Lineage, host_count_of};
use crate::engine::{Children, ComponentCell, Node, TagNode};
use crate::renderer::props::release_props;

use super::Reconciler;

impl Reconciler<'_> {
    /// Keep `old` and merge `new` into it when they are the same kind;
    /// otherwise clear `old` and substitute `new` at its index.
    pub(crate) fn reconcile_pair(&mut self, mut old: Node, mut new: Node, lineage: Lineage, fallback_index: usize) -> Node {
        let replace = match (&old, &new) {
            (Node::Root(o), Node::Root(n)) => o.container != n.container,
            (o, n) => o.kind() != n.kind(),
        };
        if !replace {
            self.diff(&mut old, new);
            return old;
        }

        tracing::trace!(from = %old.kind(), to = %new.kind(), "replacing node");
        let index = if old.is_root() { fallback_index } else { old.index_of() };
        let host_parent = old.parent().and_then(|p| p.host);
        self.clear_node(old, true);
        new.relate(lineage);
        if let Some(host) = host_parent {
            new.set_host_parent(host);
        }
        if !new.is_root() {
            new.set_index_of(index);
        }
        new
    }

    /// Merge `new` into `old`. Both must be the same kind.
    pub(crate) fn diff(&mut self, old: &mut Node, new: Node) {
        let lineage = old.lineage();
        match (old, new) {
            (Node::Root(o), Node::Root(n)) => {
                self.diff_children(&mut o.children, n.children, lineage, 0);
            }
            (Node::Fragment(o), Node::Fragment(n)) => {
                let base = o.meta.index_of;
                self.diff_children(&mut o.children, n.children, lineage, base);
                o.valid_index_of = base + host_count_of(&o.children);
            }
            (Node::Tag(o), Node::Tag(n)) => {
                if o.name != n.name {
                    self.rename_tag(o, n.name);
                }
                o.props = n.props;
                self.diff_children(&mut o.children, n.children, lineage, 0);
            }
            (Node::Content(o), Node::Content(n)) => {
                if o.content != n.content {
                    o.content = n.content;
                    o.dirty = true;
                }
            }
            (Node::Component(o), Node::Component(n)) => {
                self.diff_component(&o.0, &n.0);
            }
            (o, n) => {
                tracing::warn!(old = %o.kind(), new = %n.kind(), "diff called on mismatched kinds");
            }
        }
    }

    /// Swap the tag's host element for one with the new name.
    ///
    /// A connected element is replaced in place; a detached one is released
    /// and the render pass creates the new element.
    fn rename_tag(&mut self, tag: &mut TagNode, name: String) {
        tracing::trace!(from = %tag.name, to = %name, "renaming tag");
        if let Some(element) = tag.host {
            release_props(self.host, tag);
            if self.host.is_connected(element) {
                let replacement = self.host.create_element(&name);
                self.host.replace_with(element, replacement);
                tag.host = Some(replacement);
            } else {
                self.host.remove(element);
                tag.host = None;
            }
            self.host.release(element);
        }
        tag.name = name;
    }

    /// Re-run `old` with the props of `new`, resetting hooks when the
    /// template differs. `new` is discarded.
    fn diff_component(&mut self, old: &Rc<ComponentCell>, new: &Rc<ComponentCell>) {
        self.runtime.scheduler.cancel(old);

        let props = new.props.borrow_mut().take();
        *old.props.borrow_mut() = props;

        let template = new.template.borrow().clone();
        let same = old.template.borrow().same_as(&template);
        if !same {
            tracing::debug!(
                component = %old.id(),
                from = old.template_name(),
                to = template.name(),
                "template changed, resetting hooks"
            );
            self.clear_reactivity(old, true);
            *old.template.borrow_mut() = template;
        }

        self.generate_tree(old);
    }

    /// Positional child diff.
    ///
    /// `base` is the host index of the first slot. An appearing child is
    /// placed just past the nearest preceding non-empty sibling.
    pub(crate) fn diff_children(&mut self, old: &mut Children, new: Children, lineage: Lineage, base: usize) {
        if new.is_empty() {
            for child in old.drain(..).flatten() {
                self.clear_node(child, true);
            }
            return;
        }
        if old.is_empty() {
            *old = new;
            for child in old.iter_mut().flatten() {
                child.relate(lineage);
            }
            return;
        }

        let len = old.len().max(new.len());
        old.resize_with(len, || None);
        let mut incoming = new.into_iter();

        for i in 0..len {
            let next = incoming.next().flatten();
            let outgoing = old[i].take();
            let fallback = preceding_end(&old[..i], base);
            old[i] = match (outgoing, next) {
                (None, None) => None,
                (Some(gone), None) => {
                    self.clear_node(gone, true);
                    None
                }
                (None, Some(mut fresh)) => {
                    fresh.relate(lineage);
                    if !fresh.is_root() {
                        fresh.set_index_of(fallback);
                    }
                    Some(fresh)
                }
                (Some(current), Some(fresh)) => Some(self.reconcile_pair(current, fresh, lineage, fallback)),
            };
        }
    }
}

/// Host index just past the last non-empty, non-root slot in `siblings`.
fn preceding_end(siblings: &[Option<Node>], base: usize) -> usize {
    siblings
        .iter()
        .rev()
        .flatten()
        .find(|n| !n.is_root())
        .map_or(base, Node::contribution_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::RenderStack;
    use crate::nodes;
    use crate::pipeline::Runtime;
    use crate::primitives::{content, fragment, tag};
    use crate::renderer::MemoryHost;
    use crate::types::NodeKind;

    fn lineage() -> Lineage {
        Lineage {
            tree_id: None,
            tree_idx: 0,
            kind: NodeKind::Tag,
        }
    }

    #[test]
    fn test_positional_reinsertion() {
        let runtime = Runtime::new(EngineConfig::default());
        let (mut host, mut stack) = (MemoryHost::new(), RenderStack::new());
        let mut rec = Reconciler::new(&mut host, &runtime, &mut stack);

        let mut old = nodes![tag("a", ()), tag("b", ()), tag("c", ())];
        for (i, child) in old.iter_mut().flatten().enumerate() {
            child.set_index_of(i);
        }
        let new = nodes![tag("a", ()), None, tag("c", ()), tag("d", ())];
        rec.diff_children(&mut old, new, lineage(), 0);

        assert_eq!(old.len(), 4);
        assert!(old[1].is_none());
        assert_eq!(old[3].as_ref().map(Node::index_of), Some(3));
    }

    #[test]
    fn test_appearing_child_after_fragment() {
        let runtime = Runtime::new(EngineConfig::default());
        let (mut host, mut stack) = (MemoryHost::new(), RenderStack::new());
        let mut rec = Reconciler::new(&mut host, &runtime, &mut stack);

        let mut frag = fragment(nodes![tag("x", ()), tag("y", ()), tag("z", ())]);
        frag.set_index_of(2);
        let mut old = vec![None, None, Some(frag)];
        let new = nodes![None, None, fragment(nodes![tag("x", ()), tag("y", ()), tag("z", ())]), tag("w", ())];
        rec.diff_children(&mut old, new, lineage(), 0);

        assert_eq!(old[3].as_ref().map(Node::index_of), Some(5));
    }

    #[test]
    fn test_kind_change_takes_outgoing_index() {
        let runtime = Runtime::new(EngineConfig::default());
        let (mut host, mut stack) = (MemoryHost::new(), RenderStack::new());
        let mut rec = Reconciler::new(&mut host, &runtime, &mut stack);

        let mut first = tag("a", ());
        first.set_index_of(0);
        let mut second = tag("b", ());
        second.set_index_of(1);
        let mut old = vec![Some(first), Some(second)];
        rec.diff_children(&mut old, nodes![tag("a", ()), "text"], lineage(), 0);

        let replaced = old[1].as_ref().unwrap();
        assert_eq!(replaced.kind(), NodeKind::Content);
        assert_eq!(replaced.index_of(), 1);
    }

    #[test]
    fn test_content_change_marks_dirty() {
        let runtime = Runtime::new(EngineConfig::default());
        let (mut host, mut stack) = (MemoryHost::new(), RenderStack::new());
        let mut rec = Reconciler::new(&mut host, &runtime, &mut stack);

        let mut old = content("before");
        rec.diff(&mut old, content("after"));
        let Node::Content(c) = &old else { unreachable!() };
        assert_eq!(c.content, "after");
        assert!(c.dirty);
    }

    #[test]
    fn test_empty_new_list_clears_everything() {
        let runtime = Runtime::new(EngineConfig::default());
        let (mut host, mut stack) = (MemoryHost::new(), RenderStack::new());
        let mut rec = Reconciler::new(&mut host, &runtime, &mut stack);

        let mut old = nodes![tag("a", ()), tag("b", ())];
        rec.diff_children(&mut old, Vec::new(), lineage(), 0);
        assert!(old.is_empty());
    }
}
