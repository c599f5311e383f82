//! Render - Materialize host nodes and attach them by index.
//!
//! Every node records the host container it attaches into. Children are
//! rendered in order with a running host-index cursor, so each node's
//! `index_of` is the number of host nodes that precede it in the container:
//!
//! ```text
//! Tag("ul")                      cursor
//! ├── Tag("li")          idx 0   0 -> 1
//! ├── Fragment           idx 1   1 -> 3  (valid_index_of = 3)
//! │   ├── Tag("li")      idx 1
//! │   └── Tag("li")      idx 2
//! └── Component          idx 3   3 -> 4  (virtual: Tag("li"), idx 3)
//! ```

use std::rc::Rc;

use crate::engine::node::Lineage;
use crate::engine::{Children, ComponentCell, Node};
use crate::error::{EngineError, Result};
use crate::pipeline::Task;
use crate::renderer::props::sync_props;
use crate::types::HostNodeId;

use super::Reconciler;

impl Reconciler<'_> {
    /// Render `node` into `parent`. A `Root` renders into its own container.
    pub(crate) fn render(&mut self, node: &mut Node, parent: HostNodeId) -> Result<()> {
        let lineage = node.lineage();
        if !node.is_root() {
            node.set_host_parent(parent);
        }

        match node {
            Node::Root(root) => {
                let container = root.container;
                self.render_children(&mut root.children, lineage, container, 0)?;
            }
            Node::Fragment(fragment) => {
                let start = fragment.meta.index_of;
                fragment.valid_index_of = self.render_children(&mut fragment.children, lineage, parent, start)?;
            }
            Node::Tag(tag) => {
                let (element, created) = match tag.host {
                    Some(element) => (element, false),
                    None => {
                        let element = self.host.create_element(&tag.name);
                        tag.host = Some(element);
                        (element, true)
                    }
                };
                sync_props(self.host, tag)?;
                self.render_children(&mut tag.children, lineage, element, 0)?;
                if created || !self.host.is_connected(element) {
                    self.attach(parent, element, tag.meta.index_of);
                }
            }
            Node::Content(text) => match text.host {
                Some(text_node) => {
                    if text.dirty {
                        self.host.set_text(text_node, &text.content);
                        text.dirty = false;
                    }
                    if !self.host.is_connected(text_node) {
                        self.attach(parent, text_node, text.meta.index_of);
                    }
                }
                None => {
                    let text_node = self.host.create_text(&text.content);
                    text.host = Some(text_node);
                    text.dirty = false;
                    self.attach(parent, text_node, text.meta.index_of);
                }
            },
            Node::Component(component) => {
                let cell = Rc::clone(&component.0);
                self.render_component(&cell, Some(parent))?;
            }
        }
        Ok(())
    }

    /// Render the committed subtree of `component`, generating it first if
    /// it never generated.
    ///
    /// `parent` defaults to the container recorded by the previous render,
    /// which is how the scheduler re-renders a component on its own.
    pub(crate) fn render_component(&mut self, component: &Rc<ComponentCell>, parent: Option<HostNodeId>) -> Result<()> {
        if component.is_deleted() {
            return Ok(());
        }
        let parent = parent.or_else(|| component.host_parent());
        if !component.generated.get() {
            self.generate_tree(component);
        }

        let taken = component.virtual_node.borrow_mut().take();
        let Some(mut output) = taken else {
            self.schedule_effects(component);
            return Ok(());
        };

        output.relate(component.lineage());
        if !output.is_root() {
            output.set_index_of(component.index_of());
        }
        let result = match parent.or_else(|| output.as_root().map(|r| r.container())) {
            Some(parent) => self.render(&mut output, parent),
            None => Err(EngineError::structural(format!(
                "component {} has no host container to render into",
                component.id()
            ))),
        };
        *component.virtual_node.borrow_mut() = Some(output);

        self.schedule_effects(component);
        result
    }

    /// Render `children` into `parent` starting at host index `start`.
    ///
    /// Returns the host index just past the last child.
    fn render_children(
        &mut self,
        children: &mut Children,
        lineage: Lineage,
        parent: HostNodeId,
        start: usize,
    ) -> Result<usize> {
        let mut cursor = start;
        for child in children.iter_mut().flatten() {
            child.relate(lineage);
            if child.is_root() {
                self.render(child, parent)?;
                continue;
            }
            child.set_index_of(cursor);
            self.render(child, parent)?;
            cursor = child.contribution_end();
        }
        Ok(cursor)
    }

    /// Put `node` at host index `index` of `parent`, appending past the end.
    fn attach(&mut self, parent: HostNodeId, node: HostNodeId, index: usize) {
        match self.host.child_at(parent, index) {
            Some(reference) if reference == node => {}
            Some(reference) => self.host.insert_before(parent, node, reference),
            None => self.host.append_child(parent, node),
        }
    }

    fn schedule_effects(&self, component: &Rc<ComponentCell>) {
        if component.hooks.borrow().effect.is_empty() {
            return;
        }
        self.runtime
            .tasks
            .push(Task::RunEffects(Rc::downgrade(component)));
    }
}
