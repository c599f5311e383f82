//! Clear - Recursive teardown of a subtree.
//!
//! Every cleared node is tombstoned. Components also drop out of the
//! scheduler, release their hook slots and leave the context graph.
//!
//! Host nodes are detached only at the top of a removed element subtree;
//! descendants of a removed element go with it. Every dropped host node is
//! released to the host.

use crate::engine::{ComponentCell, Node};
use crate::renderer::props::release_props;

use super::Reconciler;

impl Reconciler<'_> {
    /// Tear down `node`. With `detach`, its topmost host nodes are removed
    /// from their container.
    pub(crate) fn clear_node(&mut self, mut node: Node, detach: bool) {
        node.mark_deleted();
        match node {
            Node::Root(root) => {
                for child in root.children.into_iter().flatten() {
                    self.clear_node(child, true);
                }
            }
            Node::Fragment(fragment) => {
                for child in fragment.children.into_iter().flatten() {
                    self.clear_node(child, detach);
                }
            }
            Node::Tag(mut tag) => {
                for child in std::mem::take(&mut tag.children).into_iter().flatten() {
                    self.clear_node(child, false);
                }
                release_props(self.host, &mut tag);
                if let Some(element) = tag.host.take() {
                    if detach {
                        self.host.remove(element);
                    }
                    self.host.release(element);
                }
            }
            Node::Content(text) => {
                if let Some(text_node) = text.host {
                    if detach {
                        self.host.remove(text_node);
                    }
                    self.host.release(text_node);
                }
            }
            Node::Component(component) => self.clear_component(&component.0, detach),
        }
    }

    fn clear_component(&mut self, component: &ComponentCell, detach: bool) {
        tracing::trace!(component = %component.id(), "clearing component");
        self.runtime.scheduler.cancel(component);
        component.generated.set(false);

        let output = component.virtual_node.borrow_mut().take();
        if let Some(output) = output {
            self.clear_node(output, detach);
        }
        self.clear_reactivity(component, self.runtime.config.run_cleanups_on_unmount);
    }

    /// Drop every hook slot of `component` and sever its context links.
    pub(crate) fn clear_reactivity(&mut self, component: &ComponentCell, run_cleanups: bool) {
        let cleanups = component.hooks.borrow_mut().clean_up.drain();
        if run_cleanups {
            for cleanup in cleanups {
                cleanup();
            }
        }
        component.hooks.borrow_mut().reset();
        self.runtime.contexts.leave(component.id());
        self.runtime.contexts.withdraw(component.id());
    }
}
