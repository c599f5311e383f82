//! Generation - Run a component's template and commit the result.

use std::rc::Rc;

use crate::engine::{ComponentCell, Node, Scope};
use crate::error::Result;
use crate::renderer::props::validate_tree;

use super::Reconciler;

impl Reconciler<'_> {
    /// Run the template of `component` once.
    ///
    /// Pending cleanups from the previous pass run first. The hook stores are
    /// rewound, the template runs inside a `Scope`, and popping the render
    /// stack closes the stores it filled. Effects registered by a failed pass
    /// are discarded.
    pub(crate) fn generate_component(&mut self, component: &Rc<ComponentCell>) -> Result<Option<Node>> {
        self.stack.push(Rc::clone(component));

        let cleanups = component.hooks.borrow_mut().clean_up.drain();
        for cleanup in cleanups {
            cleanup();
        }
        component.hooks.borrow_mut().rewind();

        let template = component.template.borrow().clone();
        let props = component.props.borrow().clone();
        let output = {
            let mut scope = Scope::new(component, self.runtime);
            template.call(&mut scope, props.as_deref())
        };
        self.stack.pop();

        let output = output.and_then(|node| {
            if let Some(node) = &node {
                validate_tree(node)?;
            }
            Ok(node)
        });
        if output.is_err() {
            component.hooks.borrow_mut().effect.drain();
        }
        output
    }

    /// Generate `component` and merge the output into its `virtual`.
    ///
    /// Returns false when generation failed; the component then keeps its
    /// last committed subtree.
    pub(crate) fn generate_tree(&mut self, component: &Rc<ComponentCell>) -> bool {
        let output = match self.generate_component(component) {
            Ok(output) => output,
            Err(err) => {
                tracing::error!(
                    component = %component.id(),
                    template = component.template_name(),
                    error = %err,
                    "generation failed, keeping last render"
                );
                return false;
            }
        };
        component.generated.set(true);

        let previous = component.virtual_node.borrow_mut().take();
        let next = match (previous, output) {
            (None, None) => None,
            (Some(old), None) => {
                tracing::trace!(component = %component.id(), "render produced nothing");
                self.clear_node(old, true);
                None
            }
            (None, Some(mut new)) => {
                new.relate(component.lineage());
                if !new.is_root() {
                    new.set_index_of(component.index_of());
                }
                Some(new)
            }
            (Some(old), Some(new)) => {
                let index = component.index_of();
                Some(self.reconcile_pair(old, new, component.lineage(), index))
            }
        };
        *component.virtual_node.borrow_mut() = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::RenderStack;
    use crate::error::EngineError;
    use crate::pipeline::Runtime;
    use crate::primitives::{component, props, tag};
    use crate::renderer::MemoryHost;

    fn cell_of(node: &Node) -> Rc<ComponentCell> {
        Rc::clone(node.as_component().unwrap())
    }

    #[test]
    fn test_generate_closes_filled_stores() {
        let node = component(|scope: &mut Scope<'_>| -> Result<Node> {
            scope.state(0)?;
            Ok(tag("p", ()))
        });
        let cell = cell_of(&node);
        let runtime = Runtime::new(EngineConfig::default());
        let (mut host, mut stack) = (MemoryHost::new(), RenderStack::new());
        let mut rec = Reconciler::new(&mut host, &runtime, &mut stack);

        assert!(rec.generate_tree(&cell));
        assert!(cell.hooks.borrow().state.is_closed());
        assert!(cell.has_virtual());
        assert!(stack_is_empty(&rec));
    }

    fn stack_is_empty(rec: &Reconciler<'_>) -> bool {
        rec.stack.is_empty()
    }

    #[test]
    fn test_failed_generation_keeps_virtual() {
        let node = component(|scope: &mut Scope<'_>| -> Result<Node> {
            let fail = scope.memory(false)?;
            if fail.get() {
                return Err(EngineError::generation("boom"));
            }
            fail.set(true);
            scope.effect(|| {});
            Ok(tag("p", ()))
        });
        let cell = cell_of(&node);
        let runtime = Runtime::new(EngineConfig::default());
        let (mut host, mut stack) = (MemoryHost::new(), RenderStack::new());
        let mut rec = Reconciler::new(&mut host, &runtime, &mut stack);

        assert!(rec.generate_tree(&cell));
        cell.hooks.borrow_mut().effect.drain();
        assert!(!rec.generate_tree(&cell));
        assert!(cell.has_virtual());
        assert!(cell.hooks.borrow().effect.is_empty());
    }

    #[test]
    fn test_malformed_output_is_rejected() {
        let node = component(|_scope: &mut Scope<'_>| tag("a", props().attr("onclick", "x")));
        let cell = cell_of(&node);
        let runtime = Runtime::new(EngineConfig::default());
        let (mut host, mut stack) = (MemoryHost::new(), RenderStack::new());
        let mut rec = Reconciler::new(&mut host, &runtime, &mut stack);

        let err = rec.generate_component(&cell).unwrap_err();
        assert!(err.is_structural());
    }
}
