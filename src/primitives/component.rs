//! Component constructors.

use std::any::Any;
use std::rc::Rc;

use crate::engine::{ComponentCell, ComponentNode, IntoRendered, Node, Scope, Template};

/// Component instance of a template that takes no props.
///
/// Each call allocates a fresh set of hook stores. When a re-render produces
/// a component at the same position with the same template, the committed
/// instance keeps its stores and the fresh one is discarded.
pub fn component<F, R>(template: F) -> Node
where
    F: Fn(&mut Scope<'_>) -> R + 'static,
    R: IntoRendered,
{
    from_template(Template::new(template), None)
}

/// Component instance of a template that receives `props`.
pub fn component_with<P, F, R>(template: F, props: P) -> Node
where
    P: 'static,
    F: Fn(&mut Scope<'_>, &P) -> R + 'static,
    R: IntoRendered,
{
    from_template(Template::with_props(template), Some(Rc::new(props)))
}

/// Component instance of an already-erased template.
pub fn from_template(template: Template, props: Option<Rc<dyn Any>>) -> Node {
    Node::Component(ComponentNode(Rc::new(ComponentCell::new(template, props))))
}
