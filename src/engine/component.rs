//! Component cells and templates.
//!
//! A component is the only node kind that is shared: the tree owns an
//! `Rc<ComponentCell>`, and so do the scheduler queue (while it is dirty) and
//! every setter handed out by its hooks (weakly).

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{EngineError, Result};
use crate::primitives::content;
use crate::types::{ComponentId, HostNodeId, NodeFlags, NodeKind, TreeId};

use super::hooks::{HookSlots, Scope};
use super::node::{Lineage, Node, NodeMeta};

/// Shared component handle.
pub type ComponentHandle = Rc<ComponentCell>;

// =============================================================================
// Rendered Output
// =============================================================================

/// Values a template may return.
///
/// `None` and `()` render nothing; strings become `Content` leaves; an `Err`
/// aborts the generation pass.
pub trait IntoRendered {
    fn into_rendered(self) -> Result<Option<Node>>;
}

impl IntoRendered for Node {
    fn into_rendered(self) -> Result<Option<Node>> {
        Ok(Some(self))
    }
}

impl IntoRendered for Option<Node> {
    fn into_rendered(self) -> Result<Option<Node>> {
        Ok(self)
    }
}

impl IntoRendered for () {
    fn into_rendered(self) -> Result<Option<Node>> {
        Ok(None)
    }
}

impl IntoRendered for &str {
    fn into_rendered(self) -> Result<Option<Node>> {
        Ok(Some(content(self)))
    }
}

impl IntoRendered for String {
    fn into_rendered(self) -> Result<Option<Node>> {
        Ok(Some(content(self)))
    }
}

impl<T, E> IntoRendered for std::result::Result<T, E>
where
    T: IntoRendered,
    E: Into<EngineError>,
{
    fn into_rendered(self) -> Result<Option<Node>> {
        match self {
            Ok(value) => value.into_rendered(),
            Err(err) => Err(err.into()),
        }
    }
}

// =============================================================================
// Template
// =============================================================================

type RenderFn = dyn Fn(&mut Scope<'_>, Option<&dyn Any>) -> Result<Option<Node>>;

/// Type-erased component body.
///
/// Identity is the `TypeId` of the function or closure type, so re-creating a
/// component from the same function on every render keeps its hook state.
#[derive(Clone)]
pub struct Template {
    identity: TypeId,
    name: &'static str,
    takes_props: bool,
    render: Rc<RenderFn>,
}

impl Template {
    /// Template without props.
    pub fn new<F, R>(template: F) -> Self
    where
        F: Fn(&mut Scope<'_>) -> R + 'static,
        R: IntoRendered,
    {
        Self {
            identity: TypeId::of::<F>(),
            name: std::any::type_name::<F>(),
            takes_props: false,
            render: Rc::new(move |scope, _props| template(scope).into_rendered()),
        }
    }

    /// Template that receives props of type `P`.
    pub fn with_props<P, F, R>(template: F) -> Self
    where
        P: 'static,
        F: Fn(&mut Scope<'_>, &P) -> R + 'static,
        R: IntoRendered,
    {
        let name = std::any::type_name::<F>();
        Self {
            identity: TypeId::of::<F>(),
            name,
            takes_props: true,
            render: Rc::new(move |scope, props| {
                let props = props.and_then(|p| p.downcast_ref::<P>()).ok_or_else(|| {
                    EngineError::generation(format!(
                        "template `{name}` expects props of type `{}`",
                        std::any::type_name::<P>()
                    ))
                })?;
                template(scope, props).into_rendered()
            }),
        }
    }

    pub fn identity(&self) -> TypeId {
        self.identity
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn takes_props(&self) -> bool {
        self.takes_props
    }

    pub fn same_as(&self, other: &Template) -> bool {
        self.identity == other.identity
    }

    pub(crate) fn call(&self, scope: &mut Scope<'_>, props: Option<&dyn Any>) -> Result<Option<Node>> {
        let props = if self.takes_props { props } else { None };
        (self.render)(scope, props)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("takes_props", &self.takes_props)
            .finish()
    }
}

// =============================================================================
// Component Cell
// =============================================================================

pub struct ComponentCell {
    id: ComponentId,
    pub(crate) template: RefCell<Template>,
    pub(crate) props: RefCell<Option<Rc<dyn Any>>>,
    pub(crate) virtual_node: RefCell<Option<Node>>,
    pub(crate) hooks: RefCell<HookSlots>,
    pub(crate) meta: RefCell<NodeMeta>,
    /// At least one generation pass succeeded since the last clear.
    pub(crate) generated: Cell<bool>,
}

impl ComponentCell {
    pub(crate) fn new(template: Template, props: Option<Rc<dyn Any>>) -> Self {
        Self {
            id: ComponentId::next(),
            template: RefCell::new(template),
            props: RefCell::new(props),
            virtual_node: RefCell::new(None),
            hooks: RefCell::new(HookSlots::default()),
            meta: RefCell::new(NodeMeta::default()),
            generated: Cell::new(false),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn template_name(&self) -> &'static str {
        self.template.borrow().name()
    }

    pub fn tree_id(&self) -> Option<TreeId> {
        self.meta.borrow().tree_id
    }

    pub fn index_of(&self) -> usize {
        self.meta.borrow().index_of
    }

    pub fn is_deleted(&self) -> bool {
        self.meta.borrow().is_deleted()
    }

    pub fn needs_rehydrate(&self) -> bool {
        self.meta.borrow().needs_rehydrate()
    }

    pub(crate) fn insert_flags(&self, flags: NodeFlags) {
        self.meta.borrow_mut().flags.insert(flags);
    }

    pub(crate) fn remove_flags(&self, flags: NodeFlags) {
        self.meta.borrow_mut().flags.remove(flags);
    }

    pub(crate) fn lineage(&self) -> Lineage {
        let meta = self.meta.borrow();
        Lineage {
            tree_id: meta.tree_id,
            tree_idx: meta.tree_idx,
            kind: NodeKind::Component,
        }
    }

    /// Host container the component's output attaches into, once rendered.
    pub fn host_parent(&self) -> Option<HostNodeId> {
        self.meta.borrow().parent.and_then(|p| p.host)
    }

    /// Number of host nodes the committed subtree contributes to the
    /// container. A `Root` output renders elsewhere and counts as 0.
    pub fn host_count(&self) -> usize {
        self.virtual_node
            .borrow()
            .as_ref()
            .map_or(0, |v| if v.is_root() { 0 } else { v.host_count() })
    }

    pub fn has_virtual(&self) -> bool {
        self.virtual_node.borrow().is_some()
    }

    /// Inspect the committed subtree.
    pub fn with_virtual<R>(&self, f: impl FnOnce(Option<&Node>) -> R) -> R {
        f(self.virtual_node.borrow().as_ref())
    }

    /// Number of state slots currently held.
    pub fn state_slots(&self) -> usize {
        self.hooks.borrow().state.len()
    }
}

impl fmt::Debug for ComponentCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCell")
            .field("id", &self.id)
            .field("template", &self.template_name())
            .field("flags", &self.meta.borrow().flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::tag;

    fn header(_scope: &mut Scope<'_>) -> Node {
        tag("header", ())
    }

    fn footer(_scope: &mut Scope<'_>) -> Node {
        tag("footer", ())
    }

    #[test]
    fn test_template_identity_follows_function_type() {
        assert!(Template::new(header).same_as(&Template::new(header)));
        assert!(!Template::new(header).same_as(&Template::new(footer)));
    }

    #[test]
    fn test_template_props_flag() {
        let plain = Template::new(header);
        let with_props = Template::with_props(|_s: &mut Scope<'_>, label: &String| label.clone());
        assert!(!plain.takes_props());
        assert!(with_props.takes_props());
    }

    #[test]
    fn test_into_rendered_variants() {
        assert!(().into_rendered().unwrap().is_none());
        let text = "hello".into_rendered().unwrap().unwrap();
        assert_eq!(text.as_content().map(|c| c.content()), Some("hello"));

        let failed: std::result::Result<Node, EngineError> = Err(EngineError::generation("nope"));
        assert!(failed.into_rendered().unwrap_err().is_generation());
    }

    #[test]
    fn test_new_cell_is_clean() {
        let cell = ComponentCell::new(Template::new(header), None);
        assert!(!cell.is_deleted());
        assert!(!cell.needs_rehydrate());
        assert!(!cell.has_virtual());
        assert_eq!(cell.state_slots(), 0);
    }
}
