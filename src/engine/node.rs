//! Node model - the five node variants and their shared fields.
//!
//! A node tree is an owned value: parents own their children, a component owns
//! its committed `virtual` subtree. The only shared pieces are component cells
//! (`Rc<ComponentCell>`), because setters and the scheduler must address a
//! component from outside the tree.
//!
//! ```text
//! Root(container)
//! ├── Tag("ul")
//! │   ├── Tag("li") ── Content("one")
//! │   └── Component(list_item) ── virtual: Tag("li")
//! └── Fragment
//!     ├── Tag("p")
//!     └── Tag("p")
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::primitives::Props;
use crate::types::{HostNodeId, Listener, NodeFlags, NodeKind, TreeId};

use super::component::ComponentCell;

/// Ordered child slots. `None` is an empty slot that contributes nothing.
pub type Children = Vec<Option<Node>>;

// =============================================================================
// Shared Fields
// =============================================================================

/// Link to the enclosing node, stamped by `relate` and completed by `render`.
///
/// Holds the parent's kind and the host container this node attaches into,
/// never an owning reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParentLink {
    pub kind: NodeKind,
    pub host: Option<HostNodeId>,
}

/// Positional and lifecycle fields shared by every variant.
#[derive(Clone, Debug, Default)]
pub struct NodeMeta {
    pub tree_id: Option<TreeId>,
    pub tree_idx: usize,
    pub index_of: usize,
    pub parent: Option<ParentLink>,
    pub flags: NodeFlags,
}

impl NodeMeta {
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(NodeFlags::DELETED)
    }

    pub fn needs_rehydrate(&self) -> bool {
        self.flags.contains(NodeFlags::NEEDS_REHYDRATE)
    }
}

/// What a child inherits from the node it is related to.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Lineage {
    pub tree_id: Option<TreeId>,
    pub tree_idx: usize,
    pub kind: NodeKind,
}

// =============================================================================
// Variants
// =============================================================================

/// Anchors a tree to an external host container.
pub struct RootNode {
    pub(crate) meta: NodeMeta,
    pub(crate) container: HostNodeId,
    pub(crate) children: Children,
}

/// Transparent grouping contributing several host nodes at one position.
pub struct FragmentNode {
    pub(crate) meta: NodeMeta,
    pub(crate) children: Children,
    /// `index_of` plus the number of host nodes the children materialize.
    pub(crate) valid_index_of: usize,
}

/// Listener registered on a host element.
///
/// The host holds `host_listener`, a trampoline that forwards to whatever
/// closure currently sits in `slot`, so replacing a listener between renders
/// needs no host call.
pub(crate) struct ListenerBinding {
    pub slot: Rc<std::cell::RefCell<Listener>>,
    pub host_listener: Listener,
}

/// Element node owning at most one host element.
pub struct TagNode {
    pub(crate) meta: NodeMeta,
    pub(crate) name: String,
    pub(crate) props: Props,
    pub(crate) children: Children,
    pub(crate) host: Option<HostNodeId>,
    /// Props last written to `host`.
    pub(crate) applied: Props,
    pub(crate) listeners: HashMap<String, ListenerBinding>,
}

/// Text leaf owning at most one host text node.
pub struct ContentNode {
    pub(crate) meta: NodeMeta,
    pub(crate) content: String,
    pub(crate) host: Option<HostNodeId>,
    /// Content changed since it was last written to `host`.
    pub(crate) dirty: bool,
}

/// Component instance. The cell is shared with setters and the scheduler.
pub struct ComponentNode(pub(crate) Rc<ComponentCell>);

// =============================================================================
// Node
// =============================================================================

pub enum Node {
    Root(RootNode),
    Fragment(FragmentNode),
    Tag(TagNode),
    Content(ContentNode),
    Component(ComponentNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Root(_) => NodeKind::Root,
            Node::Fragment(_) => NodeKind::Fragment,
            Node::Tag(_) => NodeKind::Tag,
            Node::Content(_) => NodeKind::Content,
            Node::Component(_) => NodeKind::Component,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Node::Root(_))
    }

    /// Read the shared fields.
    pub fn with_meta<R>(&self, f: impl FnOnce(&NodeMeta) -> R) -> R {
        match self {
            Node::Root(n) => f(&n.meta),
            Node::Fragment(n) => f(&n.meta),
            Node::Tag(n) => f(&n.meta),
            Node::Content(n) => f(&n.meta),
            Node::Component(n) => f(&n.0.meta.borrow()),
        }
    }

    pub(crate) fn with_meta_mut<R>(&mut self, f: impl FnOnce(&mut NodeMeta) -> R) -> R {
        match self {
            Node::Root(n) => f(&mut n.meta),
            Node::Fragment(n) => f(&mut n.meta),
            Node::Tag(n) => f(&mut n.meta),
            Node::Content(n) => f(&mut n.meta),
            Node::Component(n) => f(&mut n.0.meta.borrow_mut()),
        }
    }

    pub fn index_of(&self) -> usize {
        self.with_meta(|m| m.index_of)
    }

    pub(crate) fn set_index_of(&mut self, index: usize) {
        self.with_meta_mut(|m| m.index_of = index);
        if let Node::Fragment(f) = self {
            f.valid_index_of = index + host_count_of(&f.children);
        }
    }

    pub fn tree_id(&self) -> Option<TreeId> {
        self.with_meta(|m| m.tree_id)
    }

    pub fn tree_idx(&self) -> usize {
        self.with_meta(|m| m.tree_idx)
    }

    pub fn parent(&self) -> Option<ParentLink> {
        self.with_meta(|m| m.parent)
    }

    pub fn is_deleted(&self) -> bool {
        self.with_meta(|m| m.is_deleted())
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.with_meta_mut(|m| m.flags.insert(NodeFlags::DELETED));
    }

    /// Stamp tree identity, depth and parent kind inherited from `lineage`.
    ///
    /// A `Root` child takes the tree identity but keeps no upward link.
    pub(crate) fn relate(&mut self, lineage: Lineage) {
        let is_root = self.is_root();
        self.with_meta_mut(|m| {
            m.tree_id = lineage.tree_id;
            m.tree_idx = lineage.tree_idx + 1;
            if !is_root {
                let host = m.parent.and_then(|p| p.host);
                m.parent = Some(ParentLink {
                    kind: lineage.kind,
                    host,
                });
            }
        });
    }

    /// Record the host container this node attaches into.
    pub(crate) fn set_host_parent(&mut self, host: HostNodeId) {
        self.with_meta_mut(|m| {
            if let Some(parent) = m.parent.as_mut() {
                parent.host = Some(host);
            }
        });
    }

    pub(crate) fn lineage(&self) -> Lineage {
        self.with_meta(|m| Lineage {
            tree_id: m.tree_id,
            tree_idx: m.tree_idx,
            kind: self.kind(),
        })
    }

    pub fn children(&self) -> Option<&Children> {
        match self {
            Node::Root(n) => Some(&n.children),
            Node::Fragment(n) => Some(&n.children),
            Node::Tag(n) => Some(&n.children),
            Node::Content(_) | Node::Component(_) => None,
        }
    }

    pub(crate) fn into_children(self) -> Option<Children> {
        match self {
            Node::Root(n) => Some(n.children),
            Node::Fragment(n) => Some(n.children),
            Node::Tag(n) => Some(n.children),
            Node::Content(_) | Node::Component(_) => None,
        }
    }

    /// Host node owned directly by this node (`Tag` and `Content` only).
    pub fn host(&self) -> Option<HostNodeId> {
        match self {
            Node::Tag(n) => n.host,
            Node::Content(n) => n.host,
            _ => None,
        }
    }

    /// Number of host nodes this node currently contributes to its container.
    pub fn host_count(&self) -> usize {
        match self {
            Node::Tag(_) | Node::Content(_) => 1,
            Node::Fragment(n) => host_count_of(&n.children),
            Node::Component(n) => n.0.host_count(),
            Node::Root(_) => 0,
        }
    }

    /// Re-stamp `index_of` for this node and everything below it, starting
    /// at host index `start`, without touching the host.
    ///
    /// Mirrors the cursor of the render pass. A `Root` restarts at 0 in its
    /// own container.
    pub(crate) fn reindex(&mut self, start: usize) {
        match self {
            Node::Root(n) => {
                reindex_children(&mut n.children, 0);
            }
            Node::Fragment(n) => {
                n.meta.index_of = start;
                n.valid_index_of = reindex_children(&mut n.children, start);
            }
            Node::Tag(n) => {
                n.meta.index_of = start;
                reindex_children(&mut n.children, 0);
            }
            Node::Content(n) => n.meta.index_of = start,
            Node::Component(n) => {
                n.0.meta.borrow_mut().index_of = start;
                if let Some(output) = n.0.virtual_node.borrow_mut().as_mut() {
                    output.reindex(start);
                }
            }
        }
    }

    /// Insertion index just past this node's contribution.
    ///
    /// A following sibling is placed here.
    pub fn contribution_end(&self) -> usize {
        match self {
            Node::Tag(n) => n.meta.index_of + 1,
            Node::Content(n) => n.meta.index_of + 1,
            Node::Fragment(n) => n.valid_index_of,
            Node::Component(n) => {
                let index_of = n.0.meta.borrow().index_of;
                match n.0.virtual_node.borrow().as_ref() {
                    Some(v) if !v.is_root() => v.contribution_end(),
                    _ => index_of,
                }
            }
            Node::Root(n) => n.meta.index_of,
        }
    }

    // -------------------------------------------------------------------------
    // Variant access
    // -------------------------------------------------------------------------

    pub fn as_tag(&self) -> Option<&TagNode> {
        match self {
            Node::Tag(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&ContentNode> {
        match self {
            Node::Content(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_fragment(&self) -> Option<&FragmentNode> {
        match self {
            Node::Fragment(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_root(&self) -> Option<&RootNode> {
        match self {
            Node::Root(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&Rc<ComponentCell>> {
        match self {
            Node::Component(n) => Some(&n.0),
            _ => None,
        }
    }

    /// Follow the child slot at `index`.
    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children()
            .and_then(|c| c.get(index))
            .and_then(|slot| slot.as_ref())
    }
}

/// Re-stamp `children` from `start`. Returns the index just past the last
/// child.
fn reindex_children(children: &mut Children, start: usize) -> usize {
    let mut cursor = start;
    for child in children.iter_mut().flatten() {
        if child.is_root() {
            child.reindex(0);
            continue;
        }
        child.reindex(cursor);
        cursor = child.contribution_end();
    }
    cursor
}

pub(crate) fn host_count_of(children: &Children) -> usize {
    children
        .iter()
        .flatten()
        .filter(|c| !c.is_root())
        .map(Node::host_count)
        .sum()
}

impl RootNode {
    pub fn container(&self) -> HostNodeId {
        self.container
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn tree_id(&self) -> Option<TreeId> {
        self.meta.tree_id
    }
}

impl FragmentNode {
    pub fn valid_index_of(&self) -> usize {
        self.valid_index_of
    }

    pub fn index_of(&self) -> usize {
        self.meta.index_of
    }

    pub fn children(&self) -> &Children {
        &self.children
    }
}

impl TagNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn host(&self) -> Option<HostNodeId> {
        self.host
    }

    pub fn index_of(&self) -> usize {
        self.meta.index_of
    }
}

impl ContentNode {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn host(&self) -> Option<HostNodeId> {
        self.host
    }

    pub fn index_of(&self) -> usize {
        self.meta.index_of
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Root(n) => f
                .debug_struct("Root")
                .field("container", &n.container)
                .field("children", &n.children)
                .finish(),
            Node::Fragment(n) => f
                .debug_struct("Fragment")
                .field("index_of", &n.meta.index_of)
                .field("valid_index_of", &n.valid_index_of)
                .field("children", &n.children)
                .finish(),
            Node::Tag(n) => f
                .debug_struct("Tag")
                .field("name", &n.name)
                .field("index_of", &n.meta.index_of)
                .field("host", &n.host)
                .field("children", &n.children)
                .finish(),
            Node::Content(n) => f
                .debug_struct("Content")
                .field("content", &n.content)
                .field("index_of", &n.meta.index_of)
                .finish(),
            Node::Component(n) => f
                .debug_struct("Component")
                .field("id", &n.0.id())
                .field("template", &n.0.template_name())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{content, fragment, tag};

    #[test]
    fn test_kind_is_fixed_by_constructor() {
        assert_eq!(tag("div", ()).kind(), NodeKind::Tag);
        assert_eq!(content("hi").kind(), NodeKind::Content);
        assert_eq!(fragment(vec![]).kind(), NodeKind::Fragment);
    }

    #[test]
    fn test_fragment_host_count_skips_empty_slots() {
        let f = fragment(vec![Some(tag("a", ())), None, Some(content("x"))]);
        assert_eq!(f.host_count(), 2);
    }

    #[test]
    fn test_set_index_of_refreshes_fragment_extent() {
        let mut f = fragment(vec![Some(tag("a", ())), Some(tag("b", ())), Some(tag("c", ()))]);
        f.set_index_of(2);
        assert_eq!(f.index_of(), 2);
        assert_eq!(f.contribution_end(), 5);
    }

    #[test]
    fn test_reindex_follows_sibling_contributions() {
        let mut f = fragment(vec![
            Some(fragment(vec![Some(tag("a", ())), Some(tag("b", ()))])),
            None,
            Some(content("c")),
            Some(tag("d", vec![content("inner")])),
        ]);
        f.reindex(1);

        assert_eq!(f.child(0).map(Node::index_of), Some(1));
        assert_eq!(f.child(2).map(Node::index_of), Some(3));
        assert_eq!(f.child(3).map(Node::index_of), Some(4));
        assert_eq!(f.child(3).and_then(|d| d.child(0)).map(Node::index_of), Some(0));
        assert_eq!(f.contribution_end(), 5);
    }

    #[test]
    fn test_relate_stamps_lineage() {
        let tree = TreeId::next();
        let mut child = tag("span", ());
        child.relate(Lineage {
            tree_id: Some(tree),
            tree_idx: 3,
            kind: NodeKind::Tag,
        });
        assert_eq!(child.tree_id(), Some(tree));
        assert_eq!(child.tree_idx(), 4);
        assert_eq!(child.parent().map(|p| p.kind), Some(NodeKind::Tag));
    }
}
