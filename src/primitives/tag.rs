//! Structural constructors: `root`, `fragment`, `tag`, `content`.
//!
//! Constructors only build values. Nothing is linked into a tree or written
//! to the host until the node is rendered.

use std::collections::HashMap;

use crate::engine::{Children, ContentNode, FragmentNode, Node, NodeMeta, RootNode, TagNode};
use crate::error::{EngineError, Result};
use crate::types::{HostNodeId, TreeId};

use super::types::{Props, TagArgs};

/// Anchor `children` to the host `container`, allocating a fresh tree
/// identity.
///
/// Fails when `children` is empty.
pub fn root(container: HostNodeId, children: Children) -> Result<Node> {
    if children.is_empty() {
        return Err(EngineError::structural("a root needs at least one child"));
    }
    Ok(Node::Root(RootNode {
        meta: NodeMeta {
            tree_id: Some(TreeId::next()),
            ..NodeMeta::default()
        },
        container,
        children,
    }))
}

/// Transparent group of children.
pub fn fragment(children: Children) -> Node {
    Node::Fragment(FragmentNode {
        meta: NodeMeta::default(),
        children,
        valid_index_of: 0,
    })
}

/// Element named `name`.
///
/// ```ignore
/// tag("br", ());
/// tag("a", props().attr("href", "/"));
/// tag("ul", nodes![tag("li", ()), tag("li", ())]);
/// tag("p", (props().class("lead"), nodes!["hello"]));
/// ```
pub fn tag(name: impl Into<String>, args: impl Into<TagArgs>) -> Node {
    let TagArgs { props, children } = args.into();
    Node::Tag(TagNode {
        meta: NodeMeta::default(),
        name: name.into(),
        props,
        children,
        host: None,
        applied: Props::default(),
        listeners: HashMap::new(),
    })
}

/// Text leaf.
pub fn content(text: impl Into<String>) -> Node {
    Node::Content(ContentNode {
        meta: NodeMeta::default(),
        content: text.into(),
        host: None,
        dirty: false,
    })
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        content(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        content(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes;
    use crate::primitives::props;

    #[test]
    fn test_root_requires_children() {
        let err = root(HostNodeId(0), Vec::new()).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_roots_get_distinct_tree_ids() {
        let a = root(HostNodeId(0), nodes!["a"]).unwrap();
        let b = root(HostNodeId(0), nodes!["b"]).unwrap();
        assert!(a.tree_id().is_some());
        assert_ne!(a.tree_id(), b.tree_id());
    }

    #[test]
    fn test_tag_accepts_props_and_children() {
        let node = tag("p", (props().attr("id", "intro"), nodes!["hi", tag("b", ())]));
        let t = node.as_tag().unwrap();
        assert_eq!(t.name(), "p");
        assert_eq!(t.props().len(), 1);
        assert_eq!(t.children().len(), 2);
        assert!(t.host().is_none());
    }

    #[test]
    fn test_constructors_do_not_link() {
        let node = tag("div", nodes!["x"]);
        assert!(node.tree_id().is_none());
        assert!(node.parent().is_none());
        assert!(node.child(0).and_then(|c| c.parent()).is_none());
    }
}
