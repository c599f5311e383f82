//! Primitive Types - Props, style maps and constructor arguments.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::rc::Rc;

use crate::engine::{Children, Node};
use crate::types::{Event, Listener, NodeRef};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup returned by an effect. Runs before the component's next
/// generation, or when it is cleared.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Style
// =============================================================================

/// Inline style declarations, diffed property by property.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style(BTreeMap<String, String>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Style::insert`].
    pub fn set(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(property, value);
        self
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.0.remove(property)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Style {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// =============================================================================
// Prop Values
// =============================================================================

/// One entry of a tag's property map.
#[derive(Clone)]
pub enum PropValue {
    /// Plain attribute, or a live property for `value` / `className`.
    Attr(String),
    /// Boolean attribute: present when true, absent when false.
    Flag(bool),
    /// Only valid under the `style` key.
    Style(Style),
    /// Only valid under `on*` keys.
    Listener(Listener),
    /// Only valid under the `ref` key.
    Ref(NodeRef),
}

impl PropValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropValue::Attr(_) => "attribute",
            PropValue::Flag(_) => "flag",
            PropValue::Style(_) => "style",
            PropValue::Listener(_) => "listener",
            PropValue::Ref(_) => "ref",
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Attr(a), PropValue::Attr(b)) => a == b,
            (PropValue::Flag(a), PropValue::Flag(b)) => a == b,
            (PropValue::Style(a), PropValue::Style(b)) => a == b,
            (PropValue::Listener(a), PropValue::Listener(b)) => Rc::ptr_eq(a, b),
            (PropValue::Ref(a), PropValue::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Attr(v) => f.debug_tuple("Attr").field(v).finish(),
            PropValue::Flag(v) => f.debug_tuple("Flag").field(v).finish(),
            PropValue::Style(v) => f.debug_tuple("Style").field(v).finish(),
            PropValue::Listener(_) => f.write_str("Listener(..)"),
            PropValue::Ref(v) => f.debug_tuple("Ref").field(v).finish(),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Attr(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Attr(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Flag(value)
    }
}

impl From<Style> for PropValue {
    fn from(value: Style) -> Self {
        PropValue::Style(value)
    }
}

impl From<NodeRef> for PropValue {
    fn from(value: NodeRef) -> Self {
        PropValue::Ref(value)
    }
}

impl From<Listener> for PropValue {
    fn from(value: Listener) -> Self {
        PropValue::Listener(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Property map of a `Tag`.
///
/// Reserved keys: `ref` (a [`NodeRef`]), `style` (a [`Style`]), `on<event>`
/// (a listener), `className` and `value` (live properties).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props(BTreeMap<String, PropValue>);

/// Empty [`Props`] builder.
pub fn props() -> Props {
    Props::default()
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), PropValue::Attr(value.into()));
        self
    }

    pub fn flag(mut self, key: impl Into<String>, on: bool) -> Self {
        self.0.insert(key.into(), PropValue::Flag(on));
        self
    }

    /// Listener for `event` (stored under `on<event>`).
    pub fn on(mut self, event: &str, f: impl Fn(&Event) + 'static) -> Self {
        self.0
            .insert(format!("on{event}"), PropValue::Listener(Rc::new(f)));
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("className", class)
    }

    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value)
    }

    pub fn style(mut self, style: Style) -> Self {
        self.0.insert("style".to_string(), PropValue::Style(style));
        self
    }

    pub fn node_ref(mut self, node_ref: &NodeRef) -> Self {
        self.0
            .insert("ref".to_string(), PropValue::Ref(node_ref.clone()));
        self
    }

    /// Raw entry, unchecked until the tag is rendered.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Option<PropValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PropValue> {
        self.0.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, PropValue> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Props {
    type Item = (&'a String, &'a PropValue);
    type IntoIter = btree_map::Iter<'a, String, PropValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Tag Arguments
// =============================================================================

/// Optional props and children accepted by [`tag`](super::tag).
#[derive(Default)]
pub struct TagArgs {
    pub props: Props,
    pub children: Children,
}

impl From<()> for TagArgs {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Props> for TagArgs {
    fn from(props: Props) -> Self {
        Self {
            props,
            children: Vec::new(),
        }
    }
}

impl From<Children> for TagArgs {
    fn from(children: Children) -> Self {
        Self {
            props: Props::default(),
            children,
        }
    }
}

impl From<Vec<Node>> for TagArgs {
    fn from(children: Vec<Node>) -> Self {
        Self::from(children.into_iter().map(Some).collect::<Children>())
    }
}

impl From<(Props, Children)> for TagArgs {
    fn from((props, children): (Props, Children)) -> Self {
        Self { props, children }
    }
}

impl From<(Props, Vec<Node>)> for TagArgs {
    fn from((props, children): (Props, Vec<Node>)) -> Self {
        Self {
            props,
            children: children.into_iter().map(Some).collect(),
        }
    }
}

// =============================================================================
// Child Coercion
// =============================================================================

/// One child slot; strings become `Content` leaves.
pub struct Child(pub Option<Node>);

impl Child {
    pub fn into_inner(self) -> Option<Node> {
        self.0
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child(Some(node))
    }
}

impl From<Option<Node>> for Child {
    fn from(node: Option<Node>) -> Self {
        Child(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child(Some(super::content(text)))
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child(Some(super::content(text)))
    }
}

/// Build a [`Children`] list, coercing each item through [`Child`].
///
/// ```ignore
/// let children = nodes![tag("b", ()), "plain text", None];
/// ```
#[macro_export]
macro_rules! nodes {
    () => {
        ::std::vec::Vec::<::std::option::Option<$crate::Node>>::new()
    };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::primitives::Child::from($child).into_inner()),+]
    };
}
