//! Engine - Node model, component cells and hook slots.
//!
//! The engine holds the data structures the reconciler works on:
//! - Node: the five node variants and their shared positional fields
//! - Component: shared component cells and type-erased templates
//! - Capacitor: ordered, cyclically re-readable hook slot store
//! - Hooks: the `Scope` templates receive and the handles it returns
//! - Stack: the components currently generating
//!
//! # Architecture
//!
//! A tree is an owned value. Parents own their children; a component owns the
//! subtree its template last produced (its `virtual`):
//!
//! ```text
//! Root ── Tag("main") ── Component(app) ─virtual─ Fragment
//!                                                 ├── Tag("h1")
//!                                                 └── Component(list) ─virtual─ Tag("ul")
//! ```

pub mod capacitor;
pub mod component;
pub mod hooks;
pub mod node;
pub mod stack;

pub use capacitor::Capacitor;
pub use component::{ComponentCell, ComponentHandle, IntoRendered, Template};
pub use hooks::{HookSlots, Holder, Scope, State, Updater};
pub use node::{
    Children, ComponentNode, ContentNode, FragmentNode, Node, NodeMeta, ParentLink, RootNode,
    TagNode,
};
pub use stack::RenderStack;
