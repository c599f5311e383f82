//! Primitives - Node constructors and their argument types.
//!
//! This module provides one constructor per node kind:
//! - [`root`] - anchors a tree to a host container (fallible: needs children)
//! - [`fragment`] - transparent group of children
//! - [`tag`] - host element with props and children
//! - [`content`] - text leaf
//! - [`component`] / [`component_with`] - template instance with hook state
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{component, nodes, props, tag, Scope, Node};
//!
//! fn greeting(_scope: &mut Scope<'_>, name: &String) -> Node {
//!     tag("p", (props().class("greeting"), nodes![format!("hello {name}")]))
//! }
//!
//! let tree = tag("main", nodes![
//!     component_with(greeting, "ada".to_string()),
//!     "plain text becomes a content node",
//! ]);
//! ```

mod component;
mod tag;
mod types;

pub use component::{component, component_with, from_template};
pub use tag::{content, fragment, root, tag};
pub use types::*;
