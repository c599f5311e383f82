//! # spark-dom
//!
//! Component reconciliation engine for retained host trees.
//!
//! Templates are plain Rust functions that receive a [`Scope`] for hook state
//! and return a node tree. The engine diffs every new tree against the
//! committed one and patches the host through the [`HostRenderer`] trait.
//!
//! ## Architecture
//!
//! A tree is an owned value of five node kinds (`Root`, `Fragment`, `Tag`,
//! `Content`, `Component`). State changes never re-render synchronously;
//! they queue the owning component and one microtask flushes the batch:
//!
//! ```text
//! State::set ─> Scheduler ─> FlushUpdates ─> generate ─> diff ─> render ─> HostRenderer
//!                                                                   └──> RunEffects
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Ids, node kinds, events, listeners, refs
//! - [`engine`] - Node model, component cells, hook slots, render stack
//! - [`primitives`] - Node constructors and prop builders
//! - [`renderer`] - Host trait, in-memory host, prop application
//! - [`pipeline`] - Scheduler, microtask queue, mount API
//! - [`state`] - Per-tree context providers and consumers
//! - [`config`] - Engine settings
//! - [`error`] - Error type
//!
//! ## Example
//!
//! ```ignore
//! use spark_dom::{component, nodes, props, tag, Engine, MemoryHost, Node, Scope};
//!
//! fn counter(scope: &mut Scope<'_>) -> spark_dom::Result<Node> {
//!     let count = scope.state(0)?;
//!     let bump = count.clone();
//!     Ok(tag("button", (
//!         props().on("click", move |_| bump.update(|n| n + 1)),
//!         nodes![count.get().to_string()],
//!     )))
//! }
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container();
//! let mut engine = Engine::new(host);
//! engine.render_nodes(container, nodes![component(counter)])?;
//! engine.run_microtasks();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub(crate) mod reconcile;
pub mod renderer;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::EngineConfig;
pub use error::{EngineError, Result};

pub use engine::{
    Children, ComponentHandle, Holder, IntoRendered, Node, Scope, State, Template, Updater,
};

pub use primitives::{
    Child, Cleanup, PropValue, Props, Style, TagArgs, component, component_with, content,
    fragment, from_template, props, root, tag,
};

pub use renderer::{HostRenderer, MemoryHost, Mutation};

pub use pipeline::{Engine, RootHandle, RootId, Runtime};

pub use state::{ContextGraph, ContextHandle, Provider};
