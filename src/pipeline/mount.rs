//! Mount API - Engine lifecycle and the microtask loop.
//!
//! This module provides the entry point for mounting node trees into a host.
//! `render_nodes` builds a `Root` and defers its first render by one
//! microtask; the embedding event loop then drives every deferred task
//! (mounts, update flushes, effects) through `run_microtasks`.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{Engine, MemoryHost, component, nodes};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container();
//! let mut engine = Engine::new(host);
//!
//! // Mount the application
//! let root = engine.render_nodes(container, nodes![component(app)])?;
//!
//! // Drive deferred work from your loop
//! while engine.has_pending_microtasks() {
//!     engine.run_microtasks();
//! }
//!
//! // Clean up
//! engine.unmount(root);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::EngineConfig;
use crate::engine::{Children, ComponentCell, Node, RenderStack};
use crate::error::Result;
use crate::primitives::root;
use crate::reconcile::Reconciler;
use crate::renderer::HostRenderer;
use crate::renderer::props::validate_tree;
use crate::types::{HostNodeId, NodeFlags, TreeId};

use super::Runtime;
use super::microtask::Task;

// =============================================================================
// Root Handle
// =============================================================================

/// Identity of a mounted tree within one engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootId(u64);

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root#{}", self.0)
    }
}

/// Handle returned by `render_nodes`, used to inspect or unmount the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootHandle {
    id: RootId,
    tree_id: TreeId,
    container: HostNodeId,
}

impl RootHandle {
    pub fn id(&self) -> RootId {
        self.id
    }

    pub fn tree_id(&self) -> TreeId {
        self.tree_id
    }

    pub fn container(&self) -> HostNodeId {
        self.container
    }
}

struct MountedRoot {
    node: Node,
    container: HostNodeId,
    mounted: bool,
}

// =============================================================================
// Engine
// =============================================================================

/// Owns the host, the mounted trees and the runtime services.
pub struct Engine<H: HostRenderer> {
    host: H,
    runtime: Runtime,
    stack: RenderStack,
    roots: BTreeMap<RootId, MountedRoot>,
    next_root: u64,
}

impl<H: HostRenderer> Engine<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: H, config: EngineConfig) -> Self {
        Self {
            host,
            runtime: Runtime::new(config),
            stack: RenderStack::new(),
            roots: BTreeMap::new(),
            next_root: 0,
        }
    }

    /// Build a `Root` over `children` in `container` and schedule its first
    /// render on the next microtask.
    ///
    /// Fails synchronously when `children` is empty or a tag outside any
    /// component carries a malformed prop.
    pub fn render_nodes(&mut self, container: HostNodeId, children: Children) -> Result<RootHandle> {
        let node = root(container, children)?;
        validate_tree(&node)?;

        let tree_id = node.tree_id().unwrap_or_else(TreeId::next);
        let id = RootId(self.next_root);
        self.next_root += 1;
        self.roots.insert(
            id,
            MountedRoot {
                node,
                container,
                mounted: false,
            },
        );
        self.runtime.tasks.push(Task::Mount(id));
        tracing::debug!(root = %id, tree = %tree_id, %container, "mount scheduled");

        Ok(RootHandle {
            id,
            tree_id,
            container,
        })
    }

    /// Tear down a tree: host nodes, listeners, hooks, context links.
    ///
    /// Returns false when the handle was already unmounted.
    pub fn unmount(&mut self, handle: RootHandle) -> bool {
        let Some(entry) = self.roots.remove(&handle.id) else {
            return false;
        };
        let mut reconciler = Reconciler::new(&mut self.host, &self.runtime, &mut self.stack);
        reconciler.clear_node(entry.node, true);
        tracing::debug!(root = %handle.id, "unmounted");
        true
    }

    // -------------------------------------------------------------------------
    // Microtasks
    // -------------------------------------------------------------------------

    /// Run queued microtasks, including those queued while running, up to
    /// the configured budget. Returns how many ran.
    pub fn run_microtasks(&mut self) -> usize {
        let budget = self.runtime.config.microtask_budget;
        let mut ran = 0;
        while ran < budget {
            let Some(task) = self.runtime.tasks.pop() else {
                break;
            };
            self.run_task(task);
            ran += 1;
        }
        if !self.runtime.tasks.is_empty() {
            tracing::warn!(
                budget,
                pending = self.runtime.tasks.len(),
                "microtask budget exhausted, yielding to host loop"
            );
        }
        ran
    }

    pub fn has_pending_microtasks(&self) -> bool {
        !self.runtime.tasks.is_empty()
    }

    /// Components waiting for the next update flush.
    pub fn pending_updates(&self) -> usize {
        self.runtime.scheduler.len()
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Mount(id) => self.mount(id),
            Task::RunEffects(component) => run_effects(&component),
            Task::FlushUpdates => self.flush_updates(),
        }
    }

    fn mount(&mut self, id: RootId) {
        let Some(entry) = self.roots.get_mut(&id) else {
            tracing::debug!(root = %id, "mount skipped, root already unmounted");
            return;
        };
        if entry.mounted {
            return;
        }
        entry.mounted = true;

        let mut reconciler = Reconciler::new(&mut self.host, &self.runtime, &mut self.stack);
        if let Err(err) = reconciler.render(&mut entry.node, entry.container) {
            tracing::error!(root = %id, error = %err, "initial render failed");
        }
    }

    /// Regenerate and re-render every queued component in insertion order.
    fn flush_updates(&mut self) {
        let scheduler = Rc::clone(&self.runtime.scheduler);
        scheduler.begin_flush();

        let mut reconciler = Reconciler::new(&mut self.host, &self.runtime, &mut self.stack);
        let budget = self.runtime.config.microtask_budget;
        let mut flushed = 0usize;
        while let Some(component) = scheduler.pop() {
            if flushed == budget {
                tracing::warn!(budget, "update flush budget exhausted, deferring the rest");
                scheduler.requeue_front(component);
                break;
            }
            if component.is_deleted() {
                component.remove_flags(NodeFlags::NEEDS_REHYDRATE);
                continue;
            }
            if !component.needs_rehydrate() {
                continue;
            }
            let before = component.host_count();
            if reconciler.generate_tree(&component) {
                if let Err(err) = reconciler.render_component(&component, None) {
                    tracing::error!(component = %component.id(), error = %err, "update render failed");
                }
            }
            component.remove_flags(NodeFlags::NEEDS_REHYDRATE);
            flushed += 1;

            // Later siblings start at a different host index now.
            let after = component.host_count();
            if after != before {
                tracing::trace!(component = %component.id(), before, after, "host count changed, reindexing");
                for entry in self.roots.values_mut().filter(|e| e.mounted) {
                    entry.node.reindex(0);
                }
            }
        }
        tracing::debug!(flushed, "update flush complete");
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn is_mounted(&self, handle: RootHandle) -> bool {
        self.roots.get(&handle.id).is_some_and(|r| r.mounted)
    }

    /// Inspect the committed `Root` node of a tree.
    pub fn with_root<R>(&self, handle: RootHandle, f: impl FnOnce(&Node) -> R) -> Option<R> {
        self.roots.get(&handle.id).map(|r| f(&r.node))
    }
}

/// Run the effects `component` registered during its last render, keeping
/// any cleanups they return.
fn run_effects(component: &Weak<ComponentCell>) {
    let Some(component) = component.upgrade() else {
        return;
    };
    if component.is_deleted() {
        tracing::warn!(component = %component.id(), "effects skipped, component was cleared");
        return;
    }
    let effects = component.hooks.borrow_mut().effect.drain();
    for effect in effects {
        if let Some(cleanup) = effect() {
            component.hooks.borrow_mut().clean_up.add(cleanup);
        }
    }
}

impl<H: HostRenderer + fmt::Debug> fmt::Debug for Engine<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("host", &self.host)
            .field("roots", &self.roots.len())
            .field("runtime", &self.runtime)
            .finish()
    }
}
