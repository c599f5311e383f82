//! Update Pipeline
//!
//! This module connects state changes to host mutations.
//!
//! # Pipeline Architecture
//!
//! ```text
//! setter ─> Scheduler ─> Task::FlushUpdates ─> generate ─> diff ─> render ─> Task::RunEffects
//! ```
//!
//! ## Data Flow
//!
//! 1. **Scheduler** - Dedups invalidated components, schedules one flush
//! 2. **MicrotaskQueue** - Holds deferred mounts, flushes and effect runs
//! 3. **Engine** - Drains the queue, driving the reconciler against the host
//!
//! ## Key Design Principles
//!
//! - **One flush per tick**: any number of setters produce one `FlushUpdates`
//! - **Run to completion**: a task never yields mid-diff
//! - **Explicit driving**: nothing runs until the host loop calls
//!   `Engine::run_microtasks()`

pub mod microtask;
pub mod mount;
pub mod scheduler;

use std::rc::Rc;

use crate::config::EngineConfig;
use crate::state::ContextGraph;

pub use microtask::{MicrotaskQueue, Task};
pub use mount::{Engine, RootHandle, RootId};
pub use scheduler::Scheduler;

/// Shared services a render pass and the hooks it hands out need.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) scheduler: Rc<Scheduler>,
    pub(crate) contexts: Rc<ContextGraph>,
    pub(crate) tasks: Rc<MicrotaskQueue>,
    pub(crate) config: EngineConfig,
}

impl Runtime {
    pub fn new(config: EngineConfig) -> Self {
        let tasks = Rc::new(MicrotaskQueue::new());
        Self {
            scheduler: Rc::new(Scheduler::new(Rc::clone(&tasks))),
            contexts: Rc::new(ContextGraph::new()),
            tasks,
            config,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn contexts(&self) -> &ContextGraph {
        &self.contexts
    }

    pub fn tasks(&self) -> &MicrotaskQueue {
        &self.tasks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
