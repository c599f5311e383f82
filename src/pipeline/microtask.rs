//! Microtask queue - Deferred work drained by the embedding event loop.
//!
//! Mounting, effect execution and update flushing each run one microtask
//! after they are requested. The engine owns the queue; the host loop drains
//! it through `Engine::run_microtasks()`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Weak;

use crate::engine::ComponentCell;

use super::mount::RootId;

pub enum Task {
    /// First render of a tree created by `render_nodes`.
    Mount(RootId),
    /// Run the effects a component registered during its last render.
    RunEffects(Weak<ComponentCell>),
    /// Drain the scheduler's update queue.
    FlushUpdates,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Mount(id) => f.debug_tuple("Mount").field(id).finish(),
            Task::RunEffects(c) => f
                .debug_tuple("RunEffects")
                .field(&c.upgrade().map(|c| c.id()))
                .finish(),
            Task::FlushUpdates => f.write_str("FlushUpdates"),
        }
    }
}

#[derive(Debug, Default)]
pub struct MicrotaskQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: Task) {
        tracing::trace!(?task, "microtask queued");
        self.tasks.borrow_mut().push_back(task);
    }

    pub fn pop(&self) -> Option<Task> {
        self.tasks.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}
