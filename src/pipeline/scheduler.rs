//! Update scheduler - Coalesces invalidated components into one flush.
//!
//! ```text
//! set() ──> enqueue(c) ── already queued? ── yes ──> (no-op)
//!                │
//!                └─ no ──> push c ── batch scheduled? ── no ──> Task::FlushUpdates
//! ```
//!
//! However many setters fire before the flush, each component is generated
//! at most once per flush.

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::engine::ComponentCell;
use crate::types::{ComponentId, NodeFlags};

use super::microtask::{MicrotaskQueue, Task};

#[derive(Debug)]
pub struct Scheduler {
    queue: RefCell<VecDeque<Rc<ComponentCell>>>,
    queued: RefCell<HashSet<ComponentId>>,
    batch_scheduled: Cell<bool>,
    tasks: Rc<MicrotaskQueue>,
}

impl Scheduler {
    pub fn new(tasks: Rc<MicrotaskQueue>) -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            queued: RefCell::new(HashSet::new()),
            batch_scheduled: Cell::new(false),
            tasks,
        }
    }

    /// Mark `component` dirty and queue it for the next flush.
    pub fn enqueue(&self, component: &Rc<ComponentCell>) {
        if component.is_deleted() {
            return;
        }
        component.insert_flags(NodeFlags::NEEDS_REHYDRATE);
        if !self.queued.borrow_mut().insert(component.id()) {
            return;
        }
        self.queue.borrow_mut().push_back(Rc::clone(component));
        tracing::debug!(component = %component.id(), "component queued for update");

        if !self.batch_scheduled.get() {
            self.batch_scheduled.set(true);
            self.tasks.push(Task::FlushUpdates);
        }
    }

    /// Drop a pending entry and clear the dirty flag.
    pub fn cancel(&self, component: &ComponentCell) {
        component.remove_flags(NodeFlags::NEEDS_REHYDRATE);
        let id = component.id();
        if self.queued.borrow_mut().remove(&id) {
            self.queue.borrow_mut().retain(|c| c.id() != id);
        }
    }

    pub fn is_queued(&self, id: ComponentId) -> bool {
        self.queued.borrow().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Start a flush. Later enqueues schedule a fresh batch.
    pub(crate) fn begin_flush(&self) {
        self.batch_scheduled.set(false);
    }

    /// Put a popped component back at the head and make sure a flush is
    /// scheduled for it.
    pub(crate) fn requeue_front(&self, component: Rc<ComponentCell>) {
        if self.queued.borrow_mut().insert(component.id()) {
            self.queue.borrow_mut().push_front(component);
        }
        if !self.batch_scheduled.get() {
            self.batch_scheduled.set(true);
            self.tasks.push(Task::FlushUpdates);
        }
    }

    /// Next component in insertion order.
    pub(crate) fn pop(&self) -> Option<Rc<ComponentCell>> {
        let component = self.queue.borrow_mut().pop_front()?;
        self.queued.borrow_mut().remove(&component.id());
        Some(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Node, Scope, Template};
    use crate::primitives::tag;

    fn blank(_scope: &mut Scope<'_>) -> Node {
        tag("div", ())
    }

    fn cell() -> Rc<ComponentCell> {
        Rc::new(ComponentCell::new(Template::new(blank), None))
    }

    #[test]
    fn test_enqueue_dedups_and_schedules_once() {
        let tasks = Rc::new(MicrotaskQueue::new());
        let scheduler = Scheduler::new(tasks.clone());
        let (a, b) = (cell(), cell());

        scheduler.enqueue(&a);
        scheduler.enqueue(&a);
        scheduler.enqueue(&b);

        assert_eq!(scheduler.len(), 2);
        assert_eq!(tasks.len(), 1);
        assert!(a.needs_rehydrate());
    }

    #[test]
    fn test_pop_preserves_insertion_order() {
        let scheduler = Scheduler::new(Rc::new(MicrotaskQueue::new()));
        let (a, b) = (cell(), cell());
        scheduler.enqueue(&b);
        scheduler.enqueue(&a);

        assert_eq!(scheduler.pop().map(|c| c.id()), Some(b.id()));
        assert_eq!(scheduler.pop().map(|c| c.id()), Some(a.id()));
        assert!(!scheduler.is_queued(a.id()));
    }

    #[test]
    fn test_cancel_clears_entry_and_flag() {
        let scheduler = Scheduler::new(Rc::new(MicrotaskQueue::new()));
        let a = cell();
        scheduler.enqueue(&a);
        scheduler.cancel(&a);

        assert!(scheduler.is_empty());
        assert!(!scheduler.is_queued(a.id()));
        assert!(!a.needs_rehydrate());
    }

    #[test]
    fn test_deleted_components_are_ignored() {
        let tasks = Rc::new(MicrotaskQueue::new());
        let scheduler = Scheduler::new(tasks.clone());
        let a = cell();
        a.insert_flags(NodeFlags::DELETED);
        scheduler.enqueue(&a);

        assert!(scheduler.is_empty());
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_new_batch_after_begin_flush() {
        let tasks = Rc::new(MicrotaskQueue::new());
        let scheduler = Scheduler::new(tasks.clone());
        scheduler.enqueue(&cell());
        tasks.pop();
        scheduler.begin_flush();
        scheduler.pop();

        scheduler.enqueue(&cell());
        assert_eq!(tasks.len(), 1);
    }
}
