//! Shared harness for the integration tests.
//!
//! Templates hand their hook handles back to the test through `Slot`s passed
//! in as props, so a test can drive re-renders from outside the tree.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use spark_dom::{Children, Engine, EngineConfig, HostNodeId, MemoryHost, RootHandle};

pub type Slot<T> = Rc<RefCell<Option<T>>>;

pub fn slot<T>() -> Slot<T> {
    Rc::new(RefCell::new(None))
}

pub fn fill<T: Clone>(slot: &Slot<T>, value: &T) {
    *slot.borrow_mut() = Some(value.clone());
}

pub fn grab<T: Clone>(slot: &Slot<T>) -> T {
    slot.borrow().clone().expect("slot is filled by the first render")
}

pub struct Mounted {
    pub engine: Engine<MemoryHost>,
    pub container: HostNodeId,
    pub handle: RootHandle,
}

impl Mounted {
    pub fn host(&self) -> &MemoryHost {
        self.engine.host()
    }

    pub fn markup(&self) -> String {
        self.engine.host().to_markup(self.container)
    }

    /// Run every pending microtask. Returns how many ran.
    pub fn flush(&mut self) -> usize {
        self.engine.run_microtasks()
    }

    /// Host children of the container.
    pub fn top(&self) -> Vec<HostNodeId> {
        self.engine.host().children_of(self.container).to_vec()
    }

    pub fn clear_journal(&mut self) {
        self.engine.host_mut().clear_journal();
    }
}

/// Mount `children` into a fresh `MemoryHost` and run the mount microtask.
pub fn mount(children: Children) -> Mounted {
    mount_with(EngineConfig::default(), children)
}

pub fn mount_with(config: EngineConfig, children: Children) -> Mounted {
    let mut host = MemoryHost::new();
    let container = host.create_container();
    let mut engine = Engine::with_config(host, config);
    let handle = engine
        .render_nodes(container, children)
        .expect("tree is well formed");
    engine.run_microtasks();
    Mounted {
        engine,
        container,
        handle,
    }
}
