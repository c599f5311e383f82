//! Reconciler - Generate, diff, render and clear.
//!
//! One `Reconciler` borrows the host, the runtime services and the render
//! stack for the duration of a task. Its four phases are split across the
//! submodules:
//!
//! - [`generate`] - run a template and commit its output as the component's
//!   `virtual` subtree
//! - [`diff`] - merge a freshly built subtree into the committed one,
//!   positionally
//! - [`render`] - materialize host nodes bottom-up and attach them by index
//! - [`clear`] - tear a subtree down: host nodes, listeners, hooks, contexts
//!
//! ```text
//!            ┌──────────── diff(old, new) <───────────┐
//!            v                                       │
//! generate(component) ──> template(scope) ──> new subtree
//!            │
//!            └──> render(virtual) ──> HostRenderer ──> Task::RunEffects
//! ```

mod clear;
mod diff;
mod generate;
mod render;

use crate::engine::RenderStack;
use crate::pipeline::Runtime;
use crate::renderer::HostRenderer;

pub(crate) struct Reconciler<'a> {
    host: &'a mut dyn HostRenderer,
    runtime: &'a Runtime,
    stack: &'a mut RenderStack,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(
        host: &'a mut dyn HostRenderer,
        runtime: &'a Runtime,
        stack: &'a mut RenderStack,
    ) -> Self {
        Self {
            host,
            runtime,
            stack,
        }
    }
}
