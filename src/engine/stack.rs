//! Render stack - components currently generating, innermost last.
//!
//! Popping a component closes the positional hook stores it filled, which
//! switches its next render from appending slots to reading them back.

use std::rc::Rc;

use super::component::ComponentCell;

#[derive(Debug, Default)]
pub struct RenderStack {
    frames: Vec<Rc<ComponentCell>>,
}

impl RenderStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a component's generation pass.
    pub fn push(&mut self, component: Rc<ComponentCell>) {
        self.frames.push(component);
    }

    /// Leave the innermost pass and close its non-empty stores.
    pub fn pop(&mut self) -> Option<Rc<ComponentCell>> {
        let component = self.frames.pop()?;
        component.hooks.borrow_mut().close();
        Some(component)
    }

    /// Component currently generating.
    pub fn current(&self) -> Option<&Rc<ComponentCell>> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
