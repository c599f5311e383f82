//! Capacitor - Ordered, append-only hook slot sequence.
//!
//! A component keeps one capacitor per hook family. On the first render the
//! capacitor is *open*: every hook call appends a slot. Once the render pass
//! finishes the store is *closed*, and later renders read the slots back in
//! the same order through a cyclic cursor.
//!
//! ```text
//! render 1 (open):    state(0) -> add   state("a") -> add
//! render 2 (closed):  state(_) -> get[0] state(_) -> get[1]
//! render 3 (closed):  state(_) -> get[0] state(_) -> get[1]
//! ```
//!
//! Slots are addressed purely by call order. Changing the order of hook calls
//! between renders hands each call the slot of a different hook.

use crate::error::{EngineError, Result};

#[derive(Debug)]
pub struct Capacitor<T> {
    store: Vec<T>,
    closed: bool,
    cursor: usize,
}

impl<T> Default for Capacitor<T> {
    fn default() -> Self {
        Self {
            store: Vec::new(),
            closed: false,
            cursor: 0,
        }
    }
}

impl<T> Capacitor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next slot and advance the cursor, wrapping to 0 after the
    /// last slot.
    ///
    /// Fails if the store is empty.
    pub fn get(&mut self) -> Result<&T> {
        if self.store.is_empty() {
            return Err(EngineError::hook("capacitor is empty"));
        }
        let index = self.cursor % self.store.len();
        self.cursor = (index + 1) % self.store.len();
        Ok(&self.store[index])
    }

    /// Append a slot and return a reference to it.
    ///
    /// Appends even while closed; callers honor the open/closed contract.
    pub fn add(&mut self, value: T) -> &T {
        self.store.push(value);
        let last = self.store.len() - 1;
        &self.store[last]
    }

    /// Drop every slot and reopen.
    pub fn reset(&mut self) {
        self.store.clear();
        self.closed = false;
        self.cursor = 0;
    }

    /// Take every slot out and reopen.
    pub fn drain(&mut self) -> Vec<T> {
        self.closed = false;
        self.cursor = 0;
        std::mem::take(&mut self.store)
    }

    /// Move the cursor back to the first slot.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Open or close the store. Never clears data.
    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
        self.cursor = 0;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.store.iter()
    }
}

impl<'a, T> IntoIterator for &'a Capacitor<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_open_store_appends() {
        let mut cap = Capacitor::new();
        assert!(cap.is_empty());
        assert_eq!(*cap.add(1), 1);
        assert_eq!(*cap.add(2), 2);
        assert_eq!(cap.len(), 2);
        assert!(!cap.is_closed());
    }

    #[test]
    fn test_get_cycles_in_order() {
        let mut cap = Capacitor::new();
        cap.add("a");
        cap.add("b");
        cap.add("c");
        cap.set_closed(true);

        let seen: Vec<&str> = (0..7).map(|_| *cap.get().unwrap()).collect();
        assert_eq!(seen, vec!["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn test_get_on_empty_fails() {
        let mut cap: Capacitor<i32> = Capacitor::new();
        cap.set_closed(true);
        let err = cap.get().unwrap_err();
        assert!(err.is_hook());
    }

    #[test]
    fn test_closing_keeps_data() {
        let mut cap = Capacitor::new();
        cap.add(10);
        cap.set_closed(true);
        cap.set_closed(false);
        cap.set_closed(true);
        assert_eq!(*cap.get().unwrap(), 10);
    }

    #[test]
    fn test_add_while_closed_still_appends() {
        let mut cap = Capacitor::new();
        cap.add(1);
        cap.set_closed(true);
        cap.add(2);
        assert_eq!(cap.len(), 2);
        assert!(cap.is_closed());
    }

    #[test]
    fn test_reset_reopens() {
        let mut cap = Capacitor::new();
        cap.add(1);
        cap.set_closed(true);
        cap.reset();
        assert!(cap.is_empty());
        assert!(!cap.is_closed());
    }

    #[test]
    fn test_rewind_restarts_cursor() {
        let mut cap = Capacitor::new();
        cap.add(1);
        cap.add(2);
        cap.set_closed(true);
        assert_eq!(*cap.get().unwrap(), 1);
        cap.rewind();
        assert_eq!(*cap.get().unwrap(), 1);
        assert_eq!(*cap.get().unwrap(), 2);
    }

    #[test]
    fn test_drain_takes_everything() {
        let mut cap = Capacitor::new();
        cap.add(1);
        cap.add(2);
        cap.set_closed(true);
        assert_eq!(cap.drain(), vec![1, 2]);
        assert!(cap.is_empty());
        assert!(!cap.is_closed());
    }

    proptest! {
        #[test]
        fn prop_get_is_cyclic(values in proptest::collection::vec(any::<u32>(), 1..16), reads in 0usize..64) {
            let mut cap = Capacitor::new();
            for v in &values {
                cap.add(*v);
            }
            cap.set_closed(true);
            for i in 0..reads {
                let got = *cap.get().unwrap();
                prop_assert_eq!(got, values[i % values.len()]);
            }
        }
    }
}
