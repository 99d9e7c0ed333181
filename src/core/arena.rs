//! Index-stable object table with short-lived borrows.
//!
//! Slots hold `Rc<T>`. Lookups clone the `Rc` out and release the table
//! borrow immediately, so code running inside one object's hook can still
//! insert, remove or look up other objects in the same table.
//!
//! Indices are never reused, so a stale id can never alias a newer object.
//! The price is that removal only empties a slot: the backing `Vec` grows by
//! one entry per insertion for the lifetime of the table.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: RefCell<Vec<Option<Rc<T>>>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
        }
    }
}

impl<T> Arena<T> {
    /// Insert a value, returning its slot index. Indices are never reused.
    pub(crate) fn insert(&self, value: T) -> u32 {
        let mut slots = self.slots.borrow_mut();
        let index = slots.len() as u32;
        slots.push(Some(Rc::new(value)));
        index
    }

    pub(crate) fn get(&self, index: u32) -> Option<Rc<T>> {
        self.slots.borrow().get(index as usize).and_then(Clone::clone)
    }

    pub(crate) fn remove(&self, index: u32) -> Option<Rc<T>> {
        self.slots
            .borrow_mut()
            .get_mut(index as usize)
            .and_then(Option::take)
    }

    pub(crate) fn contains(&self, index: u32) -> bool {
        self.slots
            .borrow()
            .get(index as usize)
            .is_some_and(Option::is_some)
    }

    /// Indices of live slots, in insertion order.
    pub(crate) fn indices(&self) -> Vec<u32> {
        self.slots
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| index as u32)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.borrow().iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let arena = Arena::default();
        let a = arena.insert("a");
        let b = arena.insert("b");

        assert_eq!(arena.get(a).as_deref(), Some(&"a"));
        assert_eq!(arena.len(), 2);

        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
        assert_eq!(arena.indices(), vec![b]);
    }

    #[test]
    fn test_indices_not_reused() {
        let arena = Arena::default();
        let a = arena.insert(1);
        arena.remove(a);
        let b = arena.insert(2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_insert_while_holding_entry() {
        let arena = Arena::default();
        let a = arena.insert(RefCell::new(1));
        let held = arena.get(a).unwrap();
        let mut guard = held.borrow_mut();
        *guard += 1;
        let b = arena.insert(RefCell::new(10));
        assert_eq!(*arena.get(b).unwrap().borrow(), 10);
    }
}
