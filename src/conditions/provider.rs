//! Value providers: pull-based sources of condition inputs.

use std::cell::Cell;
use std::rc::Rc;

/// Produces a value of type `T` on demand.
///
/// Reading must not have side effects observable by the condition; a
/// provider may read live external state and return a different value on
/// each call.
pub trait ValueProvider<T> {
    /// Read the current value.
    fn value(&self) -> T;
}

/// A provider shared between several conditions.
pub type SharedProvider<T> = Rc<dyn ValueProvider<T>>;

impl<T, P: ValueProvider<T> + ?Sized> ValueProvider<T> for Rc<P> {
    fn value(&self) -> T {
        (**self).value()
    }
}

/// Always returns the same value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constant<T>(pub T);

impl<T: Clone> ValueProvider<T> for Constant<T> {
    fn value(&self) -> T {
        self.0.clone()
    }
}

/// A live value cell, typically a property of a game object.
///
/// Clones share the cell: writes through one clone are seen by every
/// provider built from it.
#[derive(Clone, Debug, Default)]
pub struct Variable<T: Copy> {
    cell: Rc<Cell<T>>,
}

impl<T: Copy> Variable<T> {
    /// Create a variable with an initial value.
    pub fn new(initial: T) -> Self {
        Self {
            cell: Rc::new(Cell::new(initial)),
        }
    }

    /// Overwrite the value.
    pub fn set(&self, value: T) {
        self.cell.set(value);
    }

    /// Read the value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.get()
    }
}

impl<T: Copy> ValueProvider<T> for Variable<T> {
    fn value(&self) -> T {
        self.cell.get()
    }
}

/// Provider backed by a closure.
pub struct FnProvider<F>(pub F);

impl<T, F: Fn() -> T> ValueProvider<T> for FnProvider<F> {
    fn value(&self) -> T {
        (self.0)()
    }
}

impl<F> std::fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnProvider(..)")
    }
}
