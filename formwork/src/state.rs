use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Shared cell for state derived from a form, such as a field's current
/// message.
///
/// `State<T>` is cheap to clone and every clone sees the same value, so a
/// watcher closure can hold one clone and the owner another. A dirty flag
/// records writes since the last [`clear_dirty`](Self::clear_dirty).
///
/// # Example
///
/// ```
/// use formwork::State;
///
/// let message = State::new(String::new());
/// let writer = message.clone();
/// writer.set("Please enter your email address".to_string());
///
/// assert!(message.is_dirty());
/// assert_eq!(message.get(), "Please enter your email address");
/// message.clear_dirty();
/// assert!(!message.is_dirty());
/// ```
pub struct State<T> {
    inner: Rc<RefCell<T>>,
    dirty: Rc<Cell<bool>>,
}

impl<T> State<T> {
    /// Create a new state with the given value
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
            dirty: Rc::new(Cell::new(false)),
        }
    }

    /// Get a clone of the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.borrow().clone()
    }

    /// Set a new value
    pub fn set(&self, value: T) {
        *self.inner.borrow_mut() = value;
        self.dirty.set(true);
    }

    /// Update the value using a closure
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        f(&mut self.inner.borrow_mut());
        self.dirty.set(true);
    }

    /// Read the value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// Check if the state has been modified since last check
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Clear the dirty flag
    pub fn clear_dirty(&self) {
        self.dirty.set(false);
    }
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            dirty: Rc::clone(&self.dirty),
        }
    }
}

impl<T: Default> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &*self.inner.borrow())
            .field("dirty", &self.dirty.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_value() {
        let a = State::new(1);
        let b = a.clone();
        b.update(|v| *v += 1);
        assert_eq!(a.get(), 2);
        assert!(a.is_dirty());
    }

    #[test]
    fn test_with_borrows() {
        let state = State::new(vec![1, 2, 3]);
        assert_eq!(state.with(|v| v.len()), 3);
        assert!(!state.is_dirty());
    }
}
