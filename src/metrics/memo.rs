//! Compute-once cell for derived values.

use once_cell::sync::OnceCell;
use std::fmt;

/// A lazily computed, thread-safe cached value.
///
/// A memo never takes part in equality: two nodes are equal whether or not
/// their derived values have been computed yet.
#[derive(Clone, Default)]
pub struct Memo<T>(OnceCell<T>);

impl<T> Memo<T> {
    /// Create an empty memo
    pub fn new() -> Self {
        Self(OnceCell::new())
    }

    /// Return the cached value, computing it on first access
    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        self.0.get_or_init(f)
    }

    /// Return the cached value, computing it with a fallible function.
    /// Nothing is cached when `f` fails.
    pub fn get_or_try_init<E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        self.0.get_or_try_init(f)
    }

    /// Cached value, if computed
    pub fn get(&self) -> Option<&T> {
        self.0.get()
    }

    /// Drop the cached value; only possible while the owner is mutably borrowed
    pub fn reset(&mut self) {
        self.0.take();
    }
}

impl<T> PartialEq for Memo<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Eq for Memo<T> {}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(v) => write!(f, "Memo({:?})", v),
            None => write!(f, "Memo(<pending>)"),
        }
    }
}
