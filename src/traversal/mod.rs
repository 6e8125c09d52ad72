//! Depth-tracking pre-order iterators.
//!
//! All iterators keep an explicit stack of sibling cursors instead of
//! recursing, so traversal depth is bounded by memory only. The tree must
//! not change while an iterator is alive, which the borrow of `&Trace`
//! enforces.

pub mod callables;
pub mod sub_traces;
pub mod trace;

// Re-export main types
pub use callables::CallableIter;
pub use sub_traces::SubTraceIter;
pub use trace::TraceCallableIter;

use crate::utils::error::{ModelError, ModelResult};

/// An iterator that also reports the depth of the element it produced last
pub trait TreeIterator: Iterator {
    /// Depth of the most recently produced element (root is 0).
    /// Returns 0 before the first element.
    fn current_depth(&self) -> usize;

    /// Like `next`, but running past the end is an error
    ///
    /// # Errors
    /// * `ModelError::IteratorExhausted` - no element is left
    fn try_next(&mut self) -> ModelResult<Self::Item> {
        self.next().ok_or(ModelError::IteratorExhausted)
    }
}
