//! Derived metrics over the trace model and the cell that caches them.

pub mod derived;
pub mod memo;

// Re-export main types
pub use memo::Memo;
