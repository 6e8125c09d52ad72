//! Interning of strings and method signatures.
//!
//! Every trace owns one registry. Nodes store `StringId`/`SignatureId`
//! handles instead of repeating the same method, class or SQL text
//! thousands of times in loop-heavy traces.

pub mod interner;
pub mod signature;

// Re-export main types
pub use interner::{FxBuildHasher, Registry, StringId};
pub use signature::{Signature, SignatureId, SignatureKey};
