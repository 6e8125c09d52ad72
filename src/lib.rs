//! CTA Trace
//!
//! Data model, traversal and binary codec for distributed execution
//! traces: a tree of location-scoped sub-traces, each holding a tree of
//! callables (method calls, HTTP requests, database and remote calls,
//! exceptions, log events).
//!
//! This crate provides the core implementation for the `cta-trace` CLI
//! tool.
//!
//! ## Getting Started
//!
//! ```ignore
//! use cta_trace::codec::{TraceReader, TraceWriter};
//! use cta_trace::model::{Location, MethodInvocation, Trace};
//!
//! let mut trace = Trace::new(42);
//! let web = trace.set_root(1, Location::new("web-01"))?;
//! let root = trace.set_root_callable(web, 0, MethodInvocation::new(120))?;
//! trace.add_callable(root, 5, MethodInvocation::new(40))?;
//!
//! let mut writer = TraceWriter::new(Vec::new());
//! writer.write(&trace)?;
//! let bytes = writer.into_inner()?;
//!
//! let mut reader = TraceReader::new(bytes.as_slice());
//! assert_eq!(reader.read_next()?, Some(trace));
//! ```

pub mod codec;
pub mod commands;
pub mod metrics;
pub mod model;
pub mod output;
pub mod registry;
pub mod traversal;
pub mod utils;

// Re-export the types most callers need
pub use codec::{TraceReader, TraceWriter};
pub use model::{CallableRef, Location, SubTraceRef, Trace};
pub use registry::{Registry, Signature};
pub use traversal::TreeIterator;
pub use utils::{CodecError, ModelError};
