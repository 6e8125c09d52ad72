//! Trace data model.
//!
//! A `Trace` owns its sub-traces and callables in two arenas; every
//! back-reference (parent, containing sub-trace, invoker) is an arena index.
//! Nodes are read through `SubTraceRef` and `CallableRef` views.

pub mod callable;
pub mod equality;
pub mod location;
pub mod sub_trace;
pub mod trace;
pub mod variants;
pub mod view;

// Re-export main types
pub use callable::{
    AdditionalInfo, Callable, CallableIndex, CallableKind, NestingCallable, TimedCallable, Timing,
};
pub use location::Location;
pub use sub_trace::{SubTrace, SubTraceIndex};
pub use trace::Trace;
pub use variants::{
    DatabaseInvocation, ExceptionThrow, HttpMethod, HttpRequestProcessing, LoggingInvocation,
    MethodInvocation, RemoteInvocation,
};
pub use view::{CallableRef, SubTraceRef};
