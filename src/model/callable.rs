//! Callable nodes: the common part, the variant sum type and the
//! capability traits (nesting, timed) implemented per variant.

use super::sub_trace::SubTraceIndex;
use super::variants::{
    DatabaseInvocation, ExceptionThrow, HttpRequestProcessing, LoggingInvocation,
    MethodInvocation, RemoteInvocation,
};
use crate::metrics::Memo;
use crate::registry::{SignatureId, StringId};
use crate::utils::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena index of a callable inside its trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallableIndex(pub(crate) u32);

impl CallableIndex {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CallableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque extension object attached to a callable, keyed by a type name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    kind: String,
    payload: Vec<u8>,
}

impl AdditionalInfo {
    pub fn new(kind: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// Type name used for filtering
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Response time plus the memoized exclusive time of a timed callable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timing {
    pub(crate) response_time: i64,
    pub(crate) exclusive_time: Memo<i64>,
}

impl Timing {
    pub fn new(response_time: i64) -> Self {
        Self {
            response_time,
            exclusive_time: Memo::new(),
        }
    }

    pub fn response_time(&self) -> i64 {
        self.response_time
    }
}

/// Capability: the callable has ordered children (call order)
pub trait NestingCallable {
    fn children(&self) -> &[CallableIndex];
}

/// Capability: the callable carries a response time
pub trait TimedCallable {
    fn timing(&self) -> &Timing;

    fn response_time(&self) -> i64 {
        self.timing().response_time
    }
}

/// Concrete variant of a callable
#[derive(Debug, Clone, PartialEq)]
pub enum CallableKind {
    Method(MethodInvocation),
    HttpRequest(HttpRequestProcessing),
    Database(DatabaseInvocation),
    Remote(RemoteInvocation),
    Exception(ExceptionThrow),
    Logging(LoggingInvocation),
}

impl CallableKind {
    /// Stable variant name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Method(_) => "MethodInvocation",
            Self::HttpRequest(_) => "HTTPRequestProcessing",
            Self::Database(_) => "DatabaseInvocation",
            Self::Remote(_) => "RemoteInvocation",
            Self::Exception(_) => "ExceptionThrow",
            Self::Logging(_) => "LoggingInvocation",
        }
    }

    pub fn as_nesting(&self) -> Option<&dyn NestingCallable> {
        match self {
            Self::Method(m) => Some(m),
            Self::HttpRequest(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_timed(&self) -> Option<&dyn TimedCallable> {
        match self {
            Self::Method(m) => Some(m),
            Self::Database(d) => Some(d),
            Self::Remote(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_nesting(&self) -> bool {
        self.as_nesting().is_some()
    }

    pub fn is_timed(&self) -> bool {
        self.as_timed().is_some()
    }

    /// Direct children; always empty for leaf-only variants
    pub fn children(&self) -> &[CallableIndex] {
        self.as_nesting().map(|n| n.children()).unwrap_or(&[])
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<CallableIndex>> {
        match self {
            Self::Method(m) => Some(&mut m.children),
            Self::HttpRequest(h) => Some(&mut h.children),
            _ => None,
        }
    }

    /// Drop every memoized value held by this node
    pub(crate) fn reset_memos(&mut self) {
        match self {
            Self::Method(m) => {
                m.timing.exclusive_time.reset();
                m.exclusive_cpu_time.reset();
            }
            Self::Database(d) => d.timing.exclusive_time.reset(),
            Self::Remote(r) => r.timing.exclusive_time.reset(),
            _ => {}
        }
    }

    /// Strip the tree wiring so the variant can be re-attached elsewhere
    pub(crate) fn detached(mut self) -> Self {
        if let Some(children) = self.children_mut() {
            children.clear();
        }
        if let Self::Remote(r) = &mut self {
            r.target_sub_trace = None;
            r.async_invocation = false;
        }
        self.reset_memos();
        self
    }

    /// Every interned string referenced by the variant's own fields
    pub(crate) fn string_ids(&self) -> Vec<StringId> {
        match self {
            Self::Method(_) | Self::HttpRequest(_) => Vec::new(),
            Self::Database(d) => std::iter::once(d.sql_statement)
                .chain(d.db_product_name)
                .chain(d.db_product_version)
                .chain(d.db_url)
                .collect(),
            Self::Remote(r) => r.target.into_iter().collect(),
            Self::Exception(e) => e
                .error_message
                .into_iter()
                .chain(e.cause)
                .chain(e.stack_trace)
                .chain(e.throwable_type)
                .collect(),
            Self::Logging(l) => l.logging_level.into_iter().chain(l.message).collect(),
        }
    }

    pub(crate) fn signature_id(&self) -> Option<SignatureId> {
        match self {
            Self::Method(m) => m.signature,
            _ => None,
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CallableKind {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant! {
    Method => MethodInvocation,
    HttpRequest => HttpRequestProcessing,
    Database => DatabaseInvocation,
    Remote => RemoteInvocation,
    Exception => ExceptionThrow,
    Logging => LoggingInvocation,
}

/// A node of a sub-trace's call tree
#[derive(Debug, Clone)]
pub struct Callable {
    pub(crate) index: CallableIndex,
    pub(crate) parent: Option<CallableIndex>,
    pub(crate) sub_trace: SubTraceIndex,
    pub(crate) timestamp: i64,
    pub(crate) labels: Vec<StringId>,
    pub(crate) additional_information: Vec<AdditionalInfo>,
    pub(crate) kind: CallableKind,
}

impl Callable {
    pub fn index(&self) -> CallableIndex {
        self.index
    }

    /// Parent callable; `None` only for a sub-trace root
    pub fn parent(&self) -> Option<CallableIndex> {
        self.parent
    }

    pub fn containing_sub_trace(&self) -> SubTraceIndex {
        self.sub_trace
    }

    /// Entry time in milliseconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn label_ids(&self) -> &[StringId] {
        &self.labels
    }

    pub fn additional_information(&self) -> &[AdditionalInfo] {
        &self.additional_information
    }

    pub fn kind(&self) -> &CallableKind {
        &self.kind
    }

    pub fn children(&self) -> &[CallableIndex] {
        self.kind.children()
    }

    /// True for a remote invocation linked to a target sub-trace
    pub fn is_sub_trace_invocation(&self) -> bool {
        matches!(&self.kind, CallableKind::Remote(r) if r.target_sub_trace.is_some())
    }

    /// Target sub-trace of a sub-trace invocation
    pub fn target_sub_trace(&self) -> Option<SubTraceIndex> {
        match &self.kind {
            CallableKind::Remote(r) => r.target_sub_trace,
            _ => None,
        }
    }

    /// True for a sub-trace invocation marked as asynchronous
    pub fn is_async_invocation(&self) -> bool {
        matches!(&self.kind, CallableKind::Remote(r) if r.async_invocation)
    }

    pub fn response_time(&self) -> Option<i64> {
        self.kind.as_timed().map(|t| t.response_time())
    }

    /// `timestamp + response_time` for timed callables, `None` otherwise
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the sum does not fit in an `i64`
    pub fn exit_time(&self) -> ModelResult<Option<i64>> {
        let Some(rt) = self.response_time() else {
            return Ok(None);
        };
        self.timestamp.checked_add(rt).map(Some).ok_or_else(|| {
            ModelError::invalid_state(format!(
                "exit time of {} overflows (timestamp {}, response time {})",
                self.index, self.timestamp, rt
            ))
        })
    }
}
