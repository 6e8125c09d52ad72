//! Borrowed read views over the arena.
//!
//! A view pairs a node with its owning trace so that relatives, interned
//! strings and derived metrics can be reached from the node itself.

use super::callable::{AdditionalInfo, Callable, CallableIndex, CallableKind};
use super::location::Location;
use super::sub_trace::{SubTrace, SubTraceIndex};
use super::trace::Trace;
use crate::registry::{Signature, StringId};
use crate::utils::error::{ModelError, ModelResult};

/// Read view of one callable
#[derive(Debug, Clone, Copy)]
pub struct CallableRef<'a> {
    trace: &'a Trace,
    node: &'a Callable,
}

impl<'a> CallableRef<'a> {
    pub(crate) fn new(trace: &'a Trace, node: &'a Callable) -> Self {
        Self { trace, node }
    }

    pub fn trace(&self) -> &'a Trace {
        self.trace
    }

    /// Underlying arena node
    pub fn node(&self) -> &'a Callable {
        self.node
    }

    pub fn index(&self) -> CallableIndex {
        self.node.index
    }

    pub fn kind(&self) -> &'a CallableKind {
        &self.node.kind
    }

    pub fn timestamp(&self) -> i64 {
        self.node.timestamp
    }

    pub fn response_time(&self) -> Option<i64> {
        self.node.response_time()
    }

    pub fn exit_time(&self) -> ModelResult<Option<i64>> {
        self.node.exit_time()
    }

    pub fn is_sub_trace_invocation(&self) -> bool {
        self.node.is_sub_trace_invocation()
    }

    pub fn is_async_invocation(&self) -> bool {
        self.node.is_async_invocation()
    }

    pub fn parent(&self) -> Option<CallableRef<'a>> {
        self.node
            .parent
            .map(|idx| CallableRef::new(self.trace, self.trace.callable_node(idx)))
    }

    pub fn containing_sub_trace(&self) -> SubTraceRef<'a> {
        SubTraceRef::new(self.trace, self.trace.sub_trace_node(self.node.sub_trace))
    }

    /// Direct children in call order
    pub fn children(&self) -> impl ExactSizeIterator<Item = CallableRef<'a>> + 'a {
        let trace = self.trace;
        self.node
            .children()
            .iter()
            .map(move |idx| CallableRef::new(trace, trace.callable_node(*idx)))
    }

    /// Sub-trace invoked by this remote invocation
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - the callable is not a sub-trace invocation
    pub fn target_sub_trace(&self) -> ModelResult<SubTraceRef<'a>> {
        self.node
            .target_sub_trace()
            .map(|idx| SubTraceRef::new(self.trace, self.trace.sub_trace_node(idx)))
            .ok_or_else(|| {
                ModelError::invalid_state(format!(
                    "{} {} is not a sub-trace invocation",
                    self.node.kind.type_name(),
                    self.node.index
                ))
            })
    }

    /// Resolve an interned string of this callable's trace
    pub fn text(&self, id: StringId) -> ModelResult<Option<&'a str>> {
        self.trace.registry.resolve_string(id)
    }

    /// Resolved labels in insertion order
    pub fn labels(&self) -> ModelResult<Vec<&'a str>> {
        self.node
            .labels
            .iter()
            .map(|id| Ok(self.text(*id)?.unwrap_or_default()))
            .collect()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.trace
            .registry
            .find_string(Some(label))
            .map_or(false, |id| self.node.labels.contains(&id))
    }

    /// Extension objects of the given type name
    pub fn additional_information_of<'k>(
        &self,
        kind: &'k str,
    ) -> impl Iterator<Item = &'a AdditionalInfo> + 'k
    where
        'a: 'k,
    {
        self.node
            .additional_information
            .iter()
            .filter(move |info| info.kind() == kind)
    }

    /// Resolved signature of a method invocation
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - not a method, or no signature was set
    /// * `ModelError::NotRegistered` - the signature id is unknown
    pub fn signature(&self) -> ModelResult<Signature> {
        match &self.node.kind {
            CallableKind::Method(m) => match m.signature {
                Some(id) => self.trace.registry.resolve_signature(id),
                None => Err(ModelError::invalid_state(format!(
                    "method invocation {} has no signature",
                    self.node.index
                ))),
            },
            other => Err(ModelError::invalid_state(format!(
                "{} {} has no signature",
                other.type_name(),
                self.node.index
            ))),
        }
    }

    /// SQL text of a database invocation with every `?` replaced by its
    /// 1-based binding, in order
    ///
    /// # Errors
    /// * `ModelError::InvalidState` - not a database invocation or a binding is missing
    pub fn bound_sql_statement(&self) -> ModelResult<String> {
        let db = match &self.node.kind {
            CallableKind::Database(db) => db,
            other => {
                return Err(ModelError::invalid_state(format!(
                    "{} {} has no SQL statement",
                    other.type_name(),
                    self.node.index
                )))
            }
        };

        let sql = self.text(db.sql_statement)?.unwrap_or_default();
        if !db.prepared {
            return Ok(sql.to_string());
        }

        let mut bound = String::with_capacity(sql.len());
        let mut position = 0u32;
        for ch in sql.chars() {
            if ch != '?' {
                bound.push(ch);
                continue;
            }
            position += 1;
            let value = db.parameter_bindings.get(&position).ok_or_else(|| {
                ModelError::invalid_state(format!(
                    "no binding for parameter {} of {}",
                    position, self.node.index
                ))
            })?;
            bound.push_str(value);
        }
        Ok(bound)
    }
}

/// Read view of one sub-trace
#[derive(Debug, Clone, Copy)]
pub struct SubTraceRef<'a> {
    trace: &'a Trace,
    node: &'a SubTrace,
}

impl<'a> SubTraceRef<'a> {
    pub(crate) fn new(trace: &'a Trace, node: &'a SubTrace) -> Self {
        Self { trace, node }
    }

    pub fn trace(&self) -> &'a Trace {
        self.trace
    }

    pub fn node(&self) -> &'a SubTrace {
        self.node
    }

    pub fn index(&self) -> SubTraceIndex {
        self.node.index
    }

    pub fn id(&self) -> u64 {
        self.node.id
    }

    pub fn location(&self) -> &'a Location {
        &self.node.location
    }

    pub fn root(&self) -> Option<CallableRef<'a>> {
        self.node
            .root
            .map(|idx| CallableRef::new(self.trace, self.trace.callable_node(idx)))
    }

    pub fn parent(&self) -> Option<SubTraceRef<'a>> {
        self.node
            .parent
            .map(|idx| SubTraceRef::new(self.trace, self.trace.sub_trace_node(idx)))
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = SubTraceRef<'a>> + 'a {
        let trace = self.trace;
        self.node
            .children
            .iter()
            .map(move |idx| SubTraceRef::new(trace, trace.sub_trace_node(*idx)))
    }

    /// Remote invocation that entered this sub-trace, if linked
    pub fn invoker(&self) -> Option<CallableRef<'a>> {
        self.node
            .invoker
            .map(|idx| CallableRef::new(self.trace, self.trace.callable_node(idx)))
    }
}
