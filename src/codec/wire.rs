//! On-wire shape of one trace record.
//!
//! The sub-trace tree and every call tree are flattened to pre-order lists
//! where each node carries its child count. Back-references are never
//! written; the decoder re-creates them while rebuilding the tree.

use crate::model::{
    AdditionalInfo, CallableKind, CallableRef, HttpMethod, Location, SubTraceRef, TimedCallable,
    Trace,
};
use crate::registry::{SignatureId, SignatureKey, StringId};
use crate::utils::config::FORMAT_VERSION;
use crate::utils::error::CodecError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One encoded trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTrace {
    pub version: u16,
    pub trace_id: u64,

    /// String table in id order
    pub strings: Vec<Option<String>>,

    /// Signature table in id order
    pub signatures: Vec<SignatureKey>,

    /// Sub-trace tree in pre-order; empty when the trace has no root
    pub sub_traces: Vec<WireSubTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSubTrace {
    pub id: u64,
    pub location: Location,
    pub child_count: u32,

    /// Call tree in pre-order; empty when the sub-trace has no root
    pub callables: Vec<WireCallable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCallable {
    pub timestamp: i64,
    pub labels: Vec<StringId>,
    pub additional_information: Vec<AdditionalInfo>,
    pub child_count: u32,
    pub kind: WireKind,
}

/// Variant tag plus the variant's own attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireKind {
    Method {
        signature: Option<SignatureId>,
        response_time: i64,
        cpu_time: Option<i64>,
        parameter_values: BTreeMap<u32, String>,
    },
    HttpRequest {
        uri: String,
        request_method: Option<HttpMethod>,
        parameters: BTreeMap<String, Vec<String>>,
        attributes: BTreeMap<String, String>,
        session_attributes: BTreeMap<String, String>,
        headers: BTreeMap<String, String>,
    },
    Database {
        response_time: i64,
        sql_statement: StringId,
        prepared: bool,
        parameter_bindings: BTreeMap<u32, String>,
        db_product_name: Option<StringId>,
        db_product_version: Option<StringId>,
        db_url: Option<StringId>,
    },
    Remote {
        response_time: i64,
        target: Option<StringId>,
        target_location: Option<Location>,

        /// Index of the target among the containing sub-trace's children
        target_sub_trace: Option<u32>,
        async_invocation: bool,
    },
    Exception {
        error_message: Option<StringId>,
        cause: Option<StringId>,
        stack_trace: Option<StringId>,
        throwable_type: Option<StringId>,
    },
    Logging {
        logging_level: Option<StringId>,
        message: Option<StringId>,
    },
}

impl WireTrace {
    /// Flatten a trace into its wire shape
    ///
    /// # Errors
    /// * `CodecError::Encoding` - a remote link points outside its sub-trace's children
    pub fn from_trace(trace: &Trace) -> Result<Self, CodecError> {
        let registry = trace.registry();
        let mut sub_traces = Vec::with_capacity(trace.sub_trace_count());
        for sub_trace in trace.sub_traces() {
            sub_traces.push(WireSubTrace::from_sub_trace(sub_trace)?);
        }

        Ok(Self {
            version: FORMAT_VERSION,
            trace_id: trace.trace_id(),
            strings: registry.strings().to_vec(),
            signatures: registry.signature_keys().to_vec(),
            sub_traces,
        })
    }

    /// Total number of callables in the record
    pub fn callable_count(&self) -> usize {
        self.sub_traces.iter().map(|st| st.callables.len()).sum()
    }
}

impl WireSubTrace {
    fn from_sub_trace(sub_trace: SubTraceRef<'_>) -> Result<Self, CodecError> {
        let mut callables = Vec::new();
        for callable in sub_trace.callables() {
            callables.push(WireCallable::from_callable(callable)?);
        }

        Ok(Self {
            id: sub_trace.id(),
            location: sub_trace.location().clone(),
            child_count: sub_trace.node().children().len() as u32,
            callables,
        })
    }
}

impl WireCallable {
    fn from_callable(callable: CallableRef<'_>) -> Result<Self, CodecError> {
        let node = callable.node();
        Ok(Self {
            timestamp: node.timestamp(),
            labels: node.label_ids().to_vec(),
            additional_information: node.additional_information().to_vec(),
            child_count: node.children().len() as u32,
            kind: WireKind::from_callable(callable)?,
        })
    }
}

impl WireKind {
    fn from_callable(callable: CallableRef<'_>) -> Result<Self, CodecError> {
        Ok(match callable.kind() {
            CallableKind::Method(m) => Self::Method {
                signature: m.signature,
                response_time: m.response_time(),
                cpu_time: m.cpu_time,
                parameter_values: m.parameter_values.clone(),
            },
            CallableKind::HttpRequest(h) => Self::HttpRequest {
                uri: h.uri.clone(),
                request_method: h.request_method,
                parameters: h.parameters.clone(),
                attributes: h.attributes.clone(),
                session_attributes: h.session_attributes.clone(),
                headers: h.headers.clone(),
            },
            CallableKind::Database(d) => Self::Database {
                response_time: d.response_time(),
                sql_statement: d.sql_statement,
                prepared: d.prepared,
                parameter_bindings: d.parameter_bindings.clone(),
                db_product_name: d.db_product_name,
                db_product_version: d.db_product_version,
                db_url: d.db_url,
            },
            CallableKind::Remote(r) => Self::Remote {
                response_time: r.response_time(),
                target: r.target,
                target_location: r.target_location.clone(),
                target_sub_trace: target_position(callable)?,
                async_invocation: r.async_invocation,
            },
            CallableKind::Exception(e) => Self::Exception {
                error_message: e.error_message,
                cause: e.cause,
                stack_trace: e.stack_trace,
                throwable_type: e.throwable_type,
            },
            CallableKind::Logging(l) => Self::Logging {
                logging_level: l.logging_level,
                message: l.message,
            },
        })
    }
}

fn target_position(callable: CallableRef<'_>) -> Result<Option<u32>, CodecError> {
    let Some(target) = callable.node().target_sub_trace() else {
        return Ok(None);
    };

    callable
        .containing_sub_trace()
        .node()
        .children()
        .iter()
        .position(|idx| *idx == target)
        .map(|pos| Some(pos as u32))
        .ok_or_else(|| {
            CodecError::Encoding(format!(
                "target {} of {} is not a child of its sub-trace",
                target,
                callable.index()
            ))
        })
}
