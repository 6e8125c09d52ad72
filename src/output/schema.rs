//! JSON schema of the stream summary written by `inspect`.
//!
//! Schema is versioned to allow future evolution.

use crate::model::{SubTraceRef, Trace};
use crate::utils::config::SUMMARY_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

/// Top-level summary of one trace stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Schema version for compatibility checking
    pub version: String,

    /// File the stream was read from
    pub source: String,

    /// Number of traces in the stream
    pub trace_count: usize,

    /// Per-trace metrics in stream order
    pub traces: Vec<TraceSummary>,

    /// Timestamp when the summary was generated
    pub generated_at: String,
}

impl StreamSummary {
    pub fn new(source: impl Into<String>, traces: Vec<TraceSummary>) -> Self {
        Self {
            version: SUMMARY_SCHEMA_VERSION.to_string(),
            source: source.into(),
            trace_count: traces.len(),
            traces,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Metrics of one trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace_id: u64,
    pub sub_trace_count: usize,

    /// Callables over all sub-traces
    pub size: usize,

    /// Deepest callable depth across sub-trace boundaries
    pub max_call_depth: usize,

    pub sub_traces: Vec<SubTraceSummary>,
}

impl TraceSummary {
    pub fn from_trace(trace: &Trace) -> Self {
        let sub_traces: Vec<_> = trace.sub_traces().map(SubTraceSummary::from_sub_trace).collect();
        Self {
            trace_id: trace.trace_id(),
            sub_trace_count: sub_traces.len(),
            size: trace.size(),
            max_call_depth: trace.max_call_depth(),
            sub_traces,
        }
    }
}

/// Metrics of one sub-trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTraceSummary {
    pub id: u64,

    /// `host/runtime/application/business-transaction`
    pub location: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,

    /// Whether a remote invocation is linked to this sub-trace
    pub invoked: bool,

    pub size: usize,
    pub max_depth: usize,
}

impl SubTraceSummary {
    fn from_sub_trace(sub_trace: SubTraceRef<'_>) -> Self {
        Self {
            id: sub_trace.id(),
            location: sub_trace.location().to_string(),
            parent_id: sub_trace.parent().map(|p| p.id()),
            invoked: sub_trace.invoker().is_some(),
            size: sub_trace.size(),
            max_depth: sub_trace.max_depth(),
        }
    }
}
