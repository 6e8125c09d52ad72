//! Decoding side of the trace stream.
//!
//! Every decoded node is created through the regular construction
//! operations, so parents, containing sub-traces and invokers are wired by
//! construction and the tree invariants are re-validated on the way in.

use super::framing::read_frame;
use super::wire::{WireCallable, WireKind, WireTrace};
use super::wire_options;
use crate::model::{
    CallableIndex, CallableKind, DatabaseInvocation, ExceptionThrow, HttpRequestProcessing,
    LoggingInvocation, MethodInvocation, RemoteInvocation, SubTraceIndex, Timing, Trace,
};
use crate::registry::Registry;
use crate::utils::config::FORMAT_VERSION;
use crate::utils::error::{CodecError, ModelError};
use bincode::Options;
use log::debug;
use std::io::Read;

/// Reads traces back from a byte source
///
/// **Public** - main entry point for consuming a trace stream
pub struct TraceReader<R: Read> {
    source: R,
    read: u64,
}

impl<R: Read> TraceReader<R> {
    pub fn new(source: R) -> Self {
        Self { source, read: 0 }
    }

    /// Read the next trace, or `None` at a clean end of stream
    ///
    /// # Errors
    /// * `CodecError::CorruptStream` - truncated or malformed record
    /// * `CodecError::Io` - the source failed
    pub fn read_next(&mut self) -> Result<Option<Trace>, CodecError> {
        let Some(payload) = read_frame(&mut self.source)? else {
            debug!("End of trace stream after {} records", self.read);
            return Ok(None);
        };

        let trace = decode_trace(&payload)?;
        self.read += 1;
        debug!(
            "Read trace {} ({} bytes, {} callables)",
            trace.trace_id(),
            payload.len(),
            trace.callable_count()
        );
        Ok(Some(trace))
    }

    /// Number of records read so far
    pub fn records_read(&self) -> u64 {
        self.read
    }
}

impl<R: Read> Iterator for TraceReader<R> {
    type Item = Result<Trace, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Decode one unframed payload
///
/// # Errors
/// * `CodecError::CorruptStream` - the payload does not describe a valid trace
pub fn decode_trace(payload: &[u8]) -> Result<Trace, CodecError> {
    let wire: WireTrace = wire_options()
        .deserialize(payload)
        .map_err(|e| CodecError::corrupt(format!("undecodable record: {}", e)))?;

    if wire.version != FORMAT_VERSION {
        return Err(CodecError::corrupt(format!(
            "unsupported format version {} (expected {})",
            wire.version, FORMAT_VERSION
        )));
    }

    rebuild(wire)
}

fn corrupt(err: ModelError) -> CodecError {
    CodecError::corrupt(err.to_string())
}

/// Pre-order cursor: a node and how many of its children are still expected
struct Frame<T> {
    node: T,
    remaining: u32,
}

/// Parent of the next pre-order node, dropping frames whose children are all read
fn next_parent<T: Copy>(stack: &mut Vec<Frame<T>>) -> Option<T> {
    while let Some(top) = stack.last_mut() {
        if top.remaining > 0 {
            top.remaining -= 1;
            return Some(top.node);
        }
        stack.pop();
    }
    None
}

fn all_children_read<T>(stack: &[Frame<T>]) -> bool {
    stack.iter().all(|frame| frame.remaining == 0)
}

/// Encoded link of a remote invocation
struct RemoteLink {
    position: u32,
    async_invocation: bool,
}

/// A remote link to wire once its target sub-trace exists
struct PendingTarget {
    remote: CallableIndex,
    containing: SubTraceIndex,
    link: RemoteLink,
}

fn rebuild(wire: WireTrace) -> Result<Trace, CodecError> {
    let registry = Registry::from_tables(wire.strings, wire.signatures).map_err(corrupt)?;
    let mut trace = Trace::from_parts(wire.trace_id, registry);
    let mut pending_targets = Vec::new();
    let mut stack: Vec<Frame<SubTraceIndex>> = Vec::new();

    for (position, sub_trace) in wire.sub_traces.into_iter().enumerate() {
        let index = if position == 0 {
            trace.set_root(sub_trace.id, sub_trace.location)
        } else {
            let parent = next_parent(&mut stack).ok_or_else(|| {
                CodecError::corrupt(format!("sub-trace {} lies outside the tree", sub_trace.id))
            })?;
            trace.add_sub_trace(parent, sub_trace.id, sub_trace.location)
        }
        .map_err(corrupt)?;

        rebuild_callables(&mut trace, index, sub_trace.callables, &mut pending_targets)?;
        stack.push(Frame {
            node: index,
            remaining: sub_trace.child_count,
        });
    }

    if !all_children_read(&stack) {
        return Err(CodecError::corrupt("sub-trace tree is missing children"));
    }

    for target in pending_targets {
        let sub_trace = trace
            .sub_trace(target.containing)
            .map_err(corrupt)?
            .node()
            .children()
            .get(target.link.position as usize)
            .copied()
            .ok_or_else(|| {
                CodecError::corrupt(format!(
                    "remote target {} of {} does not exist",
                    target.link.position, target.remote
                ))
            })?;
        trace
            .set_target_sub_trace(target.remote, sub_trace)
            .map_err(corrupt)?;
        if target.link.async_invocation {
            trace
                .set_async_invocation(target.remote, true)
                .map_err(corrupt)?;
        }
    }

    Ok(trace)
}

fn rebuild_callables(
    trace: &mut Trace,
    sub_trace: SubTraceIndex,
    callables: Vec<WireCallable>,
    pending_targets: &mut Vec<PendingTarget>,
) -> Result<(), CodecError> {
    let mut stack: Vec<Frame<CallableIndex>> = Vec::new();

    for (position, callable) in callables.into_iter().enumerate() {
        let (kind, link) = into_kind(callable.kind)?;
        let index = if position == 0 {
            trace.set_root_callable(sub_trace, callable.timestamp, kind)
        } else {
            let parent = next_parent(&mut stack).ok_or_else(|| {
                CodecError::corrupt(format!("callable lies outside the tree of {}", sub_trace))
            })?;
            trace.add_callable(parent, callable.timestamp, kind)
        }
        .map_err(corrupt)?;

        for label in callable.labels {
            trace.add_label_id(index, label).map_err(corrupt)?;
        }
        for info in callable.additional_information {
            trace.add_additional_information(index, info).map_err(corrupt)?;
        }
        if let Some(link) = link {
            pending_targets.push(PendingTarget {
                remote: index,
                containing: sub_trace,
                link,
            });
        }

        stack.push(Frame {
            node: index,
            remaining: callable.child_count,
        });
    }

    if !all_children_read(&stack) {
        return Err(CodecError::corrupt(format!(
            "call tree of {} is missing children",
            sub_trace
        )));
    }
    Ok(())
}

/// Variant value plus the encoded remote link
fn into_kind(kind: WireKind) -> Result<(CallableKind, Option<RemoteLink>), CodecError> {
    Ok(match kind {
        WireKind::Method {
            signature,
            response_time,
            cpu_time,
            parameter_values,
        } => {
            let method = MethodInvocation {
                signature,
                timing: Timing::new(response_time),
                cpu_time,
                parameter_values,
                ..MethodInvocation::default()
            };
            (method.into(), None)
        }
        WireKind::HttpRequest {
            uri,
            request_method,
            parameters,
            attributes,
            session_attributes,
            headers,
        } => {
            let http = HttpRequestProcessing {
                uri,
                request_method,
                parameters,
                attributes,
                session_attributes,
                headers,
                children: Vec::new(),
            };
            (http.into(), None)
        }
        WireKind::Database {
            response_time,
            sql_statement,
            prepared,
            parameter_bindings,
            db_product_name,
            db_product_version,
            db_url,
        } => {
            let db = DatabaseInvocation {
                timing: Timing::new(response_time),
                sql_statement,
                prepared,
                parameter_bindings,
                db_product_name,
                db_product_version,
                db_url,
            };
            (db.into(), None)
        }
        WireKind::Remote {
            response_time,
            target,
            target_location,
            target_sub_trace,
            async_invocation,
        } => {
            let link = match (target_sub_trace, async_invocation) {
                (Some(position), async_invocation) => Some(RemoteLink {
                    position,
                    async_invocation,
                }),
                (None, false) => None,
                (None, true) => {
                    return Err(CodecError::corrupt(
                        "asynchronous remote invocation without a target sub-trace",
                    ))
                }
            };
            let remote = RemoteInvocation {
                timing: Timing::new(response_time),
                target,
                target_location,
                ..RemoteInvocation::default()
            };
            (remote.into(), link)
        }
        WireKind::Exception {
            error_message,
            cause,
            stack_trace,
            throwable_type,
        } => {
            let exception = ExceptionThrow {
                error_message,
                cause,
                stack_trace,
                throwable_type,
            };
            (exception.into(), None)
        }
        WireKind::Logging {
            logging_level,
            message,
        } => (
            LoggingInvocation {
                logging_level,
                message,
            }
            .into(),
            None,
        ),
    })
}
