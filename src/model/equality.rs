//! Deep structural equality of traces.
//!
//! Two traces are equal when their sub-trace trees and call trees have the
//! same shape and the same attribute values. Interned ids and arena indices
//! are never compared directly: strings and signatures are compared by
//! resolved content and remote links by the position of the target among
//! its siblings, so a decoded trace equals its original.

use super::callable::{CallableKind, TimedCallable};
use super::trace::Trace;
use super::variants::{
    DatabaseInvocation, ExceptionThrow, HttpRequestProcessing, LoggingInvocation,
    MethodInvocation, RemoteInvocation,
};
use super::view::{CallableRef, SubTraceRef};
use crate::registry::{SignatureId, StringId};

impl PartialEq for Trace {
    fn eq(&self, other: &Self) -> bool {
        if self.trace_id != other.trace_id {
            return false;
        }
        match (self.root(), other.root()) {
            (None, None) => true,
            (Some(a), Some(b)) => sub_trace_trees_eq(a, b),
            _ => false,
        }
    }
}

fn sub_trace_trees_eq(a: SubTraceRef<'_>, b: SubTraceRef<'_>) -> bool {
    let mut pending = vec![(a, b)];

    while let Some((a, b)) = pending.pop() {
        if a.id() != b.id()
            || a.location() != b.location()
            || a.node().children().len() != b.node().children().len()
            || a.node().invoker().is_some() != b.node().invoker().is_some()
        {
            return false;
        }

        let roots_eq = match (a.root(), b.root()) {
            (None, None) => true,
            (Some(x), Some(y)) => callable_trees_eq(x, y),
            _ => false,
        };
        if !roots_eq {
            return false;
        }

        pending.extend(a.children().zip(b.children()));
    }

    true
}

fn callable_trees_eq(a: CallableRef<'_>, b: CallableRef<'_>) -> bool {
    let mut pending = vec![(a, b)];

    while let Some((a, b)) = pending.pop() {
        if a.timestamp() != b.timestamp()
            || a.node().children().len() != b.node().children().len()
            || a.node().additional_information() != b.node().additional_information()
            || !labels_eq(a, b)
            || !kinds_eq(a, b)
        {
            return false;
        }

        pending.extend(a.children().zip(b.children()));
    }

    true
}

fn labels_eq(a: CallableRef<'_>, b: CallableRef<'_>) -> bool {
    match (a.labels(), b.labels()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

/// Compare two interned strings living in different registries
fn text_eq(a: CallableRef<'_>, x: StringId, b: CallableRef<'_>, y: StringId) -> bool {
    match (a.text(x), b.text(y)) {
        (Ok(s), Ok(t)) => s == t,
        _ => false,
    }
}

fn opt_text_eq(
    a: CallableRef<'_>,
    x: Option<StringId>,
    b: CallableRef<'_>,
    y: Option<StringId>,
) -> bool {
    match (x, y) {
        (None, None) => true,
        (Some(x), Some(y)) => text_eq(a, x, b, y),
        _ => false,
    }
}

fn signature_eq(
    a: CallableRef<'_>,
    x: Option<SignatureId>,
    b: CallableRef<'_>,
    y: Option<SignatureId>,
) -> bool {
    match (x, y) {
        (None, None) => true,
        (Some(x), Some(y)) => match (
            a.trace().resolve_signature(x),
            b.trace().resolve_signature(y),
        ) {
            (Ok(s), Ok(t)) => s == t,
            _ => false,
        },
        _ => false,
    }
}

/// Position of a remote invocation's target among its siblings
fn target_position(c: CallableRef<'_>) -> Option<usize> {
    let target = c.node().target_sub_trace()?;
    c.containing_sub_trace()
        .node()
        .children()
        .iter()
        .position(|idx| *idx == target)
}

fn kinds_eq(a: CallableRef<'_>, b: CallableRef<'_>) -> bool {
    match (a.kind(), b.kind()) {
        (CallableKind::Method(x), CallableKind::Method(y)) => methods_eq(a, x, b, y),
        (CallableKind::HttpRequest(x), CallableKind::HttpRequest(y)) => http_eq(x, y),
        (CallableKind::Database(x), CallableKind::Database(y)) => databases_eq(a, x, b, y),
        (CallableKind::Remote(x), CallableKind::Remote(y)) => remotes_eq(a, x, b, y),
        (CallableKind::Exception(x), CallableKind::Exception(y)) => exceptions_eq(a, x, b, y),
        (CallableKind::Logging(x), CallableKind::Logging(y)) => logging_eq(a, x, b, y),
        _ => false,
    }
}

fn methods_eq(
    a: CallableRef<'_>,
    x: &MethodInvocation,
    b: CallableRef<'_>,
    y: &MethodInvocation,
) -> bool {
    x.response_time() == y.response_time()
        && x.cpu_time == y.cpu_time
        && x.parameter_values == y.parameter_values
        && signature_eq(a, x.signature, b, y.signature)
}

fn http_eq(x: &HttpRequestProcessing, y: &HttpRequestProcessing) -> bool {
    x.uri == y.uri
        && x.request_method == y.request_method
        && x.parameters == y.parameters
        && x.attributes == y.attributes
        && x.session_attributes == y.session_attributes
        && x.headers == y.headers
}

fn databases_eq(
    a: CallableRef<'_>,
    x: &DatabaseInvocation,
    b: CallableRef<'_>,
    y: &DatabaseInvocation,
) -> bool {
    x.response_time() == y.response_time()
        && x.prepared == y.prepared
        && x.parameter_bindings == y.parameter_bindings
        && text_eq(a, x.sql_statement, b, y.sql_statement)
        && opt_text_eq(a, x.db_product_name, b, y.db_product_name)
        && opt_text_eq(a, x.db_product_version, b, y.db_product_version)
        && opt_text_eq(a, x.db_url, b, y.db_url)
}

fn remotes_eq(
    a: CallableRef<'_>,
    x: &RemoteInvocation,
    b: CallableRef<'_>,
    y: &RemoteInvocation,
) -> bool {
    x.response_time() == y.response_time()
        && x.target_location == y.target_location
        && x.async_invocation == y.async_invocation
        && opt_text_eq(a, x.target, b, y.target)
        && target_position(a) == target_position(b)
}

fn exceptions_eq(
    a: CallableRef<'_>,
    x: &ExceptionThrow,
    b: CallableRef<'_>,
    y: &ExceptionThrow,
) -> bool {
    opt_text_eq(a, x.error_message, b, y.error_message)
        && opt_text_eq(a, x.cause, b, y.cause)
        && opt_text_eq(a, x.stack_trace, b, y.stack_trace)
        && opt_text_eq(a, x.throwable_type, b, y.throwable_type)
}

fn logging_eq(
    a: CallableRef<'_>,
    x: &LoggingInvocation,
    b: CallableRef<'_>,
    y: &LoggingInvocation,
) -> bool {
    opt_text_eq(a, x.logging_level, b, y.logging_level)
        && opt_text_eq(a, x.message, b, y.message)
}
