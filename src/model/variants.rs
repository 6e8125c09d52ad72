//! The concrete callable variants.
//!
//! String-valued fields hold `StringId`s interned in the owning trace's
//! registry; obtain them with `Trace::register_string`.

use super::callable::{CallableIndex, NestingCallable, TimedCallable, Timing};
use super::location::Location;
use super::sub_trace::SubTraceIndex;
use crate::metrics::Memo;
use crate::registry::{SignatureId, StringId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A (Java-style) method invocation: nesting and timed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodInvocation {
    pub(crate) signature: Option<SignatureId>,
    pub(crate) timing: Timing,
    pub(crate) cpu_time: Option<i64>,
    pub(crate) exclusive_cpu_time: Memo<Option<i64>>,
    pub(crate) parameter_values: BTreeMap<u32, String>,
    pub(crate) children: Vec<CallableIndex>,
}

impl MethodInvocation {
    pub fn new(response_time: i64) -> Self {
        Self {
            timing: Timing::new(response_time),
            ..Self::default()
        }
    }

    /// Attach an already registered signature
    pub fn with_signature(mut self, signature: SignatureId) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_cpu_time(mut self, cpu_time: i64) -> Self {
        self.cpu_time = Some(cpu_time);
        self
    }

    pub fn with_parameter_value(mut self, index: u32, value: impl Into<String>) -> Self {
        self.parameter_values.insert(index, value.into());
        self
    }

    pub fn signature(&self) -> Option<SignatureId> {
        self.signature
    }

    pub fn cpu_time(&self) -> Option<i64> {
        self.cpu_time
    }

    pub fn parameter_values(&self) -> &BTreeMap<u32, String> {
        &self.parameter_values
    }
}

impl NestingCallable for MethodInvocation {
    fn children(&self) -> &[CallableIndex] {
        &self.children
    }
}

impl TimedCallable for MethodInvocation {
    fn timing(&self) -> &Timing {
        &self.timing
    }
}

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Trace,
    Options,
    Connect,
    Patch,
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "TRACE" => Self::Trace,
            "OPTIONS" => Self::Options,
            "CONNECT" => Self::Connect,
            "PATCH" => Self::Patch,
            other => return Err(format!("unknown HTTP method: {}", other)),
        })
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Trace => "TRACE",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Patch => "PATCH",
        };
        f.write_str(name)
    }
}

/// Server-side processing of an HTTP request: nesting, not timed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequestProcessing {
    pub(crate) uri: String,
    pub(crate) request_method: Option<HttpMethod>,
    pub(crate) parameters: BTreeMap<String, Vec<String>>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) session_attributes: BTreeMap<String, String>,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) children: Vec<CallableIndex>,
}

impl HttpRequestProcessing {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.request_method = Some(method);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.parameters.insert(name.into(), values);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_session_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.session_attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn request_method(&self) -> Option<HttpMethod> {
        self.request_method
    }

    pub fn parameters(&self) -> &BTreeMap<String, Vec<String>> {
        &self.parameters
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn session_attributes(&self) -> &BTreeMap<String, String> {
        &self.session_attributes
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

impl NestingCallable for HttpRequestProcessing {
    fn children(&self) -> &[CallableIndex] {
        &self.children
    }
}

/// A database call (timed leaf)
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseInvocation {
    pub(crate) timing: Timing,
    pub(crate) sql_statement: StringId,
    pub(crate) prepared: bool,
    pub(crate) parameter_bindings: BTreeMap<u32, String>,
    pub(crate) db_product_name: Option<StringId>,
    pub(crate) db_product_version: Option<StringId>,
    pub(crate) db_url: Option<StringId>,
}

impl DatabaseInvocation {
    pub fn new(response_time: i64, sql_statement: StringId) -> Self {
        Self {
            timing: Timing::new(response_time),
            sql_statement,
            prepared: false,
            parameter_bindings: BTreeMap::new(),
            db_product_name: None,
            db_product_version: None,
            db_url: None,
        }
    }

    /// Mark as a prepared statement with 1-based `?` bindings
    pub fn prepared(mut self, bindings: impl IntoIterator<Item = (u32, String)>) -> Self {
        self.prepared = true;
        self.parameter_bindings.extend(bindings);
        self
    }

    pub fn with_product(mut self, name: StringId, version: StringId) -> Self {
        self.db_product_name = Some(name);
        self.db_product_version = Some(version);
        self
    }

    pub fn with_url(mut self, url: StringId) -> Self {
        self.db_url = Some(url);
        self
    }

    pub fn sql_statement(&self) -> StringId {
        self.sql_statement
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn parameter_bindings(&self) -> &BTreeMap<u32, String> {
        &self.parameter_bindings
    }

    pub fn db_product_name(&self) -> Option<StringId> {
        self.db_product_name
    }

    pub fn db_product_version(&self) -> Option<StringId> {
        self.db_product_version
    }

    pub fn db_url(&self) -> Option<StringId> {
        self.db_url
    }
}

impl TimedCallable for DatabaseInvocation {
    fn timing(&self) -> &Timing {
        &self.timing
    }
}

/// A call into another location (timed leaf).
///
/// Owns the link to the invoked sub-trace, which is what connects the
/// sub-trace tree with the call trees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteInvocation {
    pub(crate) timing: Timing,
    pub(crate) target: Option<StringId>,
    pub(crate) target_location: Option<Location>,
    pub(crate) target_sub_trace: Option<SubTraceIndex>,

    /// Only ever set on a linked sub-trace invocation
    pub(crate) async_invocation: bool,
}

impl RemoteInvocation {
    pub fn new(response_time: i64) -> Self {
        Self {
            timing: Timing::new(response_time),
            ..Self::default()
        }
    }

    /// Endpoint description (URL, queue name, ...)
    pub fn with_target(mut self, target: StringId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_target_location(mut self, location: Location) -> Self {
        self.target_location = Some(location);
        self
    }

    pub fn target(&self) -> Option<StringId> {
        self.target
    }

    pub fn target_location(&self) -> Option<&Location> {
        self.target_location.as_ref()
    }

    pub fn target_sub_trace(&self) -> Option<SubTraceIndex> {
        self.target_sub_trace
    }

    /// Whether the invoker did not wait for the target sub-trace
    pub fn is_async_invocation(&self) -> bool {
        self.async_invocation
    }
}

impl TimedCallable for RemoteInvocation {
    fn timing(&self) -> &Timing {
        &self.timing
    }
}

/// A thrown exception (untimed leaf)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionThrow {
    pub(crate) error_message: Option<StringId>,
    pub(crate) cause: Option<StringId>,
    pub(crate) stack_trace: Option<StringId>,
    pub(crate) throwable_type: Option<StringId>,
}

impl ExceptionThrow {
    pub fn new(error_message: StringId) -> Self {
        Self {
            error_message: Some(error_message),
            ..Self::default()
        }
    }

    pub fn with_cause(mut self, cause: StringId) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: StringId) -> Self {
        self.stack_trace = Some(stack_trace);
        self
    }

    pub fn with_throwable_type(mut self, throwable_type: StringId) -> Self {
        self.throwable_type = Some(throwable_type);
        self
    }

    pub fn error_message(&self) -> Option<StringId> {
        self.error_message
    }

    pub fn cause(&self) -> Option<StringId> {
        self.cause
    }

    pub fn stack_trace(&self) -> Option<StringId> {
        self.stack_trace
    }

    pub fn throwable_type(&self) -> Option<StringId> {
        self.throwable_type
    }
}

/// A logging call (untimed leaf)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingInvocation {
    pub(crate) logging_level: Option<StringId>,
    pub(crate) message: Option<StringId>,
}

impl LoggingInvocation {
    pub fn new(logging_level: StringId, message: StringId) -> Self {
        Self {
            logging_level: Some(logging_level),
            message: Some(message),
        }
    }

    pub fn logging_level(&self) -> Option<StringId> {
        self.logging_level
    }

    pub fn message(&self) -> Option<StringId> {
        self.message
    }
}
