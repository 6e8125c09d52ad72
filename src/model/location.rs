//! Location of a sub-trace: where a part of the trace executed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host/runtime/application/business-transaction tuple.
///
/// Immutable value type: equality is field equality, unknown parts are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    host: String,
    runtime_environment: Option<String>,
    application: Option<String>,
    business_transaction: Option<String>,
    node_type: Option<String>,
}

impl Location {
    /// Create a location on a host; every other part starts unknown
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            runtime_environment: None,
            application: None,
            business_transaction: None,
            node_type: None,
        }
    }

    /// Set the runtime environment (e.g. a JVM or container id)
    pub fn with_runtime_environment(mut self, value: impl Into<String>) -> Self {
        self.runtime_environment = Some(value.into());
        self
    }

    /// Set the application id
    pub fn with_application(mut self, value: impl Into<String>) -> Self {
        self.application = Some(value.into());
        self
    }

    /// Set the business transaction id
    pub fn with_business_transaction(mut self, value: impl Into<String>) -> Self {
        self.business_transaction = Some(value.into());
        self
    }

    /// Set the node type (e.g. "frontend", "database")
    pub fn with_node_type(mut self, value: impl Into<String>) -> Self {
        self.node_type = Some(value.into());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn runtime_environment(&self) -> Option<&str> {
        self.runtime_environment.as_deref()
    }

    pub fn application(&self) -> Option<&str> {
        self.application.as_deref()
    }

    pub fn business_transaction(&self) -> Option<&str> {
        self.business_transaction.as_deref()
    }

    pub fn node_type(&self) -> Option<&str> {
        self.node_type.as_deref()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unknown = "?";
        write!(
            f,
            "{}/{}/{}/{}",
            self.host,
            self.runtime_environment.as_deref().unwrap_or(unknown),
            self.application.as_deref().unwrap_or(unknown),
            self.business_transaction.as_deref().unwrap_or(unknown)
        )
    }
}
