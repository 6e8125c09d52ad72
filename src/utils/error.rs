//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors raised by the trace model, the registry and the iterators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{kind} id {id} is not registered in this trace")]
    NotRegistered { kind: &'static str, id: u32 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Iterator reached the end")]
    IteratorExhausted,
}

impl ModelError {
    /// Shorthand for an `InvalidState` error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Errors that can occur while encoding or decoding a trace stream
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Corrupt trace stream: {0}")]
    CorruptStream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode trace: {0}")]
    Encoding(String),

    #[error("Trace model error: {0}")]
    Model(#[from] ModelError),
}

impl CodecError {
    /// Shorthand for a `CorruptStream` error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptStream(msg.into())
    }
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to read file: {0}")]
    ReadFailed(std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Result alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
