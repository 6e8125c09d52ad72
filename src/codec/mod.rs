//! Binary codec for streams of traces.
//!
//! A stream is a concatenation of records; each record is a little-endian
//! `u32` length followed by a bincode payload (varint integers, trailing
//! bytes rejected). A clean end of stream sits exactly on a record boundary.

pub mod framing;
pub mod reader;
pub mod wire;
pub mod writer;

// Re-export main types
pub use reader::{decode_trace, TraceReader};
pub use wire::{WireCallable, WireKind, WireSubTrace, WireTrace};
pub use writer::{encode_trace, TraceWriter};

use crate::utils::config::MAX_RECORD_BYTES;
use bincode::Options;

/// Bincode configuration shared by the writer and the reader
pub(crate) fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_varint_encoding()
        .with_little_endian()
        .with_limit(u64::from(MAX_RECORD_BYTES))
        .reject_trailing_bytes()
}
