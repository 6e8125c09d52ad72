//! Encoding side of the trace stream.

use super::framing::write_frame;
use super::wire::WireTrace;
use super::wire_options;
use crate::model::Trace;
use crate::utils::error::CodecError;
use bincode::Options;
use log::debug;
use std::io::Write;

/// Appends encoded traces to a byte sink
///
/// **Public** - main entry point for producing a trace stream
pub struct TraceWriter<W: Write> {
    sink: W,
    written: u64,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    /// Append one trace record
    ///
    /// # Errors
    /// * `CodecError::Encoding` - the trace cannot be encoded or is too large
    /// * `CodecError::Io` - the sink failed
    pub fn write(&mut self, trace: &Trace) -> Result<(), CodecError> {
        let payload = encode_trace(trace)?;
        write_frame(&mut self.sink, &payload)?;
        self.written += 1;

        debug!(
            "Wrote trace {} ({} bytes, {} callables)",
            trace.trace_id(),
            payload.len(),
            trace.callable_count()
        );
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), CodecError> {
        self.sink.flush()?;
        Ok(())
    }

    /// Flush and hand back the sink
    pub fn into_inner(mut self) -> Result<W, CodecError> {
        self.flush()?;
        Ok(self.sink)
    }
}

/// Encode one trace into an unframed payload
pub fn encode_trace(trace: &Trace) -> Result<Vec<u8>, CodecError> {
    let wire = WireTrace::from_trace(trace)?;
    wire_options()
        .serialize(&wire)
        .map_err(|e| CodecError::Encoding(e.to_string()))
}
