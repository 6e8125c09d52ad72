//! Inspect command implementation.
//!
//! Reads a binary trace stream and reports per-trace metrics as a JSON
//! summary, on stdout or into a file.

use super::models::InspectArgs;
use crate::codec::TraceReader;
use crate::output::{save_summary, write_summary, StreamSummary, TraceSummary};
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

/// Execute the inspect command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The summary that was printed or written
///
/// # Errors
/// * File open errors
/// * Corrupt or truncated trace stream
/// * Summary write errors
pub fn execute_inspect(args: InspectArgs) -> Result<StreamSummary> {
    let start_time = Instant::now();
    info!("Inspecting trace stream: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let reader = TraceReader::new(BufReader::new(file));

    let mut traces = Vec::new();
    for (position, trace) in reader.enumerate() {
        let trace = trace.with_context(|| format!("Failed to read trace #{}", position + 1))?;
        let summary = TraceSummary::from_trace(&trace);
        debug!(
            "Trace {}: {} sub-traces, {} callables",
            summary.trace_id, summary.sub_trace_count, summary.size
        );
        traces.push(summary);
    }

    let summary = StreamSummary::new(args.file.display().to_string(), traces);

    match &args.output {
        Some(path) => {
            save_summary(&summary, path).context("Failed to write summary JSON")?;
            info!("✓ Summary written to: {}", path.display());
        }
        None => write_summary(&summary, std::io::stdout().lock())
            .context("Failed to print summary JSON")?,
    }

    info!(
        "Inspected {} trace(s) in {:.2}s",
        summary.trace_count,
        start_time.elapsed().as_secs_f64()
    );
    Ok(summary)
}
