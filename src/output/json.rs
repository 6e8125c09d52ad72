//! Pretty JSON rendering of stream summaries.
//!
//! Stdout and files share one path: everything goes through
//! [`write_summary`] on some `Write` sink.

use super::schema::StreamSummary;
use crate::utils::error::OutputError;
use log::debug;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Render `summary` as pretty JSON into `sink`, newline terminated
///
/// **Public** - used by `inspect` for stdout and, via [`save_summary`], files
pub fn write_summary<W: Write>(summary: &StreamSummary, mut sink: W) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut sink, summary)?;
    sink.write_all(b"\n")?;
    sink.flush()?;
    Ok(())
}

/// Write `summary` to a file, creating missing parent directories
///
/// # Errors
/// * `OutputError::InvalidPath` - empty path, a directory, or an uncreatable parent
/// * `OutputError::WriteFailed` / `SerializationFailed` - as in [`write_summary`]
pub fn save_summary(summary: &StreamSummary, path: &Path) -> Result<(), OutputError> {
    let file = create_output(path)?;
    write_summary(summary, BufWriter::new(file))?;
    debug!(
        "{} trace summaries saved to {}",
        summary.trace_count,
        path.display()
    );
    Ok(())
}

/// Parse a summary previously written by [`save_summary`]
///
/// # Errors
/// * `OutputError::ReadFailed` - the file cannot be opened
/// * `OutputError::SerializationFailed` - not a summary document
pub fn load_summary(path: &Path) -> Result<StreamSummary, OutputError> {
    let file = File::open(path).map_err(OutputError::ReadFailed)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn create_output(path: &Path) -> Result<File, OutputError> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "not a file path: '{}'",
            path.display()
        )));
    }

    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).map_err(|e| {
            OutputError::InvalidPath(format!("cannot create {}: {}", dir.display(), e))
        })?,
        _ => {}
    }

    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::schema::{SubTraceSummary, TraceSummary};

    fn summary() -> StreamSummary {
        StreamSummary::new(
            "traces.bin",
            vec![TraceSummary {
                trace_id: 123,
                sub_trace_count: 1,
                size: 3,
                max_call_depth: 1,
                sub_traces: vec![SubTraceSummary {
                    id: 1,
                    location: "web/?/?/?".to_string(),
                    parent_id: None,
                    invoked: false,
                    size: 3,
                    max_depth: 1,
                }],
            }],
        )
    }

    #[test]
    fn test_buffer_output_is_terminated_json() {
        let mut buf = Vec::new();
        write_summary(&summary(), &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"trace_id\": 123"));
        // root sub-traces carry no parent
        assert!(!text.contains("parent_id"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dirs/summary.json");

        save_summary(&summary(), &path).unwrap();
        let loaded = load_summary(&path).unwrap();

        assert_eq!(loaded.trace_count, 1);
        assert_eq!(loaded.traces[0].sub_traces[0].max_depth, 1);
    }

    #[test]
    fn test_save_rejects_directory_and_empty_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            save_summary(&summary(), dir.path()),
            Err(OutputError::InvalidPath(_))
        ));
        assert!(matches!(
            save_summary(&summary(), Path::new("")),
            Err(OutputError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_summary(&dir.path().join("absent.json")),
            Err(OutputError::ReadFailed(_))
        ));
    }
}
