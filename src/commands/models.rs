use crate::utils::config::{
    DEFAULT_REMOTE_HOPS, DEFAULT_TRACE_COUNT, DEFAULT_TREE_DEPTH, DEFAULT_TREE_WIDTH,
};
use std::path::PathBuf;

/// Arguments for the generate command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    /// Output path for the binary trace stream
    pub output: PathBuf,

    /// Number of traces to write
    pub count: usize,

    /// Depth of each sub-trace's method tree
    pub depth: usize,

    /// Children per method invocation
    pub width: usize,

    /// Length of the remote invocation chain
    pub remote_hops: usize,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            output: PathBuf::from("traces.bin"),
            count: DEFAULT_TRACE_COUNT,
            depth: DEFAULT_TREE_DEPTH,
            width: DEFAULT_TREE_WIDTH,
            remote_hops: DEFAULT_REMOTE_HOPS,
        }
    }
}

/// Arguments for the inspect command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct InspectArgs {
    /// Binary trace stream to read
    pub file: PathBuf,

    /// Output path for the JSON summary (stdout when absent)
    pub output: Option<PathBuf>,
}
