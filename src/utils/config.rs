//! Configuration and constants for the library and the CLI.

/// Version tag written into every encoded trace record.
/// Readers only accept records carrying the same version.
pub const FORMAT_VERSION: u16 = 1;

/// Upper bound for the payload of one framed record (256 MiB).
/// A length prefix above this is treated as a corrupt stream.
pub const MAX_RECORD_BYTES: u32 = 256 * 1024 * 1024;

/// Size of the little-endian length prefix in front of every record
pub const RECORD_PREFIX_BYTES: usize = 4;

/// Current JSON summary schema version
pub const SUMMARY_SCHEMA_VERSION: &str = "1.0.0";

// Defaults for the synthetic trace generator
pub const DEFAULT_TRACE_COUNT: usize = 1;
pub const DEFAULT_TREE_DEPTH: usize = 3;
pub const DEFAULT_TREE_WIDTH: usize = 3;
pub const DEFAULT_REMOTE_HOPS: usize = 1;

/// Generator guard: trees bigger than this are refused
pub const MAX_GENERATED_NODES: usize = 5_000_000;
