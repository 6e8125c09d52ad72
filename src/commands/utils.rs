use crate::utils::config::{FORMAT_VERSION, SUMMARY_SCHEMA_VERSION};

/// Display version information
pub fn display_version() {
    println!("cta-trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Trace Stream Format: v{}", FORMAT_VERSION);
    println!("Summary Schema: v{}", SUMMARY_SCHEMA_VERSION);
    println!();
    println!("Distributed execution trace model and binary codec.");
}
