//! CTA Trace CLI
//!
//! Generates synthetic distributed traces and inspects binary trace
//! streams.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cta_trace::commands::{
    display_version, execute_generate, execute_inspect, GenerateArgs, InspectArgs,
};
use cta_trace::utils::config::{
    DEFAULT_REMOTE_HOPS, DEFAULT_TRACE_COUNT, DEFAULT_TREE_DEPTH, DEFAULT_TREE_WIDTH,
};
use env_logger::Env;
use std::path::PathBuf;

/// CTA Trace - distributed execution traces
#[derive(Parser, Debug)]
#[command(name = "cta-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Write synthetic traces to a binary stream
    Generate {
        /// Output path for the trace stream
        #[arg(short, long, default_value = "traces.bin")]
        output: PathBuf,

        /// Number of traces
        #[arg(short, long, default_value_t = DEFAULT_TRACE_COUNT)]
        count: usize,

        /// Depth of each sub-trace's method tree
        #[arg(short, long, default_value_t = DEFAULT_TREE_DEPTH)]
        depth: usize,

        /// Children per method invocation
        #[arg(short, long, default_value_t = DEFAULT_TREE_WIDTH)]
        width: usize,

        /// Remote invocations chained across hosts
        #[arg(long, default_value_t = DEFAULT_REMOTE_HOPS)]
        remote_hops: usize,
    },

    /// Summarize a binary trace stream as JSON
    Inspect {
        /// Path to the trace stream
        #[arg(short, long)]
        file: PathBuf,

        /// Output path for the JSON summary (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Generate {
            output,
            count,
            depth,
            width,
            remote_hops,
        } => {
            execute_generate(GenerateArgs {
                output,
                count,
                depth,
                width,
                remote_hops,
            })?;
        }

        Commands::Inspect { file, output } => {
            execute_inspect(InspectArgs { file, output })?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
