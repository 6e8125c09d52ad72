//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the library components to perform user tasks.

pub mod generate;
pub mod inspect;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use generate::{build_synthetic_trace, execute_generate, validate_args};
pub use inspect::execute_inspect;
pub use models::{GenerateArgs, InspectArgs};
pub use utils::display_version;
