//! CLI layer for noteseeker.
//!
//! Provides the command-line interface using clap, with subcommands for
//! indexing vaults and searching, asking, and summarizing what's inside
//! them.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
