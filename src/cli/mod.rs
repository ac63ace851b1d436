//! Command-line interface.

mod commands;
mod output;

pub use commands::{ArtifactArgs, Cli, Commands, ConfigureArgs, OutputFormat};
pub use output::OutputFormatter;
