//! Command-line garbler and evaluator.
//!
//! Loads settings and circuits, reads the parties' private inputs, runs the
//! sessions and renders reports.

pub mod circuit_file;
pub mod cli;
pub mod input;
mod logging;
pub mod report;
pub mod run;
pub mod settings;

pub use cli::{Cli, Command};
pub use logging::init_tracing;
pub use settings::{LogFormat, LogProperties, Settings};
