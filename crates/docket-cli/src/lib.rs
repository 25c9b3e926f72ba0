//! Docket CLI library.
//!
//! Configuration, argument parsing, output formatting and the interactive
//! interview loop behind the `docket` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod repl;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
