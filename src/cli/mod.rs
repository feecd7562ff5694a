//! CLI module for finquest
//!
//! Provides command-line interface for:
//! - init: Create the profile store and a profile
//! - level: Show a profile's level
//! - gain: Add XP to a profile
//! - stats: Spending and savings statistics

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{gain, init, level, run, run_command, stats, StatsInput};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
