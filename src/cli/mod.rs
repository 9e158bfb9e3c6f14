//! CLI module for backupctl
//!
//! Provides command-line interface for:
//! - backup: Run every task and promote the archive
//! - restore: Restore every task from an archive
//! - list: Show archives under the backup path
//! - prune: Remove archives older than the keep time

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, RunOverrides};
pub use commands::{backup, list, prune, restore, run, run_command};
pub use config::{Config, TaskConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{render_response, write_response};
