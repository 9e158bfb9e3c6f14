//! CLI argument definitions using clap
//!
//! Commands:
//! - backupctl backup --config <path>
//! - backupctl restore --config <path> [--backup-id <id>] [--skip-version-check]
//! - backupctl list --config <path>
//! - backupctl prune --config <path>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::executor::ExecutorOptions;

/// backupctl - ordered backup and restore of application data
#[derive(Parser, Debug)]
#[command(name = "backupctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every registered task and promote the result into an archive
    Backup {
        /// Path to configuration file
        #[arg(long, default_value = "./backupctl.json")]
        config: PathBuf,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Restore every registered task from an archive
    Restore {
        /// Path to configuration file
        #[arg(long, default_value = "./backupctl.json")]
        config: PathBuf,

        /// Archive to restore; required when more than one exists
        #[arg(long)]
        backup_id: Option<String>,

        /// Restore even if the archive was made by another version
        #[arg(long)]
        skip_version_check: bool,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// List archives under the backup path, oldest first
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./backupctl.json")]
        config: PathBuf,
    },

    /// Remove archives older than the configured keep time
    Prune {
        /// Path to configuration file
        #[arg(long, default_value = "./backupctl.json")]
        config: PathBuf,
    },
}

/// Flags that take precedence over the configuration file for one run
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    /// Wait for asynchronous tasks before finishing
    #[arg(long, conflicts_with = "no_wait")]
    pub wait: bool,

    /// Do not wait for asynchronous tasks
    #[arg(long)]
    pub no_wait: bool,

    /// Task ids to skip (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    #[arg(long)]
    pub backup_bucket: Option<String>,

    #[arg(long)]
    pub registry_bucket: Option<String>,

    #[arg(long)]
    pub service_account_file: Option<PathBuf>,
}

impl RunOverrides {
    /// Apply the flags that were given on top of `options`
    pub fn apply(&self, mut options: ExecutorOptions) -> ExecutorOptions {
        if self.wait {
            options.wait_for_completion = true;
        }
        if self.no_wait {
            options.wait_for_completion = false;
        }
        if !self.skip.is_empty() {
            options.skip = self.skip.clone();
        }
        if let Some(bucket) = &self.backup_bucket {
            options.backup_bucket = Some(bucket.clone());
        }
        if let Some(bucket) = &self.registry_bucket {
            options.registry_bucket = Some(bucket.clone());
        }
        if let Some(path) = &self.service_account_file {
            options.service_account_file = Some(path.clone());
        }
        options
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
