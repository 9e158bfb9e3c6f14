//! CLI command implementations
//!
//! Each command loads the configuration, does its work, and writes a single
//! JSON response to stdout. Backup and restore always release their workdir,
//! whether or not the run succeeded.

use std::path::Path;

use chrono::Utc;
use serde_json::json;

use crate::catalog::{BackupCatalog, CatalogEntry, PruneReport};
use crate::context::Context;
use crate::executor::{BackupExecutor, RestoreExecutor, RunReport};
use crate::observability::{Event, Severity};
use crate::output::{LogOutput, Output};

use super::args::{Cli, Command, RunOverrides};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Parse arguments and run the chosen command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    let output = LogOutput::new();

    match cmd {
        Command::Backup { config, overrides } => {
            let config = load_config(&config, &output)?;
            let report = backup(&config, &overrides, &output)?;
            write_response(serde_json::to_value(&report)?)
        }
        Command::Restore {
            config,
            backup_id,
            skip_version_check,
            overrides,
        } => {
            let config = load_config(&config, &output)?;
            let report = restore(
                &config,
                backup_id.as_deref(),
                !skip_version_check,
                &overrides,
                &output,
            )?;
            write_response(serde_json::to_value(&report)?)
        }
        Command::List { config } => {
            let config = load_config(&config, &output)?;
            let backups = list(&config)?;
            write_response(json!({ "backups": backups }))
        }
        Command::Prune { config } => {
            let config = load_config(&config, &output)?;
            let report = prune(&config, &output)?;
            write_response(serde_json::to_value(&report)?)
        }
    }
}

fn load_config(path: &Path, output: &dyn Output) -> CliResult<Config> {
    let config = Config::load(path)?;
    let path = path.display().to_string();
    let tasks = config.tasks.len().to_string();
    output.info(
        Event::ConfigLoaded,
        &[("path", path.as_str()), ("tasks", tasks.as_str())],
    );
    Ok(config)
}

/// Run a backup of every configured task
pub fn backup(config: &Config, overrides: &RunOverrides, output: &dyn Output) -> CliResult<RunReport> {
    let registry = config.registry()?;
    let options = overrides.apply(config.options());

    let mut executor = BackupExecutor::new(config, &registry, options, output)?;
    let result = executor.execute();
    let released = executor.release();

    let report = result?;
    released?;
    Ok(report)
}

/// Restore every configured task
///
/// Without `backup_id` the single archive under the backup path is used.
/// With `check_version`, an archive made by another product version is
/// refused before any task runs.
pub fn restore(
    config: &Config,
    backup_id: Option<&str>,
    check_version: bool,
    overrides: &RunOverrides,
    output: &dyn Output,
) -> CliResult<RunReport> {
    let registry = config.registry()?;
    let options = overrides.apply(config.options());

    let backup_id = match backup_id {
        Some(id) => id.to_string(),
        None => BackupCatalog::new(config.backup_basedir()).resolve(None)?,
    };

    let mut executor = RestoreExecutor::new(config, &registry, options, output, &backup_id)?;
    let checked = if check_version {
        ensure_same_version(config, &mut executor, output)
    } else {
        Ok(())
    };
    let result = checked.and_then(|()| executor.execute().map_err(CliError::from));
    let released = executor.release();

    let report = result?;
    released?;
    Ok(report)
}

fn ensure_same_version(
    config: &Config,
    executor: &mut RestoreExecutor<'_>,
    output: &dyn Output,
) -> CliResult<()> {
    // Absent or unreadable metadata is reported by the executor itself.
    let Ok(metadata) = executor.metadata() else {
        return Ok(());
    };
    if metadata.gitlab_version == config.gitlab_version {
        return Ok(());
    }

    let err = CliError::version_mismatch(&metadata.gitlab_version, &config.gitlab_version);
    output.emit(
        Severity::Fatal,
        Event::RestoreFailed,
        &[("backup_id", executor.backup_id()), ("reason", err.message())],
    );
    Err(err)
}

/// Archives under the backup path, oldest first
pub fn list(config: &Config) -> CliResult<Vec<CatalogEntry>> {
    Ok(BackupCatalog::new(config.backup_basedir()).list()?)
}

/// Remove archives older than `keep_time`
pub fn prune(config: &Config, output: &dyn Output) -> CliResult<PruneReport> {
    let catalog = BackupCatalog::new(config.backup_basedir());
    Ok(catalog.prune(config.keep_time, Utc::now(), output)?)
}
