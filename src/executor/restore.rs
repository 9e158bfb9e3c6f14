//! Restore executor
//!
//! # Algorithm
//!
//! 1. On construction: create a private scratch workdir, derive
//!    `archive_directory = <base>/<backup_id>`
//! 2. Load metadata from the archive directory; refuse to go on without it
//! 3. Run every registered task's restore from the archive directory, in order
//! 4. Optionally wait on dispatched asynchronous tasks
//!
//! A task error halts the remaining sequence. Which tasks already restored
//! is visible in the output stream.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::context::Context;
use crate::metadata::BackupMetadata;
use crate::observability::{Event, Severity};
use crate::output::Output;
use crate::tasks::TaskRegistry;

use super::base::{BaseExecutor, Dispatched, ExecutorOptions};
use super::errors::{ExecutorError, ExecutorResult};
use super::report::{Direction, RunReport, TaskReport};
use super::workdir::{create_workdir, is_plain_name, release_workdir};

pub struct RestoreExecutor<'a> {
    base: BaseExecutor<'a>,
    backup_id: String,
    workdir: PathBuf,
    archive_directory: PathBuf,
    metadata: Option<BackupMetadata>,
}

impl<'a> RestoreExecutor<'a> {
    /// Prepare a restore of `backup_id`. Creates the workdir.
    pub fn new(
        context: &'a dyn Context,
        registry: &'a TaskRegistry,
        options: ExecutorOptions,
        output: &'a dyn Output,
        backup_id: &str,
    ) -> ExecutorResult<Self> {
        if !is_plain_name(backup_id) {
            return Err(ExecutorError::invalid_backup_id(backup_id));
        }

        let base = BaseExecutor::new(context, registry, options, output);
        let basedir = context.backup_basedir();
        let workdir = create_workdir(basedir, "restore")?;

        Ok(Self {
            base,
            backup_id: backup_id.to_string(),
            workdir,
            archive_directory: basedir.join(backup_id),
            metadata: None,
        })
    }

    pub fn backup_id(&self) -> &str {
        &self.backup_id
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn archive_directory(&self) -> &Path {
        &self.archive_directory
    }

    /// Metadata of the archive being restored, loaded on first use.
    pub fn metadata(&mut self) -> ExecutorResult<&BackupMetadata> {
        let metadata = match self.metadata.take() {
            Some(metadata) => metadata,
            None => BackupMetadata::load(&self.archive_directory)
                .and_then(|m| {
                    m.ensure_id(&self.backup_id)?;
                    Ok(m)
                })
                .map_err(|e| ExecutorError::metadata_missing(&self.archive_directory, e))?,
        };

        Ok(self.metadata.insert(metadata))
    }

    /// Run the full restore.
    pub fn execute(&mut self) -> ExecutorResult<RunReport> {
        let output = self.base.output;
        let archive_directory = self.archive_directory.display().to_string();
        output.info(
            Event::RestoreStart,
            &[
                ("archive_directory", archive_directory.as_str()),
                ("backup_id", self.backup_id.as_str()),
            ],
        );

        let result = self.execute_inner();

        match &result {
            Ok(report) => {
                let failed = report.failed().len().to_string();
                let tasks = report.tasks.len().to_string();
                output.info(
                    Event::RestoreComplete,
                    &[
                        ("backup_id", self.backup_id.as_str()),
                        ("failed", failed.as_str()),
                        ("tasks", tasks.as_str()),
                    ],
                );
            }
            Err(err) => {
                let reason = err.to_string();
                output.emit(
                    Severity::Fatal,
                    Event::RestoreFailed,
                    &[("backup_id", self.backup_id.as_str()), ("reason", reason.as_str())],
                );
            }
        }

        result
    }

    fn execute_inner(&mut self) -> ExecutorResult<RunReport> {
        let version = self.metadata()?.gitlab_version.clone();
        self.base.output.info(
            Event::MetadataLoaded,
            &[
                ("backup_id", self.backup_id.as_str()),
                ("gitlab_version", version.as_str()),
            ],
        );

        let base = &self.base;
        let mut reports = Vec::new();
        let mut dispatched = Vec::new();

        for mut task in base.registry.build_each(base.task_init(&self.workdir)) {
            if let Some(state) = base.precheck(task.as_ref()) {
                reports.push(TaskReport::new(task.id(), task.human_name(), state, None));
                continue;
            }

            if let Some(warning) = task.pre_restore_warning() {
                base.output.warn(
                    Event::TaskWarning,
                    &[("task", task.id()), ("phase", "pre_restore"), ("message", warning.as_str())],
                );
            }

            base.inject_registry_bucket(task.as_mut());
            base.output.info(
                Event::TaskStart,
                &[("task", task.id()), ("name", task.human_name())],
            );

            let started = Instant::now();
            if let Err(err) = task.restore(&self.archive_directory) {
                let reason = err.to_string();
                base.output.error(
                    Event::TaskFailed,
                    &[("task", task.id()), ("phase", "restore"), ("reason", reason.as_str())],
                );
                return Err(ExecutorError::task_failed(task.id(), err));
            }

            let report = base.finish_task(task.as_mut(), started);
            reports.push(report);

            if let Some(warning) = task.post_restore_warning() {
                base.output.warn(
                    Event::TaskWarning,
                    &[("task", task.id()), ("phase", "post_restore"), ("message", warning.as_str())],
                );
            }

            if task.as_asynchronous().is_some() {
                dispatched.push(Dispatched {
                    report_index: reports.len() - 1,
                    task,
                });
            }
        }

        base.wait_for_dispatched(dispatched, &mut reports);

        Ok(RunReport {
            direction: Direction::Restore,
            backup_id: self.backup_id.clone(),
            archive_directory: self.archive_directory.clone(),
            tasks: reports,
        })
    }

    /// Remove the workdir. Never called implicitly.
    pub fn release(&self) -> ExecutorResult<()> {
        release_workdir(&self.workdir)?;
        let workdir = self.workdir.display().to_string();
        self.base
            .output
            .info(Event::WorkdirReleased, &[("workdir", workdir.as_str())]);
        Ok(())
    }
}
