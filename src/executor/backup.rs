//! Backup executor
//!
//! # Algorithm
//!
//! 1. On construction: build metadata, derive
//!    `archive_directory = <base>/<backup_id>` and refuse an existing one,
//!    create a private workdir under the base directory
//! 2. Run every registered task's backup into the workdir, in order
//! 3. Optionally wait on dispatched asynchronous tasks
//! 4. Write metadata into the workdir
//! 5. Promote the workdir contents into the archive directory
//!
//! A task error aborts at step 2: metadata is not written and nothing is
//! promoted. The workdir is left for inspection until [`BackupExecutor::release`].

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
use super::workdir::{create_workdir, is_plain_name, promote, release_workdir};

pub struct BackupExecutor<'a> {
    base: BaseExecutor<'a>,
    metadata: BackupMetadata,
    workdir: PathBuf,
    archive_directory: PathBuf,
}

impl<'a> BackupExecutor<'a> {
    /// Prepare a backup run. Creates the base directory and the workdir.
    pub fn new(
        context: &'a dyn Context,
        registry: &'a TaskRegistry,
        options: ExecutorOptions,
        output: &'a dyn Output,
    ) -> ExecutorResult<Self> {
        let base = BaseExecutor::new(context, registry, options, output);
        let metadata = BackupMetadata::build(context.gitlab_version());
        Self::with_metadata(base, metadata)
    }

    /// Prepare a backup run with a caller-built metadata record.
    ///
    /// Fails before any task runs if the backup id cannot name an archive
    /// directory or that archive already exists.
    pub fn with_metadata(base: BaseExecutor<'a>, metadata: BackupMetadata) -> ExecutorResult<Self> {
        if !is_plain_name(&metadata.backup_id) {
            return Err(ExecutorError::invalid_backup_id(&metadata.backup_id));
        }

        let basedir = base.context.backup_basedir().to_path_buf();
        let archive_directory = basedir.join(&metadata.backup_id);
        if archive_directory.exists() {
            return Err(ExecutorError::archive(format!(
                "Archive directory already exists: {}",
                archive_directory.display()
            )));
        }

        let workdir = create_workdir(&basedir, "backup")?;

        Ok(Self {
            base,
            metadata,
            workdir,
            archive_directory,
        })
    }

    pub fn metadata(&self) -> &BackupMetadata {
        &self.metadata
    }

    pub fn backup_id(&self) -> &str {
        &self.metadata.backup_id
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn archive_directory(&self) -> &Path {
        &self.archive_directory
    }

    /// Run the full backup.
    pub fn execute(&mut self) -> ExecutorResult<RunReport> {
        let output = self.base.output;
        let workdir = self.workdir.display().to_string();
        output.info(
            Event::BackupStart,
            &[("backup_id", self.backup_id()), ("workdir", workdir.as_str())],
        );

        let result = self.execute_inner();

        match &result {
            Ok(report) => {
                let failed = report.failed().len().to_string();
                let tasks = report.tasks.len().to_string();
                output.info(
                    Event::BackupComplete,
                    &[
                        ("backup_id", self.backup_id()),
                        ("failed", failed.as_str()),
                        ("tasks", tasks.as_str()),
                    ],
                );
            }
            Err(err) => {
                let reason = err.to_string();
                output.emit(
                    Severity::Fatal,
                    Event::BackupFailed,
                    &[("backup_id", self.backup_id()), ("reason", reason.as_str())],
                );
            }
        }

        result
    }

    fn execute_inner(&self) -> ExecutorResult<RunReport> {
        let base = &self.base;
        let mut reports = Vec::new();
        let mut dispatched = Vec::new();

        for mut task in base.registry.build_each(base.task_init(&self.workdir)) {
            if let Some(state) = base.precheck(task.as_ref()) {
                reports.push(TaskReport::new(task.id(), task.human_name(), state, None));
                continue;
            }

            base.inject_registry_bucket(task.as_mut());
            base.output.info(
                Event::TaskStart,
                &[("task", task.id()), ("name", task.human_name())],
            );

            let started = Instant::now();
            if let Err(err) = task.backup(&self.workdir) {
                let reason = err.to_string();
                base.output.error(
                    Event::TaskFailed,
                    &[("task", task.id()), ("phase", "backup"), ("reason", reason.as_str())],
                );
                return Err(ExecutorError::task_failed(task.id(), err));
            }

            let report = base.finish_task(task.as_mut(), started);
            reports.push(report);

            if task.as_asynchronous().is_some() {
                dispatched.push(Dispatched {
                    report_index: reports.len() - 1,
                    task,
                });
            }
        }

        base.wait_for_dispatched(dispatched, &mut reports);

        let metadata_path = self
            .metadata
            .write(&self.workdir)
            .map_err(ExecutorError::metadata_write)?;
        let metadata_path = metadata_path.display().to_string();
        base.output
            .info(Event::MetadataWritten, &[("path", metadata_path.as_str())]);

        let moved = promote(&self.workdir, &self.archive_directory)?.to_string();
        let archive_directory = self.archive_directory.display().to_string();
        base.output.info(
            Event::ArchivePromoted,
            &[
                ("archive_directory", archive_directory.as_str()),
                ("entries", moved.as_str()),
            ],
        );

        Ok(RunReport {
            direction: Direction::Backup,
            backup_id: self.metadata.backup_id.clone(),
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
