//! Configuration shared by both directions

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::observability::Event;
use crate::output::Output;
use crate::tasks::{Task, TaskInit, TaskRegistry, TaskState};

use super::report::TaskReport;

/// Options common to backup and restore runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorOptions {
    /// Remote bucket receiving the backup archive
    pub backup_bucket: Option<String>,

    /// Block until every asynchronous task finishes
    pub wait_for_completion: bool,

    /// Bucket for container-registry sync, injected into object-storage tasks
    pub registry_bucket: Option<String>,

    /// Service-account credential file for remote storage
    pub service_account_file: Option<PathBuf>,

    /// Task ids not to run
    #[serde(default)]
    pub skip: Vec<String>,
}

impl ExecutorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backup_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.backup_bucket = Some(bucket.into());
        self
    }

    pub fn with_wait_for_completion(mut self, wait: bool) -> Self {
        self.wait_for_completion = wait;
        self
    }

    pub fn with_registry_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.registry_bucket = Some(bucket.into());
        self
    }

    pub fn with_service_account_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.service_account_file = Some(path.into());
        self
    }

    pub fn with_skip<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_skipped(&self, id: &str) -> bool {
        self.skip.iter().any(|s| s == id)
    }
}

/// Collaborators and options every executor run is built from
pub struct BaseExecutor<'a> {
    pub(crate) context: &'a dyn Context,
    pub(crate) registry: &'a TaskRegistry,
    pub(crate) options: ExecutorOptions,
    pub(crate) output: &'a dyn Output,
}

/// A task handed off asynchronously and the report slot it updates
pub(crate) struct Dispatched {
    pub(crate) report_index: usize,
    pub(crate) task: Box<dyn Task>,
}

impl<'a> BaseExecutor<'a> {
    pub fn new(
        context: &'a dyn Context,
        registry: &'a TaskRegistry,
        options: ExecutorOptions,
        output: &'a dyn Output,
    ) -> Self {
        Self {
            context,
            registry,
            options,
            output,
        }
    }

    pub fn context(&self) -> &dyn Context {
        self.context
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    pub(crate) fn task_init<'s>(&'s self, workdir: &'s std::path::Path) -> TaskInit<'s> {
        TaskInit::new(self.context, &self.options, workdir)
    }

    /// Report and return the state of a task that must not run, if any.
    pub(crate) fn precheck(&self, task: &dyn Task) -> Option<TaskState> {
        let fields = [("task", task.id()), ("name", task.human_name())];

        if self.options.is_skipped(task.id()) {
            self.output.info(Event::TaskSkipped, &fields);
            return Some(TaskState::Skipped);
        }
        if !task.enabled() {
            self.output.info(Event::TaskDisabled, &fields);
            return Some(TaskState::Disabled);
        }
        None
    }

    pub(crate) fn inject_registry_bucket(&self, task: &mut dyn Task) {
        if let Some(bound) = task.as_object_storage() {
            bound.set_registry_bucket(self.options.registry_bucket.as_deref());
        }
    }

    /// Report the end of a task's call and build its report entry.
    ///
    /// Asynchronous tasks are reported as dispatched; their completion is
    /// reported by [`BaseExecutor::wait_for_dispatched`].
    pub(crate) fn finish_task(&self, task: &mut dyn Task, started: Instant) -> TaskReport {
        let duration = started.elapsed();
        let asynchronous = task.as_asynchronous().is_some();
        let object_storage = task.as_object_storage().is_some();

        let seconds = format!("{:.3}", duration.as_secs_f64());
        let mut fields = vec![("task", task.id()), ("name", task.human_name())];
        // Remote sync time is not local work; only disk tasks report a duration.
        if !object_storage {
            fields.push(("duration_secs", seconds.as_str()));
        }

        let state = if asynchronous {
            self.output.info(Event::TaskDispatched, &fields);
            TaskState::Dispatched
        } else {
            self.output.info(Event::TaskComplete, &fields);
            TaskState::Completed
        };

        TaskReport::new(task.id(), task.human_name(), state, Some(duration))
    }

    /// Wait on every dispatched task when configured to.
    ///
    /// A failed wait is recorded and reported; waiting continues with the
    /// remaining tasks.
    pub(crate) fn wait_for_dispatched(&self, dispatched: Vec<Dispatched>, reports: &mut [TaskReport]) {
        if !self.options.wait_for_completion {
            return;
        }

        for Dispatched {
            report_index,
            mut task,
        } in dispatched
        {
            let id = task.id().to_string();
            let name = task.human_name().to_string();
            let Some(waitable) = task.as_asynchronous() else {
                continue;
            };

            self.output
                .info(Event::TaskWaitBegin, &[("task", id.as_str()), ("name", name.as_str())]);
            let outcome = waitable.wait_until_done();

            let state = match outcome.error_message() {
                Some(reason) => {
                    self.output.error(
                        Event::TaskFailed,
                        &[("task", id.as_str()), ("name", name.as_str()), ("phase", "wait"), ("reason", reason)],
                    );
                    TaskState::Failed(reason.to_string())
                }
                None => {
                    self.output
                        .info(Event::TaskComplete, &[("task", id.as_str()), ("name", name.as_str())]);
                    TaskState::Completed
                }
            };

            if let Some(report) = reports.get_mut(report_index) {
                report.state = state;
            }
        }
    }
}
