//! Backup tasks
//!
//! A task encapsulates exactly one backup domain (database, repositories,
//! uploads, ...) behind a uniform contract, so executors never special-case
//! a domain. Optional behavior is expressed as capabilities a task either
//! exposes or doesn't:
//!
//! - [`Asynchronous`]: `backup`/`restore` may return after merely dispatching
//!   work; completion is observed through [`Asynchronous::wait_until_done`].
//! - [`ObjectStorageBound`]: the task syncs against remote bucket storage and
//!   accepts the registry bucket before it runs.
//!
//! # Lifecycle
//!
//! ```text
//! NotStarted -> Running -> Completed
//!                      \-> Failed
//!                      \-> Dispatched -> Completed | Failed   (asynchronous only)
//! ```

mod directory;
mod errors;
mod registry;

pub use directory::DirectoryTask;
pub use errors::{RegistryError, RegistryResult, TaskError, TaskResult};
pub use registry::{TaskDefinition, TaskFactory, TaskRegistry, CANONICAL_ORDER};

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::executor::ExecutorOptions;

/// Shared arguments every task is constructed with
#[derive(Clone, Copy)]
pub struct TaskInit<'a> {
    pub context: &'a dyn Context,
    pub options: &'a ExecutorOptions,
    /// The run's private scratch directory
    pub workdir: &'a Path,
}

impl<'a> TaskInit<'a> {
    pub fn new(context: &'a dyn Context, options: &'a ExecutorOptions, workdir: &'a Path) -> Self {
        Self {
            context,
            options,
            workdir,
        }
    }
}

impl fmt::Debug for TaskInit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskInit")
            .field("basedir", &self.context.backup_basedir())
            .field("options", self.options)
            .field("workdir", &self.workdir)
            .finish()
    }
}

/// One self-contained backup/restore unit.
///
/// Instances are owned by a single executor run and never reused between
/// runs or between directions.
pub trait Task: Send {
    /// Stable identifier, unique within a registry
    fn id(&self) -> &str;

    /// Display label
    fn human_name(&self) -> &str;

    /// Back this domain up into `workdir`.
    fn backup(&mut self, workdir: &Path) -> TaskResult<()>;

    /// Restore this domain from `archive_directory`.
    fn restore(&mut self, archive_directory: &Path) -> TaskResult<()>;

    /// A disabled task is reported and not run.
    fn enabled(&self) -> bool {
        true
    }

    /// Shown before this task restores.
    fn pre_restore_warning(&self) -> Option<String> {
        None
    }

    /// Shown after this task restores.
    fn post_restore_warning(&self) -> Option<String> {
        None
    }

    /// The asynchronous capability, if this task has it.
    fn as_asynchronous(&mut self) -> Option<&mut dyn Asynchronous> {
        None
    }

    /// The object-storage capability, if this task has it.
    fn as_object_storage(&mut self) -> Option<&mut dyn ObjectStorageBound> {
        None
    }
}

/// Capability of tasks whose work may outlive the `backup`/`restore` call.
pub trait Asynchronous {
    /// Block until the dispatched work finishes.
    fn wait_until_done(&mut self) -> WaitOutcome;
}

/// Capability of tasks operating against remote bucket storage.
pub trait ObjectStorageBound {
    /// Receive the configured registry bucket before the task runs.
    fn set_registry_bucket(&mut self, bucket: Option<&str>);
}

/// Result of waiting on dispatched work
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaitOutcome {
    error: Option<String>,
}

impl WaitOutcome {
    pub fn success() -> Self {
        Self { error: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Observed state of one task within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum TaskState {
    NotStarted,
    Running,
    /// Call returned, work still in flight
    Dispatched,
    Completed,
    Failed(String),
    Skipped,
    Disabled,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::NotStarted => "not_started",
            TaskState::Running => "running",
            TaskState::Dispatched => "dispatched",
            TaskState::Completed => "completed",
            TaskState::Failed(_) => "failed",
            TaskState::Skipped => "skipped",
            TaskState::Disabled => "disabled",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskState::Failed(_))
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Task for Plain {
        fn id(&self) -> &str {
            "plain"
        }
        fn human_name(&self) -> &str {
            "plain task"
        }
        fn backup(&mut self, _workdir: &Path) -> TaskResult<()> {
            Ok(())
        }
        fn restore(&mut self, _archive_directory: &Path) -> TaskResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_capabilities() {
        let mut task = Plain;

        assert!(task.enabled());
        assert!(task.as_asynchronous().is_none());
        assert!(task.as_object_storage().is_none());
        assert!(task.pre_restore_warning().is_none());
        assert!(task.post_restore_warning().is_none());
    }

    #[test]
    fn test_wait_outcome() {
        assert!(!WaitOutcome::success().is_error());

        let failed = WaitOutcome::failure("sync job 42 failed");
        assert!(failed.is_error());
        assert_eq!(failed.error_message(), Some("sync job 42 failed"));
    }

    #[test]
    fn test_task_state_serialization() {
        let json = serde_json::to_value(TaskState::Failed("boom".into())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "boom");

        let json = serde_json::to_value(TaskState::Dispatched).unwrap();
        assert_eq!(json["state"], "dispatched");
    }

    #[test]
    fn test_task_state_display() {
        assert_eq!(TaskState::Completed.to_string(), "completed");
        assert_eq!(TaskState::Failed("x".into()).to_string(), "failed: x");
        assert!(TaskState::Failed("x".into()).is_failed());
    }
}
