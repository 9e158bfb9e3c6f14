//! Per-run outcome reports
//!
//! A successful `execute` returns a [`RunReport`]. Asynchronous tasks whose
//! wait failed show up here as `TaskState::Failed`; they do not turn the
//! run into an error.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::tasks::TaskState;

/// Which way a run went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Backup,
    Restore,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Backup => write!(f, "backup"),
            Direction::Restore => write!(f, "restore"),
        }
    }
}

/// Outcome of one task within a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReport {
    pub id: String,
    pub human_name: String,
    #[serde(flatten)]
    pub state: TaskState,
    /// Wall-clock time of the `backup`/`restore` call
    pub duration: Option<Duration>,
}

impl TaskReport {
    pub fn new(
        id: impl Into<String>,
        human_name: impl Into<String>,
        state: TaskState,
        duration: Option<Duration>,
    ) -> Self {
        Self {
            id: id.into(),
            human_name: human_name.into(),
            state,
            duration,
        }
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub direction: Direction,
    pub backup_id: String,
    pub archive_directory: PathBuf,
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub fn task(&self, id: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks observed to completion
    pub fn succeeded(&self) -> Vec<&TaskReport> {
        self.with_state(|s| *s == TaskState::Completed)
    }

    /// Tasks whose wait reported an error
    pub fn failed(&self) -> Vec<&TaskReport> {
        self.with_state(TaskState::is_failed)
    }

    /// Tasks dispatched and never awaited
    pub fn dispatched(&self) -> Vec<&TaskReport> {
        self.with_state(|s| *s == TaskState::Dispatched)
    }

    /// No task failed and none is left in flight
    pub fn is_fully_successful(&self) -> bool {
        self.failed().is_empty() && self.dispatched().is_empty()
    }

    fn with_state<F>(&self, predicate: F) -> Vec<&TaskReport>
    where
        F: Fn(&TaskState) -> bool,
    {
        self.tasks.iter().filter(|t| predicate(&t.state)).collect()
    }
}
