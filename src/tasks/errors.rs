//! Task and registry errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for task operations
pub type TaskResult<T> = Result<T, TaskError>;

/// Result type for registry construction
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error raised by a task's backup or restore
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Failed(String),

    #[error("Remote storage error: {0}")]
    Remote(String),
}

impl TaskError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TaskError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }
}

/// Programmer errors detected while assembling a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Task id registered twice: {0}")]
    DuplicateId(String),

    #[error("Task {id} must be registered before {after}")]
    OutOfOrder { id: String, after: String },

    #[error("Task id must not be empty")]
    EmptyId,
}
