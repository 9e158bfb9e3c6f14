//! Executor error types
//!
//! Executor errors follow the coded error model:
//! - Structured codes in BACKUP_CATEGORY_NAME format
//! - Every executor error is FATAL to the run that raised it
//!
//! Failures while waiting on asynchronous tasks are not executor errors.
//! They are recorded per task in the run report.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::Path;

use crate::metadata::MetadataError;
use crate::tasks::TaskError;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run stopped and produced no promoted state
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Workdir or base directory could not be prepared
    BackupWorkdir,
    /// A task's backup or restore raised
    BackupTaskFailed,
    /// Metadata could not be written into the workdir
    BackupMetadataWrite,
    /// Metadata absent, unreadable or not matching the requested archive
    BackupMetadataMissing,
    /// Workdir contents could not be promoted into the archive directory
    BackupArchive,
    /// The requested backup id cannot name an archive directory
    BackupInvalidId,
    /// Other I/O failure
    BackupIo,
}

impl ExecutorErrorCode {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorErrorCode::BackupWorkdir => "BACKUP_WORKDIR",
            ExecutorErrorCode::BackupTaskFailed => "BACKUP_TASK_FAILED",
            ExecutorErrorCode::BackupMetadataWrite => "BACKUP_METADATA_WRITE",
            ExecutorErrorCode::BackupMetadataMissing => "BACKUP_METADATA_MISSING",
            ExecutorErrorCode::BackupArchive => "BACKUP_ARCHIVE",
            ExecutorErrorCode::BackupInvalidId => "BACKUP_INVALID_ID",
            ExecutorErrorCode::BackupIo => "BACKUP_IO",
        }
    }

    /// Returns the severity level for this error code
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Executor error with full context
#[derive(Debug)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    task_id: Option<String>,
    source: Option<BoxedSource>,
}

impl ExecutorError {
    fn new(code: ExecutorErrorCode, message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self {
            code,
            message: message.into(),
            task_id: None,
            source,
        }
    }

    /// Workdir or base directory preparation failed
    pub fn workdir(path: &Path, source: io::Error) -> Self {
        Self::new(
            ExecutorErrorCode::BackupWorkdir,
            format!("Failed to prepare directory: {}", path.display()),
            Some(Box::new(source)),
        )
    }

    /// A task raised during backup or restore
    pub fn task_failed(task_id: &str, source: TaskError) -> Self {
        let mut err = Self::new(
            ExecutorErrorCode::BackupTaskFailed,
            format!("Task {} failed", task_id),
            Some(Box::new(source)),
        );
        err.task_id = Some(task_id.to_string());
        err
    }

    /// Metadata could not be written
    pub fn metadata_write(source: MetadataError) -> Self {
        Self::new(
            ExecutorErrorCode::BackupMetadataWrite,
            "Failed to write backup metadata",
            Some(Box::new(source)),
        )
    }

    /// Metadata could not be loaded for restore
    pub fn metadata_missing(archive_directory: &Path, source: MetadataError) -> Self {
        Self::new(
            ExecutorErrorCode::BackupMetadataMissing,
            format!(
                "No usable backup metadata in {}",
                archive_directory.display()
            ),
            Some(Box::new(source)),
        )
    }

    /// Promotion into the archive directory failed
    pub fn archive(message: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::BackupArchive, message, None)
    }

    /// Promotion into the archive directory failed with an I/O cause
    pub fn archive_io(path: &Path, source: io::Error) -> Self {
        Self::new(
            ExecutorErrorCode::BackupArchive,
            format!("Failed to promote archive at {}", path.display()),
            Some(Box::new(source)),
        )
    }

    /// Backup id unusable as a directory name
    pub fn invalid_backup_id(backup_id: &str) -> Self {
        Self::new(
            ExecutorErrorCode::BackupInvalidId,
            format!("Invalid backup id: {:?}", backup_id),
            None,
        )
    }

    /// Other I/O error
    pub fn io_error(path: &Path, source: io::Error) -> Self {
        Self::new(
            ExecutorErrorCode::BackupIo,
            format!("I/O error at {}", path.display()),
            Some(Box::new(source)),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Id of the task that raised, for task failures
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Returns the severity of this error
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Executor errors always end the run
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl StdError for ExecutorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
