//! Lifecycle events emitted during backup and restore runs

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded and validated
    ConfigLoaded,

    // Backup run
    /// Backup run started
    BackupStart,
    /// Metadata sidecar written into the workdir
    MetadataWritten,
    /// Workdir contents promoted into the archive directory
    ArchivePromoted,
    /// Backup run finished
    BackupComplete,
    /// Backup run aborted
    BackupFailed,

    // Restore run
    /// Restore run started
    RestoreStart,
    /// Metadata loaded from the archive directory
    MetadataLoaded,
    /// Restore run finished
    RestoreComplete,
    /// Restore run aborted
    RestoreFailed,

    // Per task
    /// Task started
    TaskStart,
    /// Synchronous task finished
    TaskComplete,
    /// Asynchronous task handed off its work
    TaskDispatched,
    /// Task failed, either inline or while being awaited
    TaskFailed,
    /// Task skipped by request
    TaskSkipped,
    /// Task disabled by its own configuration
    TaskDisabled,
    /// Waiting on an asynchronous task
    TaskWaitBegin,
    /// Warning text a task wants shown around its restore
    TaskWarning,

    // Workdir
    /// Workdir released
    WorkdirReleased,

    // Catalog
    /// Old backups pruning started
    PruneStart,
    /// One archive directory removed
    PruneRemoved,
    /// Removal of one archive directory failed
    PruneRemoveFailed,
    /// Pruning skipped (keep_time is 0)
    PruneSkipped,
    /// Pruning finished
    PruneComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::BackupStart => "BACKUP_BEGIN",
            Event::MetadataWritten => "METADATA_WRITTEN",
            Event::ArchivePromoted => "ARCHIVE_PROMOTED",
            Event::BackupComplete => "BACKUP_COMPLETE",
            Event::BackupFailed => "BACKUP_FAILED",

            Event::RestoreStart => "RESTORE_BEGIN",
            Event::MetadataLoaded => "METADATA_LOADED",
            Event::RestoreComplete => "RESTORE_COMPLETE",
            Event::RestoreFailed => "RESTORE_FAILED",

            Event::TaskStart => "TASK_BEGIN",
            Event::TaskComplete => "TASK_COMPLETE",
            Event::TaskDispatched => "TASK_DISPATCHED",
            Event::TaskFailed => "TASK_FAILED",
            Event::TaskSkipped => "TASK_SKIPPED",
            Event::TaskDisabled => "TASK_DISABLED",
            Event::TaskWaitBegin => "TASK_WAIT_BEGIN",
            Event::TaskWarning => "TASK_WARNING",

            Event::WorkdirReleased => "WORKDIR_RELEASED",

            Event::PruneStart => "PRUNE_BEGIN",
            Event::PruneRemoved => "PRUNE_REMOVED",
            Event::PruneRemoveFailed => "PRUNE_REMOVE_FAILED",
            Event::PruneSkipped => "PRUNE_SKIPPED",
            Event::PruneComplete => "PRUNE_COMPLETE",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
