//! Workdir lifecycle and archive promotion
//!
//! Layout under the backup base directory:
//!
//! ```text
//! <base>/
//! ├── .tmp-backup-<uuid>/      private workdir of a running backup
//! ├── .tmp-restore-<uuid>/     private workdir of a running restore
//! ├── <backup_id>.partial/     promotion in progress
//! └── <backup_id>/             promoted archive directory
//! ```
//!
//! Promotion moves every top-level workdir entry into `<backup_id>.partial`
//! and then renames that directory onto `<backup_id>` in one step, so an
//! archive directory is either absent or complete.

use std::fs::{self, OpenOptions};
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use super::errors::{ExecutorError, ExecutorResult};

/// Prefix of every private workdir
pub const WORKDIR_PREFIX: &str = ".tmp-";

/// Suffix of an archive directory still being promoted
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Whether a base-directory entry is scratch space rather than an archive
pub fn is_scratch_name(name: &str) -> bool {
    name.starts_with('.') || name.ends_with(PARTIAL_SUFFIX)
}

/// Whether `name` can be used as one directory directly under the base dir.
///
/// Dot-prefixed names are reserved for scratch space.
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.starts_with('.')
        && !name.contains(['/', '\\'])
}

/// Create the base directory if absent
pub fn ensure_basedir(basedir: &Path) -> ExecutorResult<()> {
    fs::create_dir_all(basedir).map_err(|e| ExecutorError::workdir(basedir, e))
}

/// Create a fresh private workdir under `basedir`
pub fn create_workdir(basedir: &Path, kind: &str) -> ExecutorResult<PathBuf> {
    ensure_basedir(basedir)?;

    let workdir = basedir.join(format!("{}{}-{}", WORKDIR_PREFIX, kind, Uuid::new_v4()));

    // create_dir, not create_dir_all: an existing directory is never adopted.
    fs::create_dir(&workdir).map_err(|e| ExecutorError::workdir(&workdir, e))?;

    Ok(workdir)
}

/// Recursively remove a workdir. Removing an absent workdir succeeds.
pub fn release_workdir(workdir: &Path) -> ExecutorResult<()> {
    if !workdir.exists() {
        return Ok(());
    }
    fs::remove_dir_all(workdir).map_err(|e| ExecutorError::io_error(workdir, e))
}

/// Move every top-level entry of `workdir` into `archive_directory`.
///
/// Returns the number of entries moved. Fails without touching the
/// workdir if the archive directory already exists.
pub fn promote(workdir: &Path, archive_directory: &Path) -> ExecutorResult<usize> {
    if archive_directory.exists() {
        return Err(ExecutorError::archive(format!(
            "Archive directory already exists: {}",
            archive_directory.display()
        )));
    }

    let partial = partial_path(archive_directory)?;
    if partial.exists() {
        // Left behind by an interrupted promotion; never a valid archive.
        fs::remove_dir_all(&partial).map_err(|e| ExecutorError::archive_io(&partial, e))?;
    }
    fs::create_dir(&partial).map_err(|e| ExecutorError::archive_io(&partial, e))?;

    let entries = fs::read_dir(workdir).map_err(|e| ExecutorError::io_error(workdir, e))?;
    let mut moved = 0;

    for entry in entries {
        let entry = entry.map_err(|e| ExecutorError::io_error(workdir, e))?;
        let target = partial.join(entry.file_name());

        fs::rename(entry.path(), &target).map_err(|e| ExecutorError::archive_io(&target, e))?;
        moved += 1;
    }

    fsync_dir(&partial)?;
    fs::rename(&partial, archive_directory)
        .map_err(|e| ExecutorError::archive_io(archive_directory, e))?;

    if let Some(parent) = archive_directory.parent() {
        fsync_dir(parent)?;
    }

    Ok(moved)
}

fn partial_path(archive_directory: &Path) -> ExecutorResult<PathBuf> {
    let name = archive_directory
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            ExecutorError::archive(format!(
                "Invalid archive directory: {}",
                archive_directory.display()
            ))
        })?;

    Ok(archive_directory.with_file_name(format!("{}{}", name, PARTIAL_SUFFIX)))
}

/// fsync a directory
fn fsync_dir(path: &Path) -> ExecutorResult<()> {
    let dir = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| ExecutorError::io_error(path, e))?;

    dir.sync_all().map_err(|e| ExecutorError::io_error(path, e))
}
