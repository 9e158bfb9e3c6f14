//! Archive catalog
//!
//! Read and housekeeping operations over the archive directories under one
//! backup base directory:
//!
//! - `list`: promoted archives holding readable metadata, oldest first
//! - `resolve`: pick the archive a restore should use
//! - `prune`: remove archives older than a keep time
//!
//! Workdirs (`.tmp-*`) and interrupted promotions (`*.partial`) are never
//! listed and never pruned.

mod errors;

pub use errors::{CatalogError, CatalogResult};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::executor::is_scratch_name;
use crate::metadata::BackupMetadata;
use crate::observability::Event;
use crate::output::Output;

/// `<epoch>[_Y_M_D[_x.y.z[-pre|.pre|-rcN][-ee]]]`
const ARCHIVE_NAME_PATTERN: &str =
    r"^(?P<timestamp>\d{10})(?:_\d{4}_\d{2}_\d{2}(?:_\d+\.\d+\.\d+(?:(?:-|\.)(?:pre|rc\d))?(?:-ee)?)?)?$";

fn archive_name_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(ARCHIVE_NAME_PATTERN).ok())
        .as_ref()
}

/// Creation epoch encoded in an archive directory name, if it follows the
/// backup id naming scheme.
pub fn archive_timestamp(name: &str) -> Option<i64> {
    archive_name_regex()?
        .captures(name)
        .and_then(|caps| caps.name("timestamp"))
        .and_then(|m| m.as_str().parse().ok())
}

/// One promoted archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub path: PathBuf,
    pub metadata: BackupMetadata,
}

impl CatalogEntry {
    pub fn backup_id(&self) -> &str {
        &self.metadata.backup_id
    }
}

/// Outcome of a prune pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Pruning was disabled by a keep time of 0
    pub skipped: bool,
    pub removed: Vec<String>,
    /// `(archive name, error)` for removals that failed
    pub failures: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct BackupCatalog {
    basedir: PathBuf,
}

impl BackupCatalog {
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
        }
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    /// Promoted archives, oldest first. A missing base directory is empty.
    pub fn list(&self) -> CatalogResult<Vec<CatalogEntry>> {
        let mut entries = Vec::new();

        for (name, path) in self.archive_dirs()? {
            if is_scratch_name(&name) {
                continue;
            }
            // Directories without usable metadata are not restorable archives.
            if let Ok(metadata) = BackupMetadata::load(&path) {
                entries.push(CatalogEntry { path, metadata });
            }
        }

        entries.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.metadata.backup_id.cmp(&b.metadata.backup_id))
        });

        Ok(entries)
    }

    /// Choose the backup id a restore should use.
    ///
    /// An explicit id must name a listed archive. Without one, exactly one
    /// archive must exist.
    pub fn resolve(&self, requested: Option<&str>) -> CatalogResult<String> {
        let entries = self.list()?;

        if let Some(id) = requested {
            return entries
                .iter()
                .find(|e| e.backup_id() == id)
                .map(|e| e.backup_id().to_string())
                .ok_or_else(|| CatalogError::NotFound(id.to_string()));
        }

        match entries.as_slice() {
            [] => Err(CatalogError::NoBackups(self.basedir.clone())),
            [only] => Ok(only.backup_id().to_string()),
            many => Err(CatalogError::Ambiguous(
                many.iter().map(|e| e.backup_id().to_string()).collect(),
            )),
        }
    }

    /// Remove archives whose name-encoded creation time is older than
    /// `now - keep_time_secs`. A keep time of 0 disables pruning.
    ///
    /// Names outside the backup id scheme are left alone. A failed removal
    /// is recorded and the pass continues.
    pub fn prune(
        &self,
        keep_time_secs: u64,
        now: DateTime<Utc>,
        output: &dyn Output,
    ) -> CatalogResult<PruneReport> {
        let mut report = PruneReport::default();

        if keep_time_secs == 0 {
            output.info(Event::PruneSkipped, &[("reason", "keep_time is 0")]);
            report.skipped = true;
            return Ok(report);
        }

        output.info(Event::PruneStart, &[]);
        let keep_time = i64::try_from(keep_time_secs).unwrap_or(i64::MAX);
        let cutoff = now.timestamp().saturating_sub(keep_time);

        for (name, path) in self.archive_dirs()? {
            if is_scratch_name(&name) {
                continue;
            }
            let Some(timestamp) = archive_timestamp(&name) else {
                continue;
            };
            if timestamp >= cutoff {
                continue;
            }

            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    output.info(Event::PruneRemoved, &[("backup_id", name.as_str())]);
                    report.removed.push(name);
                }
                Err(e) => {
                    let reason = e.to_string();
                    output.error(
                        Event::PruneRemoveFailed,
                        &[("backup_id", name.as_str()), ("reason", reason.as_str())],
                    );
                    report.failures.push((name, reason));
                }
            }
        }

        let removed = report.removed.len().to_string();
        output.info(Event::PruneComplete, &[("removed", removed.as_str())]);

        Ok(report)
    }

    /// `(name, path)` of every directory directly under the base dir, sorted by name
    fn archive_dirs(&self) -> CatalogResult<Vec<(String, PathBuf)>> {
        if !self.basedir.exists() {
            return Ok(Vec::new());
        }

        let read = fs::read_dir(&self.basedir).map_err(|e| CatalogError::io(&self.basedir, e))?;
        let mut dirs = Vec::new();

        for entry in read {
            let entry = entry.map_err(|e| CatalogError::io(&self.basedir, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                dirs.push((name.to_string(), path));
            }
        }

        dirs.sort();
        Ok(dirs)
    }
}
