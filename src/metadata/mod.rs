//! Backup metadata
//!
//! Every backup carries one identity record, written as the last step of a
//! backup and read back first on restore:
//!
//! - `backup_id`: `<unix-epoch>_<Y>_<M>_<D>_<version>`, doubles as the archive directory name
//! - `created_at`: RFC3339 timestamp, fixed at construction
//! - `gitlab_version`: version of the product that produced the backup
//!
//! Location inside the archive: `backup_information.json`

mod errors;

pub use errors::{MetadataError, MetadataResult};

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the metadata sidecar file
pub const METADATA_FILE_NAME: &str = "backup_information.json";

/// Identity and versioning record for one backup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupMetadata {
    /// Unique, sortable identifier; also the archive directory name
    pub backup_id: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Version of the product that produced this backup
    pub gitlab_version: String,
}

impl BackupMetadata {
    /// Build a record for a backup starting now. Does not touch disk.
    pub fn build(gitlab_version: &str) -> Self {
        Self::build_at(gitlab_version, Utc::now())
    }

    /// Build a record with an explicit creation time
    pub fn build_at(gitlab_version: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            backup_id: Self::backup_id_for(created_at, gitlab_version),
            created_at,
            gitlab_version: gitlab_version.to_string(),
        }
    }

    /// Compute the backup id for a creation time and version
    pub fn backup_id_for(created_at: DateTime<Utc>, gitlab_version: &str) -> String {
        format!(
            "{}_{}",
            created_at.format("%s_%Y_%m_%d"),
            gitlab_version
        )
    }

    /// Location of the sidecar inside `dir`
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(METADATA_FILE_NAME)
    }

    /// Whether `dir` holds a sidecar file
    pub fn exists_in(dir: &Path) -> bool {
        Self::path_in(dir).is_file()
    }

    /// Serialize the record
    pub fn to_json(&self) -> MetadataResult<String> {
        serde_json::to_string_pretty(self).map_err(MetadataError::Serialize)
    }

    /// Write the sidecar into `workdir` with fsync.
    ///
    /// The file is written under a temporary name and renamed into place, so
    /// a reader never sees a half-written record.
    pub fn write(&self, workdir: &Path) -> MetadataResult<PathBuf> {
        let json = self.to_json()?;
        let path = Self::path_in(workdir);
        let tmp_path = workdir.join(format!("{}.tmp", METADATA_FILE_NAME));

        let mut file = File::create(&tmp_path).map_err(|e| MetadataError::io(&tmp_path, e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| MetadataError::io(&tmp_path, e))?;
        file.sync_all().map_err(|e| MetadataError::io(&tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(|e| MetadataError::io(&path, e))?;

        Ok(path)
    }

    /// Read the sidecar from an already-resolved archive directory
    pub fn load(archive_directory: &Path) -> MetadataResult<Self> {
        let path = Self::path_in(archive_directory);

        let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MetadataError::Missing(path.clone()),
            _ => MetadataError::io(&path, e),
        })?;

        let metadata: BackupMetadata = serde_json::from_str(&contents)
            .map_err(|source| MetadataError::Parse { path, source })?;

        metadata.validate()?;
        Ok(metadata)
    }

    fn validate(&self) -> MetadataResult<()> {
        if self.backup_id.trim().is_empty() {
            return Err(MetadataError::EmptyField("backup_id"));
        }
        if self.gitlab_version.trim().is_empty() {
            return Err(MetadataError::EmptyField("gitlab_version"));
        }
        Ok(())
    }

    /// Fails unless this record carries `expected` as its id
    pub fn ensure_id(&self, expected: &str) -> MetadataResult<()> {
        if self.backup_id != expected {
            return Err(MetadataError::IdMismatch {
                expected: expected.to_string(),
                found: self.backup_id.clone(),
            });
        }
        Ok(())
    }
}
