//! Directory task
//!
//! A synchronous, local-disk task: packs a source directory into
//! `<workdir>/<id>.tar` on backup and unpacks `<archive>/<id>.tar` back into
//! the source directory on restore.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tar::{Archive, Builder};

use super::errors::{TaskError, TaskResult};
use super::Task;

#[derive(Debug, Clone)]
pub struct DirectoryTask {
    id: String,
    human_name: String,
    source: PathBuf,
}

impl DirectoryTask {
    pub fn new(id: impl Into<String>, human_name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            human_name: human_name.into(),
            source: source.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Name of the tarball this task owns inside a backup
    pub fn archive_name(&self) -> String {
        format!("{}.tar", self.id)
    }
}

impl Task for DirectoryTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn human_name(&self) -> &str {
        &self.human_name
    }

    fn backup(&mut self, workdir: &Path) -> TaskResult<()> {
        if !self.source.is_dir() {
            return Err(TaskError::failed(format!(
                "Source directory does not exist: {}",
                self.source.display()
            )));
        }

        let tar_path = workdir.join(self.archive_name());
        let file = File::create(&tar_path).map_err(|e| TaskError::io(&tar_path, e))?;

        let mut builder = Builder::new(file);
        builder
            .append_dir_all(".", &self.source)
            .map_err(|e| TaskError::io(&self.source, e))?;

        let file = builder
            .into_inner()
            .map_err(|e| TaskError::io(&tar_path, e))?;
        file.sync_all().map_err(|e| TaskError::io(&tar_path, e))?;

        Ok(())
    }

    fn restore(&mut self, archive_directory: &Path) -> TaskResult<()> {
        let tar_path = archive_directory.join(self.archive_name());
        if !tar_path.is_file() {
            return Err(TaskError::failed(format!(
                "Backup file not found: {}",
                tar_path.display()
            )));
        }

        fs::create_dir_all(&self.source).map_err(|e| TaskError::io(&self.source, e))?;

        let file = File::open(&tar_path).map_err(|e| TaskError::io(&tar_path, e))?;
        Archive::new(file)
            .unpack(&self.source)
            .map_err(|e| TaskError::io(&self.source, e))?;

        Ok(())
    }
}
