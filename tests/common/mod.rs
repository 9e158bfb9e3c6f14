//! Shared fakes for executor integration tests
//!
//! `FakeTask` records every call it receives into a journal shared by all
//! tasks of one registry, so tests can assert on cross-task ordering.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use backupctl::context::StaticContext;
use backupctl::tasks::{
    Asynchronous, ObjectStorageBound, Task, TaskDefinition, TaskError, TaskRegistry, TaskResult,
    WaitOutcome,
};
use tempfile::TempDir;

/// Ordered record of calls such as `backup:db` or `wait:registry`
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Behavior of one fake task
#[derive(Debug, Clone)]
pub struct FakeSpec {
    pub id: String,
    pub human_name: String,
    /// Files written under the workdir on backup, relative paths
    pub writes: Vec<(String, Vec<u8>)>,
    /// Relative path that must exist in the archive for restore to succeed
    pub requires: Option<String>,
    pub fail_backup: bool,
    pub fail_restore: bool,
    /// `Some` makes the task asynchronous with this wait result
    pub wait: Option<WaitOutcome>,
    pub object_storage: bool,
    pub enabled: bool,
    pub pre_warning: Option<String>,
    pub post_warning: Option<String>,
}

impl FakeSpec {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            human_name: format!("{} task", id),
            writes: Vec::new(),
            requires: None,
            fail_backup: false,
            fail_restore: false,
            wait: None,
            object_storage: false,
            enabled: true,
            pre_warning: None,
            post_warning: None,
        }
    }

    pub fn writes(mut self, path: &str, contents: &[u8]) -> Self {
        self.writes.push((path.to_string(), contents.to_vec()));
        self
    }

    pub fn requires(mut self, path: &str) -> Self {
        self.requires = Some(path.to_string());
        self
    }

    pub fn failing_backup(mut self) -> Self {
        self.fail_backup = true;
        self
    }

    pub fn failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    pub fn asynchronous(mut self, outcome: WaitOutcome) -> Self {
        self.wait = Some(outcome);
        self
    }

    pub fn object_storage(mut self) -> Self {
        self.object_storage = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn warnings(mut self, pre: Option<&str>, post: Option<&str>) -> Self {
        self.pre_warning = pre.map(str::to_string);
        self.post_warning = post.map(str::to_string);
        self
    }
}

pub struct FakeTask {
    spec: FakeSpec,
    journal: Journal,
}

impl Task for FakeTask {
    fn id(&self) -> &str {
        &self.spec.id
    }

    fn human_name(&self) -> &str {
        &self.spec.human_name
    }

    fn backup(&mut self, workdir: &Path) -> TaskResult<()> {
        self.journal.push(format!("backup:{}", self.spec.id));
        if self.spec.fail_backup {
            return Err(TaskError::failed(format!("{} backup exploded", self.spec.id)));
        }

        for (relative, contents) in &self.spec.writes {
            let path = workdir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
            }
            fs::write(&path, contents).map_err(|e| TaskError::io(&path, e))?;
        }
        Ok(())
    }

    fn restore(&mut self, archive_directory: &Path) -> TaskResult<()> {
        self.journal.push(format!("restore:{}", self.spec.id));
        if self.spec.fail_restore {
            return Err(TaskError::failed(format!("{} restore exploded", self.spec.id)));
        }

        if let Some(relative) = &self.spec.requires {
            if !archive_directory.join(relative).exists() {
                return Err(TaskError::failed(format!("{} not in archive", relative)));
            }
        }
        Ok(())
    }

    fn enabled(&self) -> bool {
        self.spec.enabled
    }

    fn pre_restore_warning(&self) -> Option<String> {
        self.spec.pre_warning.clone()
    }

    fn post_restore_warning(&self) -> Option<String> {
        self.spec.post_warning.clone()
    }

    fn as_asynchronous(&mut self) -> Option<&mut dyn Asynchronous> {
        if self.spec.wait.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_object_storage(&mut self) -> Option<&mut dyn ObjectStorageBound> {
        if self.spec.object_storage {
            Some(self)
        } else {
            None
        }
    }
}

impl Asynchronous for FakeTask {
    fn wait_until_done(&mut self) -> WaitOutcome {
        self.journal.push(format!("wait:{}", self.spec.id));
        self.spec.wait.clone().unwrap_or_default()
    }
}

impl ObjectStorageBound for FakeTask {
    fn set_registry_bucket(&mut self, bucket: Option<&str>) {
        self.journal.push(format!(
            "bucket:{}={}",
            self.spec.id,
            bucket.unwrap_or("<none>")
        ));
    }
}

/// Registry of fake tasks in the given order, all sharing `journal`
pub fn registry(specs: Vec<FakeSpec>, journal: &Journal) -> TaskRegistry {
    let definitions = specs
        .into_iter()
        .map(|spec| {
            let journal = journal.clone();
            TaskDefinition::new(spec.id.clone(), spec.human_name.clone(), move |_| {
                journal.push(format!("build:{}", spec.id));
                Box::new(FakeTask {
                    spec: spec.clone(),
                    journal: journal.clone(),
                }) as Box<dyn Task>
            })
        })
        .collect();

    TaskRegistry::new(definitions).unwrap()
}

/// Scratch base directory plus a context pointing at it
pub fn scratch_context(version: &str) -> (TempDir, StaticContext) {
    let temp_dir = TempDir::new().unwrap();
    let basedir = temp_dir.path().join("backups");
    let context = StaticContext::new(&basedir, version);
    (temp_dir, context)
}

/// Names of entries directly under `dir`, sorted
pub fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Hand-write an archive directory with a metadata file
pub fn write_archive(
    basedir: &Path,
    dir_name: &str,
    backup_id: &str,
    gitlab_version: &str,
) -> PathBuf {
    let archive = basedir.join(dir_name);
    fs::create_dir_all(&archive).unwrap();
    let metadata = serde_json::json!({
        "backup_id": backup_id,
        "created_at": "2019-01-01T00:00:00Z",
        "gitlab_version": gitlab_version
    });
    fs::write(archive.join("backup_information.json"), metadata.to_string()).unwrap();
    archive
}
