//! Configuration file
//!
//! A single JSON object. `backup_path` and `gitlab_version` are required,
//! everything else has a default. The loaded config is the run's Context.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::executor::{is_plain_name, ExecutorOptions};
use crate::tasks::{DirectoryTask, Task, TaskDefinition, TaskRegistry};

use super::errors::{CliError, CliResult};

/// One directory-backed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub id: String,
    pub human_name: String,
    pub source: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base directory holding archives and workdirs (required)
    pub backup_path: String,

    /// Application version recorded in every backup (required)
    pub gitlab_version: String,

    #[serde(default)]
    pub backup_bucket: Option<String>,

    #[serde(default)]
    pub registry_bucket: Option<String>,

    #[serde(default)]
    pub service_account_file: Option<PathBuf>,

    /// Block on asynchronous tasks (default: true)
    #[serde(default = "default_wait_for_completion")]
    pub wait_for_completion: bool,

    /// Archive retention in seconds, 0 keeps everything
    #[serde(default)]
    pub keep_time: u64,

    #[serde(default)]
    pub skip: Vec<String>,

    /// Tasks in run order
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

fn default_wait_for_completion() -> bool {
    true
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.backup_path.trim().is_empty() {
            return Err(CliError::config_error("backup_path must not be empty"));
        }

        if self.gitlab_version.trim().is_empty() {
            return Err(CliError::config_error("gitlab_version must not be empty"));
        }

        // The version ends up in every archive directory name.
        if !is_plain_name(&self.gitlab_version) {
            return Err(CliError::config_error(format!(
                "Invalid gitlab_version: '{}'. It must not contain path separators or start with '.'",
                self.gitlab_version
            )));
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(CliError::config_error(format!(
                    "Duplicate task id: '{}'",
                    task.id
                )));
            }
        }

        // Building the registry checks empty ids and run order.
        self.registry().map(|_| ())
    }

    /// Executor options as written in the file
    pub fn options(&self) -> ExecutorOptions {
        ExecutorOptions {
            backup_bucket: self.backup_bucket.clone(),
            wait_for_completion: self.wait_for_completion,
            registry_bucket: self.registry_bucket.clone(),
            service_account_file: self.service_account_file.clone(),
            skip: self.skip.clone(),
        }
    }

    /// Registry of directory tasks in file order
    pub fn registry(&self) -> CliResult<TaskRegistry> {
        let definitions = self
            .tasks
            .iter()
            .map(|task| {
                let task = task.clone();
                TaskDefinition::new(task.id.clone(), task.human_name.clone(), move |_| {
                    Box::new(DirectoryTask::new(
                        task.id.clone(),
                        task.human_name.clone(),
                        task.source.clone(),
                    )) as Box<dyn Task>
                })
            })
            .collect();

        let registry = TaskRegistry::new(definitions)?;
        registry.ensure_canonical_order()?;
        Ok(registry)
    }
}

impl Context for Config {
    fn backup_basedir(&self) -> &Path {
        Path::new(&self.backup_path)
    }

    fn gitlab_version(&self) -> &str {
        &self.gitlab_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, value: serde_json::Value) -> PathBuf {
        let path = temp_dir.path().join("backupctl.json");
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({"backup_path": "/var/backups", "gitlab_version": "17.2.0"}),
        );

        let config = Config::load(&path).unwrap();
        assert!(config.wait_for_completion);
        assert_eq!(config.keep_time, 0);
        assert!(config.tasks.is_empty());
        assert_eq!(config.backup_basedir(), Path::new("/var/backups"));
        assert_eq!(config.gitlab_version(), "17.2.0");
    }

    #[test]
    fn test_options_mirror_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({
                "backup_path": "/var/backups",
                "gitlab_version": "17.2.0",
                "backup_bucket": "bucket",
                "wait_for_completion": false,
                "skip": ["uploads"]
            }),
        );

        let options = Config::load(&path).unwrap().options();
        assert_eq!(options.backup_bucket.as_deref(), Some("bucket"));
        assert!(!options.wait_for_completion);
        assert!(options.is_skipped("uploads"));
    }

    #[test]
    fn test_rejects_empty_backup_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({"backup_path": "", "gitlab_version": "1.0"}));

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert!(err.message().contains("backup_path"));
    }

    #[test]
    fn test_rejects_missing_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({"backup_path": "/var/backups"}));

        let err = Config::load(&path).unwrap_err();
        assert!(err.message().contains("Invalid config JSON"));
    }

    #[test]
    fn test_rejects_version_with_path_separator() {
        let temp_dir = TempDir::new().unwrap();

        for version in ["17.2/0", "../17.2.0", ".17"] {
            let path = write_config(
                &temp_dir,
                json!({"backup_path": "/var/backups", "gitlab_version": version}),
            );

            let err = Config::load(&path).unwrap_err();
            assert_eq!(err.code(), &CliErrorCode::ConfigError, "{}", version);
            assert!(err.message().contains("Invalid gitlab_version"), "{}", version);
        }
    }

    #[test]
    fn test_rejects_duplicate_task_ids() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({
                "backup_path": "/var/backups",
                "gitlab_version": "1.0",
                "tasks": [
                    {"id": "db", "human_name": "Database", "source": "/srv/db"},
                    {"id": "db", "human_name": "Database again", "source": "/srv/db2"}
                ]
            }),
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.message().contains("Duplicate task id"));
    }

    #[test]
    fn test_rejects_out_of_order_tasks() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({
                "backup_path": "/var/backups",
                "gitlab_version": "1.0",
                "tasks": [
                    {"id": "uploads", "human_name": "Uploads", "source": "/srv/uploads"},
                    {"id": "db", "human_name": "Database", "source": "/srv/db"}
                ]
            }),
        );

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert!(err.message().contains("db"));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::load(&temp_dir.path().join("absent.json")).unwrap_err();
        assert!(err.message().contains("Failed to read config"));
    }

    #[test]
    fn test_registry_follows_file_order() {
        let config = Config {
            backup_path: "/var/backups".into(),
            gitlab_version: "1.0".into(),
            backup_bucket: None,
            registry_bucket: None,
            service_account_file: None,
            wait_for_completion: true,
            keep_time: 0,
            skip: Vec::new(),
            tasks: vec![
                TaskConfig {
                    id: "db".into(),
                    human_name: "Database".into(),
                    source: "/srv/db".into(),
                },
                TaskConfig {
                    id: "uploads".into(),
                    human_name: "Uploads".into(),
                    source: "/srv/uploads".into(),
                },
            ],
        };

        let registry = config.registry().unwrap();
        assert_eq!(registry.ids(), vec!["db", "uploads"]);
        assert_eq!(registry.get("uploads").unwrap().human_name(), "Uploads");
    }
}
