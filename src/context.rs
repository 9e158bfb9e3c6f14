//! Context contract consumed by the executors
//!
//! A context resolves where backups live and which product version is
//! producing them. Executors only read from it.

use std::path::{Path, PathBuf};

/// Read-only resolver for base directories and product version.
pub trait Context: Send + Sync {
    /// Directory under which every workdir and archive directory is created.
    fn backup_basedir(&self) -> &Path;

    /// Version string of the running product, recorded in metadata.
    fn gitlab_version(&self) -> &str;
}

/// Context with fixed values, built from configuration or in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticContext {
    basedir: PathBuf,
    version: String,
}

impl StaticContext {
    pub fn new(basedir: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            basedir: basedir.into(),
            version: version.into(),
        }
    }
}

impl Context for StaticContext {
    fn backup_basedir(&self) -> &Path {
        &self.basedir
    }

    fn gitlab_version(&self) -> &str {
        &self.version
    }
}
