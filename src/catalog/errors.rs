//! Catalog errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No backups found in {}", .0.display())]
    NoBackups(PathBuf),

    #[error("Found more than one backup, choose one of: {}", .0.join(", "))]
    Ambiguous(Vec<String>),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}
