//! Metadata errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors reading or writing the metadata sidecar
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("I/O error on metadata file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unparsable metadata file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Metadata field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("Archive is named {expected} but its metadata records {found}")]
    IdMismatch { expected: String, found: String },
}

impl MetadataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MetadataError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the sidecar is absent rather than damaged
    pub fn is_missing(&self) -> bool {
        matches!(self, MetadataError::Missing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_display_names_path() {
        let err = MetadataError::Missing(PathBuf::from("/b/x/backup_information.json"));
        assert!(err.to_string().contains("/b/x/backup_information.json"));
        assert!(err.is_missing());
    }

    #[test]
    fn test_io_keeps_source() {
        use std::error::Error as _;

        let err = MetadataError::io("/b", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(!err.is_missing());
        assert!(err.source().is_some());
    }
}
