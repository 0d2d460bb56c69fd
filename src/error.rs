use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirscanError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata for a node could not be read. Aborts the scan.
    #[error("cannot stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate path: {path}")]
    DuplicatePath { path: String },

    #[error("parent entry {parent_id} does not exist")]
    DanglingParent { parent_id: i64 },

    #[error("parent entry {parent_id} is not a directory")]
    ParentNotDirectory { parent_id: i64 },

    #[error("invalid exclude pattern: {0}")]
    Exclude(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl DirscanError {
    /// Whether this error came from a store constraint rather than the filesystem.
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            DirscanError::DuplicatePath { .. }
                | DirscanError::DanglingParent { .. }
                | DirscanError::ParentNotDirectory { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DirscanError>;
