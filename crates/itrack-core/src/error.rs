//! Error types for itrack

use std::path::PathBuf;
use thiserror::Error;

use crate::issue::Status;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Wrong status '{status}' used. Available statuses: {}", Status::token_list())]
    InvalidStatus { status: String },

    #[error("Issue description must not be empty")]
    InvalidDescription,

    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    #[error("Failed to initialize storage at {}: {source}", .path.display())]
    StorageInit {
        path: PathBuf,
        #[source]
        source: StorageCause,
    },

    #[error("Failed to read storage at {}: {source}", .path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: StorageCause,
    },

    #[error("Failed to write storage at {}: {source}", .path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: StorageCause,
    },

    #[error("Invalid config: {0}")]
    Config(String),
}

impl Error {
    /// True for the storage init/read/write family
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::StorageInit { .. } | Error::StorageRead { .. } | Error::StorageWrite { .. }
        )
    }
}

/// Underlying cause of a storage failure
#[derive(Error, Debug)]
pub enum StorageCause {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed issue data: {0}")]
    Json(#[from] serde_json::Error),
}
