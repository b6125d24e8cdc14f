//! Revision-control collaborator.
//!
//! The engine never talks to a server directly; a host integration supplies an
//! implementation of [`RevisionControl`] bound to a workspace. Every method
//! addresses a file by its workspace-local path and may block on the network.

use std::path::{Path, PathBuf};

use thiserror::Error;

use stagehand_core::DestinationRecord;

/// Failures reported by a revision-control backend.
#[derive(Debug, Error)]
pub enum RevisionError {
    /// The server could not be reached or the connection dropped mid-call.
    #[error("transport failure during `{operation}` on {path}: {message}")]
    Transport {
        operation: &'static str,
        path: PathBuf,
        message: String,
    },

    /// The server answered but refused the operation.
    #[error("server rejected `{operation}` on {path}: {message}")]
    Rejected {
        operation: &'static str,
        path: PathBuf,
        message: String,
    },
}

impl RevisionError {
    pub fn transport(operation: &'static str, path: &Path, message: impl Into<String>) -> Self {
        RevisionError::Transport {
            operation,
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn rejected(operation: &'static str, path: &Path, message: impl Into<String>) -> Self {
        RevisionError::Rejected {
            operation,
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            RevisionError::Transport { operation, .. } | RevisionError::Rejected { operation, .. } => {
                operation
            }
        }
    }
}

/// Abstract revision-control operations the engine sequences.
///
/// None of these are retried by the engine; a failure surfaces immediately.
pub trait RevisionControl: Send + Sync {
    /// Read the current server-side state of `path`.
    fn stat(&self, path: &Path) -> Result<DestinationRecord, RevisionError>;

    /// Bring the workspace copy of `path` up to the head revision.
    fn sync(&self, path: &Path) -> Result<(), RevisionError>;

    /// Open `path` for modification, taking the modifiable lock.
    fn checkout(&self, path: &Path) -> Result<(), RevisionError>;

    /// Register a file with no history; opens it for add.
    fn add(&self, path: &Path) -> Result<(), RevisionError>;

    /// True when the opened workspace file differs from the head revision.
    fn diff(&self, path: &Path) -> Result<bool, RevisionError>;

    /// Submit the opened file with `description`, releasing the lock.
    fn submit(&self, path: &Path, description: &str) -> Result<(), RevisionError>;

    /// Discard the opened modification, releasing the lock.
    fn revert(&self, path: &Path) -> Result<(), RevisionError>;
}
