//! Error types for stagehand-publish.

use std::path::PathBuf;

use thiserror::Error;

use crate::host::HostError;
use crate::revision::RevisionError;

/// All fatal errors a publish attempt can raise.
///
/// Informational results (no change, locked by another user) and failures
/// after a destination was opened are not errors; they are reported through
/// [`stagehand_core::PublishOutcome`].
#[derive(Debug, Error)]
pub enum PublishError {
    /// The freshly derived staging slot already exists on disk.
    #[error("staging slot already exists at {path}; refusing to reuse it")]
    AllocationCollision { path: PathBuf },

    /// The logical name cannot be embedded in a slot directory name.
    #[error("logical name '{name}' must be a single, non-empty path component")]
    InvalidLogicalName { name: String },

    /// Dependency sources and destination hints differ in length.
    #[error("dependency list mismatch: {sources} source(s) but {hints} destination hint(s)")]
    DependencyListMismatch { sources: usize, hints: usize },

    /// A destination hint is absolute or escapes the staging slot.
    #[error("dependency hint {hint} must be a relative path inside the staging slot")]
    InvalidDependencyHint { hint: PathBuf },

    /// Two staged files would land on the same slot-relative path.
    #[error("more than one staged file would be written to {path} inside the slot")]
    DuplicateDestination { path: PathBuf },

    /// A file could not be copied, even after creating its destination directory.
    #[error("failed to copy {src} to {dst}: {source}")]
    CopyFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The revision-control server could not be queried or locked.
    #[error("revision control unavailable while arbitrating {path}: {source}")]
    ArbitrationUnavailable {
        path: PathBuf,
        #[source]
        source: RevisionError,
    },

    /// A revision-control operation failed after arbitration succeeded.
    #[error("revision control error: {0}")]
    Revision(#[from] RevisionError),

    /// A revision-controlled destination was requested without a backend.
    #[error("{path} is revision-controlled but no revision-control backend is attached")]
    MissingRevisionControl { path: PathBuf },

    /// No host session is attached and the request does not permit batch publishing.
    #[error("no host session attached and '{name}' does not allow publishing from batch")]
    BatchNotAllowed { name: String },

    /// The host application failed to save or enumerate the document.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// The document references files outside its own directory tree.
    #[error("document references {} file(s) outside its directory: {}", .paths.len(), preview_paths(.paths))]
    ExternalReferences { paths: Vec<PathBuf> },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`PublishError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PublishError {
    PublishError::Io {
        path: path.into(),
        source,
    }
}

fn preview_paths(paths: &[PathBuf]) -> String {
    const LIMIT: usize = 3;
    let mut shown: Vec<String> = paths
        .iter()
        .take(LIMIT)
        .map(|p| p.display().to_string())
        .collect();
    if paths.len() > LIMIT {
        shown.push(format!("… (+{} more)", paths.len() - LIMIT));
    }
    shown.join(", ")
}
