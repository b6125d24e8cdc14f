//! Change detection: suppresses no-op publishes.
//!
//! Filesystem destinations are compared by SHA-256 digest of the raw bytes.
//! Revision-controlled destinations defer to the server's `diff` of the
//! opened file.

use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use stagehand_core::DestinationRecord;

use crate::error::{io_err, PublishError};
use crate::revision::{RevisionControl, RevisionError};

/// Whether staged content differs from what the destination already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeVerdict {
    Identical,
    Changed,
    /// Nothing exists at the destination yet.
    DestinationAbsent,
}

impl ChangeVerdict {
    /// True unless the publish would be a no-op.
    pub fn needs_publish(self) -> bool {
        !matches!(self, ChangeVerdict::Identical)
    }
}

/// SHA-256 hex digest of a file, or `None` if it does not exist.
pub fn digest_file(path: &Path) -> Result<Option<String>, PublishError> {
    let mut file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| io_err(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Some(hex::encode(hasher.finalize())))
}

/// Compare a known staged digest against the file at `existing`.
pub fn compare_digest(staged_digest: &str, existing: &Path) -> Result<ChangeVerdict, PublishError> {
    let verdict = match digest_file(existing)? {
        None => ChangeVerdict::DestinationAbsent,
        Some(current) if current == staged_digest => ChangeVerdict::Identical,
        Some(_) => ChangeVerdict::Changed,
    };
    tracing::debug!("hash gate {}: {:?}", existing.display(), verdict);
    Ok(verdict)
}

/// Compare a staged file against the file at `existing`.
pub fn compare_files(staged: &Path, existing: &Path) -> Result<ChangeVerdict, PublishError> {
    let staged_digest = digest_file(staged)?.ok_or_else(|| {
        io_err(
            staged,
            std::io::Error::new(ErrorKind::NotFound, "staged file is missing"),
        )
    })?;
    compare_digest(&staged_digest, existing)
}

/// Ask the revision-control server whether the opened file at `path` changed.
///
/// `record` is the state read during arbitration; a file without history has
/// nothing to diff against.
pub fn detect_revision(
    vcs: &dyn RevisionControl,
    path: &Path,
    record: &DestinationRecord,
) -> Result<ChangeVerdict, RevisionError> {
    if !record.exists_in_history {
        return Ok(ChangeVerdict::DestinationAbsent);
    }
    let verdict = if vcs.diff(path)? {
        ChangeVerdict::Changed
    } else {
        ChangeVerdict::Identical
    };
    tracing::debug!("server diff {}: {:?}", path.display(), verdict);
    Ok(verdict)
}
