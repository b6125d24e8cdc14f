//! Promotion of a staged artifact over a shared workspace file.
//!
//! ## `promote`: hash-gated atomic overwrite
//!
//! 1. Hash the staged file.
//! 2. Hash the current destination → skip the write if identical.
//! 3. Copy to `<destination>.stagehand.tmp`.
//! 4. Rename onto the destination (atomic on POSIX).
//!
//! Only called after the ownership arbiter granted the lock.

use std::path::{Path, PathBuf};

use crate::change::{compare_digest, digest_file, ChangeVerdict};
use crate::error::{io_err, PublishError};

/// Outcome of promoting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoteResult {
    /// Destination was (re)written from the staged file.
    Written { path: PathBuf },
    /// Destination already held the staged bytes; nothing was touched.
    Unchanged { path: PathBuf },
}

/// Overwrite `destination` with `staged`, skipping the write when identical.
pub fn promote(staged: &Path, destination: &Path) -> Result<PromoteResult, PublishError> {
    let tmp = PathBuf::from(format!("{}.stagehand.tmp", destination.display()));
    promote_with_tmp(staged, destination, &tmp)
}

fn promote_with_tmp(
    staged: &Path,
    destination: &Path,
    tmp: &Path,
) -> Result<PromoteResult, PublishError> {
    let digest = digest_file(staged)?.ok_or_else(|| {
        io_err(
            staged,
            std::io::Error::new(std::io::ErrorKind::NotFound, "staged file is missing"),
        )
    })?;

    if compare_digest(&digest, destination)? == ChangeVerdict::Identical {
        tracing::debug!("unchanged: {}", destination.display());
        return Ok(PromoteResult::Unchanged {
            path: destination.to_path_buf(),
        });
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::copy(staged, tmp).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, destination) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(destination, e));
    }

    tracing::info!("promoted: {}", destination.display());
    Ok(PromoteResult::Written {
        path: destination.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
