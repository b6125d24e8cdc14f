//! Artifact copier: stages a primary artifact and its dependencies.
//!
//! ## Per-file protocol
//!
//! 1. Stream `src` into `<dst>.stagehand.tmp`, hashing as it goes.
//! 2. Rename the `.tmp` onto `dst` (a file is either fully staged or absent).
//!    An existing `dst` is never replaced.
//! 3. If step 1 failed because the destination directory is missing, create
//!    it and retry once. Any other failure, or a second failure, is fatal.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use stagehand_core::{Dependency, StagingSlot};

use crate::error::{io_err, PublishError};

/// A file placed into a staging slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// SHA-256 hex digest of the bytes written.
    pub digest: String,
}

/// Everything staged for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifacts {
    pub primary: StagedFile,
    pub dependencies: Vec<StagedFile>,
}

impl StagedArtifacts {
    pub fn file_count(&self) -> usize {
        1 + self.dependencies.len()
    }
}

/// Pair dependency sources with their hints.
///
/// Fails with [`PublishError::DependencyListMismatch`] when the lists differ
/// in length, and [`PublishError::InvalidDependencyHint`] when a hint would
/// land outside the slot. Nothing is copied in either case.
pub fn pair_dependencies(
    sources: &[PathBuf],
    hints: &[PathBuf],
) -> Result<Vec<Dependency>, PublishError> {
    if sources.len() != hints.len() {
        return Err(PublishError::DependencyListMismatch {
            sources: sources.len(),
            hints: hints.len(),
        });
    }
    sources
        .iter()
        .zip(hints)
        .map(|(source, hint)| {
            validate_hint(hint)?;
            Ok(Dependency {
                source: source.clone(),
                hint: hint.clone(),
            })
        })
        .collect()
}

fn validate_hint(hint: &Path) -> Result<(), PublishError> {
    let mut normal = 0usize;
    for component in hint.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PublishError::InvalidDependencyHint {
                    hint: hint.to_path_buf(),
                });
            }
        }
    }
    if normal == 0 {
        return Err(PublishError::InvalidDependencyHint {
            hint: hint.to_path_buf(),
        });
    }
    Ok(())
}

/// Reject requests where two files would be staged to the same slot path:
/// repeated hints, or a hint naming the primary artifact's file.
pub fn check_destinations(
    primary: &Path,
    dependencies: &[Dependency],
) -> Result<(), PublishError> {
    let mut seen = HashSet::new();
    if let Some(file_name) = primary.file_name() {
        seen.insert(PathBuf::from(file_name));
    }
    for dep in dependencies {
        let normalized: PathBuf = dep
            .hint
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        if !seen.insert(normalized) {
            return Err(PublishError::DuplicateDestination {
                path: dep.hint.clone(),
            });
        }
    }
    Ok(())
}

/// Copy the primary artifact into the slot root under its own file name.
pub fn stage_primary(slot: &StagingSlot, source: &Path) -> Result<StagedFile, PublishError> {
    let Some(file_name) = source.file_name() else {
        return Err(io_err(
            source,
            io::Error::new(ErrorKind::InvalidInput, "primary artifact has no file name"),
        ));
    };
    let destination = slot.destination_root.join(file_name);
    copy_file(source, &destination)
}

/// Copy every dependency to `<slot>/<hint>`, in order.
pub fn stage_dependencies(
    slot: &StagingSlot,
    dependencies: &[Dependency],
) -> Result<Vec<StagedFile>, PublishError> {
    dependencies
        .iter()
        .map(|dep| copy_file(&dep.source, &slot.destination_root.join(&dep.hint)))
        .collect()
}

/// Copy one file with the single retry-after-mkdir allowance.
pub fn copy_file(src: &Path, dst: &Path) -> Result<StagedFile, PublishError> {
    let tmp = tmp_path(dst);
    let digest = match copy_and_hash(src, dst, &tmp) {
        Ok(digest) => digest,
        Err(e) if is_missing_directory(&e, src, dst) => {
            let Some(parent) = dst.parent() else {
                return Err(copy_failed(src, dst, e));
            };
            tracing::warn!(
                "destination directory {} missing; creating it and retrying once",
                parent.display()
            );
            std::fs::create_dir_all(parent).map_err(|e| copy_failed(src, dst, e))?;
            copy_and_hash(src, dst, &tmp).map_err(|e| copy_failed(src, dst, e))?
        }
        Err(e) => return Err(copy_failed(src, dst, e)),
    };

    tracing::debug!("staged {} -> {}", src.display(), dst.display());
    Ok(StagedFile {
        source: src.to_path_buf(),
        destination: dst.to_path_buf(),
        digest,
    })
}

fn tmp_path(dst: &Path) -> PathBuf {
    PathBuf::from(format!("{}.stagehand.tmp", dst.display()))
}

fn copy_failed(src: &Path, dst: &Path, source: io::Error) -> PublishError {
    PublishError::CopyFailed {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    }
}

/// A `NotFound` is only a missing directory when the source itself is present
/// and the destination's parent is not.
fn is_missing_directory(err: &io::Error, src: &Path, dst: &Path) -> bool {
    err.kind() == ErrorKind::NotFound
        && src.is_file()
        && dst.parent().map(|p| !p.is_dir()).unwrap_or(false)
}

fn copy_and_hash(src: &Path, dst: &Path, tmp: &Path) -> io::Result<String> {
    let mut reader = File::open(src)?;
    let mut writer = HashingWriter {
        inner: File::create(tmp)?,
        hasher: Sha256::new(),
    };
    let written = io::copy(&mut reader, &mut writer).and_then(|_| writer.inner.sync_all());
    if let Err(e) = written {
        let _ = std::fs::remove_file(tmp);
        return Err(e);
    }
    let digest = hex::encode(writer.hasher.finalize());
    if dst.exists() {
        let _ = std::fs::remove_file(tmp);
        return Err(io::Error::new(
            ErrorKind::AlreadyExists,
            "refusing to overwrite a file already staged in the slot",
        ));
    }
    if let Err(e) = std::fs::rename(tmp, dst) {
        let _ = std::fs::remove_file(tmp);
        return Err(e);
    }
    Ok(digest)
}

struct HashingWriter {
    inner: File,
    hasher: Sha256,
}

impl Write for HashingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
