//! Host-application collaborator.
//!
//! Each content-creation application supplies a [`HostSession`]. The engine
//! only needs the narrower [`StageCapability`]; [`SessionStager`] derives it
//! from any session, so an application integration implements four small
//! methods and nothing else.

use std::path::{Path, PathBuf};

use thiserror::Error;

use stagehand_core::{DestinationProfile, PublishRequest, StagingSlot};

use crate::error::PublishError;

/// A failure reported by the host application binding.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A file the open document refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedFile {
    pub path: PathBuf,
    /// The host flagged the reference as living outside the project.
    pub is_external: bool,
}

impl ReferencedFile {
    pub fn new(path: impl Into<PathBuf>, is_external: bool) -> Self {
        Self {
            path: path.into(),
            is_external,
        }
    }
}

/// Bindings a host application exposes for its open document.
pub trait HostSession: Send + Sync {
    fn current_document_path(&self) -> Result<PathBuf, HostError>;

    fn current_document_logical_name(&self) -> Result<String, HostError>;

    /// Save the open document to `path`.
    fn save_document(&self, path: &Path) -> Result<(), HostError>;

    fn list_referenced_files(&self) -> Result<Vec<ReferencedFile>, HostError>;
}

/// The per-application steps the orchestrator delegates.
pub trait StageCapability: Send + Sync {
    /// Write the primary artifact into `slot`, returning where it landed.
    fn stage_document(&self, slot: &StagingSlot) -> Result<PathBuf, HostError>;

    fn enumerate_dependencies(&self) -> Result<Vec<ReferencedFile>, HostError>;
}

/// How to treat references the host marks external (or that sit outside the
/// document's directory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalReferencePolicy {
    /// Fail the request with [`PublishError::ExternalReferences`].
    #[default]
    Reject,
    /// Leave them out of the publish and log a warning.
    Skip,
}

/// Adapts a [`HostSession`] into a [`StageCapability`].
#[derive(Debug)]
pub struct SessionStager<H> {
    session: H,
}

impl<H: HostSession> SessionStager<H> {
    pub fn new(session: H) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &H {
        &self.session
    }

    /// Build a request for the open document.
    ///
    /// Dependencies are the referenced files under the document's directory,
    /// each hinted with its path relative to that directory so internal
    /// references still resolve inside the slot.
    pub fn build_request(
        &self,
        profile: DestinationProfile,
        policy: ExternalReferencePolicy,
    ) -> Result<PublishRequest, PublishError> {
        let document = self.session.current_document_path()?;
        let name = self.session.current_document_logical_name()?;
        let document_dir = document.parent().unwrap_or_else(|| Path::new(""));

        let mut sources = Vec::new();
        let mut hints = Vec::new();
        let mut external = Vec::new();
        for reference in self.enumerate_dependencies()? {
            let relative = if reference.is_external {
                None
            } else {
                reference.path.strip_prefix(document_dir).ok()
            };
            match relative {
                Some(hint) => {
                    hints.push(hint.to_path_buf());
                    sources.push(reference.path);
                }
                None => external.push(reference.path),
            }
        }

        if !external.is_empty() {
            match policy {
                ExternalReferencePolicy::Reject => {
                    return Err(PublishError::ExternalReferences { paths: external });
                }
                ExternalReferencePolicy::Skip => {
                    for path in &external {
                        tracing::warn!("skipping external reference: {}", path.display());
                    }
                }
            }
        }

        Ok(PublishRequest::new(document, name, profile).with_dependencies(sources, hints))
    }
}

impl<H: HostSession> StageCapability for SessionStager<H> {
    /// Save the document in place, then save a copy into the slot under its
    /// own file name.
    fn stage_document(&self, slot: &StagingSlot) -> Result<PathBuf, HostError> {
        let current = self.session.current_document_path()?;
        let Some(file_name) = current.file_name() else {
            return Err(HostError::new(format!(
                "document path {} has no file name",
                current.display()
            )));
        };
        self.session.save_document(&current)?;
        let target = slot.destination_root.join(file_name);
        self.session.save_document(&target)?;
        Ok(target)
    }

    fn enumerate_dependencies(&self) -> Result<Vec<ReferencedFile>, HostError> {
        self.session.list_referenced_files()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use tempfile::TempDir;

    struct FakeSession {
        document: PathBuf,
        references: Vec<ReferencedFile>,
        saves: Mutex<Vec<PathBuf>>,
    }

    impl FakeSession {
        fn new(document: PathBuf, references: Vec<ReferencedFile>) -> Self {
            Self {
                document,
                references,
                saves: Mutex::new(Vec::new()),
            }
        }
    }

    impl HostSession for FakeSession {
        fn current_document_path(&self) -> Result<PathBuf, HostError> {
            Ok(self.document.clone())
        }

        fn current_document_logical_name(&self) -> Result<String, HostError> {
            Ok("sceneA".into())
        }

        fn save_document(&self, path: &Path) -> Result<(), HostError> {
            std::fs::write(path, b"scene").map_err(|e| HostError::new(e.to_string()))?;
            self.saves.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }

        fn list_referenced_files(&self) -> Result<Vec<ReferencedFile>, HostError> {
            Ok(self.references.clone())
        }
    }

    #[test]
    fn stage_document_saves_in_place_then_into_slot() {
        let work = TempDir::new().unwrap();
        let slot_dir = TempDir::new().unwrap();
        let document = work.path().join("sceneA.hip");
        let stager = SessionStager::new(FakeSession::new(document.clone(), vec![]));
        let slot = StagingSlot {
            destination_root: slot_dir.path().to_path_buf(),
            created_at: Utc::now(),
        };

        let staged = stager.stage_document(&slot).unwrap();

        assert_eq!(staged, slot_dir.path().join("sceneA.hip"));
        let saves = stager.session().saves.lock().unwrap().clone();
        assert_eq!(saves, vec![document, staged]);
    }

    #[test]
    fn build_request_hints_internal_references_relative_to_document() {
        let document = PathBuf::from("/proj/shots/sceneA.hip");
        let stager = SessionStager::new(FakeSession::new(
            document,
            vec![
                ReferencedFile::new("/proj/shots/tex/wood.exr", false),
                ReferencedFile::new("/proj/shots/geo/tree.bgeo", false),
            ],
        ));

        let request = stager
            .build_request(DestinationProfile::SharedFilesystem, ExternalReferencePolicy::Reject)
            .unwrap();

        assert_eq!(request.logical_name().0, "sceneA");
        assert_eq!(
            request.dependency_hints(),
            &[PathBuf::from("tex/wood.exr"), PathBuf::from("geo/tree.bgeo")]
        );
        assert!(!request.allows_remote_from_batch());
    }

    #[test]
    fn build_request_rejects_external_references() {
        let stager = SessionStager::new(FakeSession::new(
            PathBuf::from("/proj/shots/sceneA.hip"),
            vec![
                ReferencedFile::new("/library/hdri/sky.exr", false),
                ReferencedFile::new("/proj/shots/tex/flagged.exr", true),
            ],
        ));

        let err = stager
            .build_request(DestinationProfile::SharedFilesystem, ExternalReferencePolicy::Reject)
            .unwrap_err();

        match err {
            PublishError::ExternalReferences { paths } => assert_eq!(paths.len(), 2),
            other => panic!("expected external references, got {other:?}"),
        }
    }

    #[test]
    fn build_request_skips_external_references_when_asked() {
        let stager = SessionStager::new(FakeSession::new(
            PathBuf::from("/proj/shots/sceneA.hip"),
            vec![
                ReferencedFile::new("/library/hdri/sky.exr", false),
                ReferencedFile::new("/proj/shots/tex/wood.exr", false),
            ],
        ));

        let request = stager
            .build_request(DestinationProfile::SharedFilesystem, ExternalReferencePolicy::Skip)
            .unwrap();

        assert_eq!(
            request.dependency_sources(),
            &[PathBuf::from("/proj/shots/tex/wood.exr")]
        );
    }
}
