//! Publish orchestrator: the single entry point callers use.
//!
//! ## `publish` sequence
//!
//! 1. Validate the request (dependency lists, distinct slot paths, batch
//!    permission, backend).
//! 2. Allocate a fresh staging slot.
//! 3. Stage the primary artifact and its dependencies into the slot.
//! 4. Shared filesystem: the slot is the publish → `Published`.
//! 5. Revision-controlled: arbitrate, promote the staged primary over the
//!    depot path, diff, then revert (`SkippedNoChange`) or submit
//!    (`Published`).
//!
//! Fatal conditions up to and including arbitration return `Err`. Once the
//! destination is opened, every failure is folded into
//! [`PublishOutcome::Aborted`] so the caller always learns the file may be
//! left opened. Staging slots are never deleted here.

use std::path::Path;

use stagehand_core::{
    AbortReason, Dependency, DestinationProfile, PublishConfig, PublishOutcome, PublishRequest,
    StagingSlot,
};

use crate::allocator::Allocator;
use crate::arbiter::{self, Arbitration, Grant};
use crate::change::{self, ChangeVerdict};
use crate::copier::{self, StagedArtifacts, StagedFile};
use crate::error::PublishError;
use crate::host::{HostError, StageCapability};
use crate::promote::{self, PromoteResult};
use crate::revision::RevisionControl;

/// Sequences a publish against the configured roots and collaborators.
pub struct Publisher<'a> {
    config: PublishConfig,
    revision: Option<&'a dyn RevisionControl>,
    stager: Option<&'a dyn StageCapability>,
}

impl<'a> Publisher<'a> {
    pub fn new(config: PublishConfig) -> Self {
        Self {
            config,
            revision: None,
            stager: None,
        }
    }

    /// Attach the backend used for revision-controlled destinations.
    pub fn with_revision_control(mut self, revision: &'a dyn RevisionControl) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Attach a host session; its document becomes the primary artifact.
    pub fn with_stager(mut self, stager: &'a dyn StageCapability) -> Self {
        self.stager = Some(stager);
        self
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Publish `request`, returning one of the four outcomes or a fatal error.
    pub fn publish(&self, request: &PublishRequest) -> Result<PublishOutcome, PublishError> {
        let dependencies =
            copier::pair_dependencies(request.dependency_sources(), request.dependency_hints())?;
        copier::check_destinations(request.source_path(), &dependencies)?;

        if self.stager.is_none() && !request.allows_remote_from_batch() {
            return Err(PublishError::BatchNotAllowed {
                name: request.logical_name().0.clone(),
            });
        }

        let (root, revision) = match request.destination_profile() {
            DestinationProfile::SharedFilesystem => (&self.config.shared_root, None),
            DestinationProfile::RevisionControlled { depot_path } => {
                let Some(vcs) = self.revision else {
                    return Err(PublishError::MissingRevisionControl {
                        path: depot_path.clone(),
                    });
                };
                (&self.config.staging_root, Some((vcs, depot_path.as_path())))
            }
        };

        let slot = Allocator::new(root).allocate(request.logical_name())?;
        let staged = self.stage(request, &slot, &dependencies)?;
        tracing::info!(
            "staged {} file(s) for '{}' in {}",
            staged.file_count(),
            request.logical_name(),
            slot.destination_root.display()
        );

        let outcome = match revision {
            None => PublishOutcome::Published { slot },
            Some((vcs, depot_path)) => {
                self.commit_revision(vcs, depot_path, request, slot, &staged)?
            }
        };

        match &outcome {
            PublishOutcome::Aborted { reason } => {
                tracing::warn!("publish of '{}' aborted: {}", request.logical_name(), reason)
            }
            other => tracing::info!("publish of '{}': {}", request.logical_name(), other.label()),
        }
        Ok(outcome)
    }

    fn stage(
        &self,
        request: &PublishRequest,
        slot: &StagingSlot,
        dependencies: &[Dependency],
    ) -> Result<StagedArtifacts, PublishError> {
        let primary = match self.stager {
            Some(stager) => {
                let destination = stager.stage_document(slot)?;
                let digest = change::digest_file(&destination)?.ok_or_else(|| {
                    HostError::new(format!(
                        "host reported saving {} but the file is missing",
                        destination.display()
                    ))
                })?;
                StagedFile {
                    source: request.source_path().to_path_buf(),
                    destination,
                    digest,
                }
            }
            None => copier::stage_primary(slot, request.source_path())?,
        };
        let dependencies = copier::stage_dependencies(slot, dependencies)?;
        Ok(StagedArtifacts {
            primary,
            dependencies,
        })
    }

    fn commit_revision(
        &self,
        vcs: &dyn RevisionControl,
        depot_path: &Path,
        request: &PublishRequest,
        slot: StagingSlot,
        staged: &StagedArtifacts,
    ) -> Result<PublishOutcome, PublishError> {
        let grant = match arbiter::arbitrate(vcs, depot_path, &self.config.identity)? {
            Arbitration::Deferred { holder, .. } => {
                return Ok(PublishOutcome::DeferredLockedByOther { slot, holder });
            }
            Arbitration::Granted(grant) => grant,
        };

        let description = submit_description(request, &slot);
        match promote_and_commit(vcs, depot_path, &grant, &staged.primary, &description) {
            Ok(ChangeVerdict::Identical) => Ok(PublishOutcome::SkippedNoChange { slot }),
            Ok(_) => Ok(PublishOutcome::Published { slot }),
            Err(e) => Ok(PublishOutcome::Aborted {
                reason: AbortReason {
                    destination: depot_path.to_path_buf(),
                    cause: e.to_string(),
                    left_open: true,
                },
            }),
        }
    }
}

/// Copy the staged primary over the opened depot file, then revert a no-op or
/// submit a change. Returns the verdict that decided between the two.
fn promote_and_commit(
    vcs: &dyn RevisionControl,
    depot_path: &Path,
    grant: &Grant,
    primary: &StagedFile,
    description: &str,
) -> Result<ChangeVerdict, PublishError> {
    match promote::promote(&primary.destination, depot_path)? {
        PromoteResult::Written { .. } => {}
        PromoteResult::Unchanged { .. } => {
            tracing::debug!("workspace copy already matches {}", primary.destination.display())
        }
    }

    let verdict = change::detect_revision(vcs, depot_path, &grant.record)?;
    if verdict.needs_publish() {
        vcs.submit(depot_path, description)?;
    } else {
        tracing::info!("no change in {}; reverting", depot_path.display());
        vcs.revert(depot_path)?;
    }
    Ok(verdict)
}

/// `Publish <name> (<slot dir>)`: names the artifact and the staging slot it
/// came from.
pub fn submit_description(request: &PublishRequest, slot: &StagingSlot) -> String {
    format!("Publish {} ({})", request.logical_name(), slot.dir_name())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
