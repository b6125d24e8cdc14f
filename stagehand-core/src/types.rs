//! Domain types for staged publishing.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Types that cross the CLI boundary are serializable via serde.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The stable, human-meaningful name of an artifact, independent of where it
/// is stored (e.g. `sceneA`, `shelf_Rigging`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalName(pub String);

impl LogicalName {
    /// True when the name can be embedded in a directory name as exactly one
    /// normal path component.
    pub fn is_single_component(&self) -> bool {
        if self.0.is_empty() || self.0.contains(['/', '\\']) {
            return false;
        }
        let mut components = Path::new(&self.0).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LogicalName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LogicalName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A user identity as reported by the revision-control server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// The kind of shared backing store a publish lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationProfile {
    /// A plain shared filesystem; the staging slot itself is the publish.
    SharedFilesystem,
    /// A revision-controlled file, addressed by its workspace-local path.
    RevisionControlled { depot_path: PathBuf },
}

impl DestinationProfile {
    pub fn is_revision_controlled(&self) -> bool {
        matches!(self, DestinationProfile::RevisionControlled { .. })
    }
}

impl fmt::Display for DestinationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationProfile::SharedFilesystem => write!(f, "shared filesystem"),
            DestinationProfile::RevisionControlled { depot_path } => {
                write!(f, "revision-controlled ({})", depot_path.display())
            }
        }
    }
}

/// A dependency paired with the slot-relative location it must land at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub source: PathBuf,
    /// Relative path inside the staging slot.
    pub hint: PathBuf,
}

/// Everything the engine needs to publish one artifact.
///
/// Dependency sources and their destination hints are held as two parallel
/// lists, the way host front ends collect them; the copier rejects lists of
/// unequal length before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    source_path: PathBuf,
    logical_name: LogicalName,
    dependency_sources: Vec<PathBuf>,
    dependency_hints: Vec<PathBuf>,
    destination_profile: DestinationProfile,
    allow_remote_from_batch: bool,
}

impl PublishRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        logical_name: impl Into<LogicalName>,
        destination_profile: DestinationProfile,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            logical_name: logical_name.into(),
            dependency_sources: Vec::new(),
            dependency_hints: Vec::new(),
            destination_profile,
            allow_remote_from_batch: false,
        }
    }

    /// Attach dependency sources and their slot-relative hints.
    pub fn with_dependencies(
        mut self,
        sources: impl IntoIterator<Item = PathBuf>,
        hints: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        self.dependency_sources = sources.into_iter().collect();
        self.dependency_hints = hints.into_iter().collect();
        self
    }

    /// Permit publishing without an attached host session (batch/farm use).
    pub fn allow_remote_from_batch(mut self, allow: bool) -> Self {
        self.allow_remote_from_batch = allow;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn logical_name(&self) -> &LogicalName {
        &self.logical_name
    }

    pub fn dependency_sources(&self) -> &[PathBuf] {
        &self.dependency_sources
    }

    pub fn dependency_hints(&self) -> &[PathBuf] {
        &self.dependency_hints
    }

    pub fn destination_profile(&self) -> &DestinationProfile {
        &self.destination_profile
    }

    pub fn allows_remote_from_batch(&self) -> bool {
        self.allow_remote_from_batch
    }
}

// ---------------------------------------------------------------------------
// Staging and destination state
// ---------------------------------------------------------------------------

/// A freshly allocated, request-exclusive staging directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingSlot {
    pub destination_root: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl StagingSlot {
    /// The slot's directory name, e.g. `20240101_120000_000000001_sceneA`.
    pub fn dir_name(&self) -> String {
        self.destination_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Server-side state of a revision-controlled destination, read fresh at
/// arbitration time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DestinationRecord {
    /// Latest submitted revision (0 when the file has no history).
    pub head_revision: u32,
    /// Revision present in the local workspace (0 when never synced).
    pub have_revision: u32,
    /// Identity holding the file open for modification, if any.
    pub locked_by: Option<Identity>,
    pub exists_in_history: bool,
}

impl DestinationRecord {
    pub fn is_behind_head(&self) -> bool {
        self.have_revision < self.head_revision
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a publish stopped after it had started modifying a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortReason {
    pub destination: PathBuf,
    pub cause: String,
    /// The destination may still be opened (checked out, unsubmitted).
    pub left_open: bool,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.destination.display(), self.cause)?;
        if self.left_open {
            write!(f, " (destination left opened; revert or submit it manually)")?;
        }
        Ok(())
    }
}

/// Result of a single publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published { slot: StagingSlot },
    SkippedNoChange { slot: StagingSlot },
    DeferredLockedByOther { slot: StagingSlot, holder: Identity },
    Aborted { reason: AbortReason },
}

impl PublishOutcome {
    /// Outcomes callers should present as information rather than failure.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            PublishOutcome::SkippedNoChange { .. } | PublishOutcome::DeferredLockedByOther { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PublishOutcome::Published { .. } => "published",
            PublishOutcome::SkippedNoChange { .. } => "skipped (no change)",
            PublishOutcome::DeferredLockedByOther { .. } => "deferred (locked by other)",
            PublishOutcome::Aborted { .. } => "aborted",
        }
    }

    pub fn slot(&self) -> Option<&StagingSlot> {
        match self {
            PublishOutcome::Published { slot }
            | PublishOutcome::SkippedNoChange { slot }
            | PublishOutcome::DeferredLockedByOther { slot, .. } => Some(slot),
            PublishOutcome::Aborted { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
