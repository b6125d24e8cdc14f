//! Ownership arbiter for revision-controlled destinations.
//!
//! ```text
//! Unlocked ──acquire──▶ LockedBySelf ──▶ Synced
//!     │                      │
//!     │                      └─behind head─▶ StaleLocal ──sync──▶ Synced
//!     └─held by someone else─▶ LockedByOther ──▶ Deferred (terminal)
//! ```
//!
//! The destination record is read fresh on every call. A lock held by another
//! identity is never broken; the caller decides what to tell the user.
//! Transport failures abort arbitration with
//! [`PublishError::ArbitrationUnavailable`] rather than guessing lock state.

use std::fmt;
use std::path::Path;

use stagehand_core::{DestinationRecord, Identity};

use crate::error::PublishError;
use crate::revision::{RevisionControl, RevisionError};

/// States a destination passes through during arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    LockedBySelf,
    LockedByOther,
    StaleLocal,
    Synced,
    Deferred,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LockState::Unlocked => "unlocked",
            LockState::LockedBySelf => "locked-by-self",
            LockState::LockedByOther => "locked-by-other",
            LockState::StaleLocal => "stale-local",
            LockState::Synced => "synced",
            LockState::Deferred => "deferred",
        };
        f.write_str(label)
    }
}

/// Permission to modify the destination, with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// The record read at the start of arbitration.
    pub record: DestinationRecord,
    /// States visited, in order.
    pub trail: Vec<LockState>,
    /// The file had no history and was registered with `add`.
    pub registered_new: bool,
}

/// Result of arbitration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arbitration {
    Granted(Grant),
    Deferred { holder: Identity, trail: Vec<LockState> },
}

/// Decide whether `identity` may modify `path` right now, acquiring the lock
/// if it is free.
pub fn arbitrate(
    vcs: &dyn RevisionControl,
    path: &Path,
    identity: &Identity,
) -> Result<Arbitration, PublishError> {
    let unavailable = |source: RevisionError| PublishError::ArbitrationUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let record = vcs.stat(path).map_err(unavailable)?;
    let mut trail = Vec::with_capacity(3);
    let mut registered_new = false;

    match &record.locked_by {
        Some(holder) if holder != identity => {
            trail.extend([LockState::LockedByOther, LockState::Deferred]);
            tracing::warn!(
                "{} is opened by {}; deferring publish",
                path.display(),
                holder
            );
            return Ok(Arbitration::Deferred {
                holder: holder.clone(),
                trail,
            });
        }
        Some(_) => {
            trail.push(LockState::LockedBySelf);
            if record.is_behind_head() {
                trail.push(LockState::StaleLocal);
                tracing::info!(
                    "{} opened at #{} behind head #{}; syncing",
                    path.display(),
                    record.have_revision,
                    record.head_revision
                );
                vcs.sync(path).map_err(unavailable)?;
            }
            trail.push(LockState::Synced);
        }
        None => {
            trail.push(LockState::Unlocked);
            if record.exists_in_history {
                vcs.sync(path).map_err(unavailable)?;
                vcs.checkout(path).map_err(unavailable)?;
            } else {
                vcs.add(path).map_err(unavailable)?;
                registered_new = true;
            }
            trail.extend([LockState::LockedBySelf, LockState::Synced]);
        }
    }

    tracing::debug!(
        "arbitration for {}: {}",
        path.display(),
        trail
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    Ok(Arbitration::Granted(Grant {
        record,
        trail,
        registered_new,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
