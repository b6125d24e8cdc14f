//! Destination allocator: one fresh staging slot per request.
//!
//! Slots are laid out as:
//!
//! ```text
//! <root>/
//!   20240611_142501_123456789_sceneA/
//!   20240611_142503_004512001_configB/
//! ```
//!
//! The nanosecond timestamp sorts lexically and, together with the logical
//! name, distinguishes concurrent publishes. The slot directory is created
//! with a non-recursive `create_dir`, so an existing directory is detected by
//! the filesystem itself and reported as a collision, never reused.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

use stagehand_core::{LogicalName, StagingSlot};

use crate::error::{io_err, PublishError};

/// Second-resolution part of the slot timestamp.
const SECONDS_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Length of `YYYYmmdd_HHMMSS_nnnnnnnnn`.
const TIMESTAMP_LEN: usize = 25;

/// Allocates staging slots under a fixed root.
#[derive(Debug, Clone)]
pub struct Allocator {
    root: PathBuf,
}

impl Allocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a slot stamped with the current time.
    pub fn allocate(&self, name: &LogicalName) -> Result<StagingSlot, PublishError> {
        self.allocate_at(name, Utc::now())
    }

    /// Allocate a slot stamped with `now`.
    ///
    /// Creates the root if needed. Fails with
    /// [`PublishError::AllocationCollision`] if the slot directory exists.
    pub fn allocate_at(
        &self,
        name: &LogicalName,
        now: DateTime<Utc>,
    ) -> Result<StagingSlot, PublishError> {
        if !name.is_single_component() {
            return Err(PublishError::InvalidLogicalName {
                name: name.0.clone(),
            });
        }

        std::fs::create_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;

        let path = slot_path(&self.root, name, now);
        match std::fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(PublishError::AllocationCollision { path });
            }
            Err(e) => return Err(io_err(&path, e)),
        }

        tracing::info!("allocated staging slot {}", path.display());
        Ok(StagingSlot {
            destination_root: path,
            created_at: now,
        })
    }
}

/// `<root>/<YYYYmmdd_HHMMSS_nnnnnnnnn>_<name>`. Pure, no I/O.
pub fn slot_path(root: &Path, name: &LogicalName, at: DateTime<Utc>) -> PathBuf {
    root.join(format!(
        "{}_{:09}_{}",
        at.format(SECONDS_FORMAT),
        at.nanosecond() % 1_000_000_000,
        name.0
    ))
}

/// Recover the timestamp and logical name from a slot directory name.
pub fn parse_slot_dir_name(dir_name: &str) -> Option<(DateTime<Utc>, LogicalName)> {
    let stamp = dir_name.get(..TIMESTAMP_LEN)?;
    let name = dir_name.get(TIMESTAMP_LEN..)?.strip_prefix('_')?;
    if name.is_empty() {
        return None;
    }
    let (seconds, nanos) = stamp.rsplit_once('_')?;
    if nanos.len() != 9 || !nanos.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nanos: u32 = nanos.parse().ok()?;
    let naive = NaiveDateTime::parse_from_str(seconds, SECONDS_FORMAT)
        .ok()?
        .with_nanosecond(nanos)?;
    Some((naive.and_utc(), LogicalName::from(name)))
}

/// An existing slot discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    pub slot: StagingSlot,
    pub logical_name: LogicalName,
}

/// List every slot directory under `root`, newest first.
///
/// Entries whose names do not follow the slot layout are ignored. A missing
/// root yields an empty list.
pub fn list_slots(root: &Path) -> Result<Vec<SlotEntry>, PublishError> {
    if !root.exists() {
        return Ok(vec![]);
    }
    let mut slots: Vec<SlotEntry> = std::fs::read_dir(root)
        .map_err(|e| io_err(root, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let dir_name = e.file_name().to_string_lossy().into_owned();
            let (created_at, logical_name) = parse_slot_dir_name(&dir_name)?;
            Some(SlotEntry {
                slot: StagingSlot {
                    destination_root: e.path(),
                    created_at,
                },
                logical_name,
            })
        })
        .collect();
    slots.sort_by(|a, b| {
        b.slot
            .created_at
            .cmp(&a.slot.created_at)
            .then_with(|| a.logical_name.0.cmp(&b.logical_name.0))
    });
    Ok(slots)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
