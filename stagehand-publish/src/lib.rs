//! # stagehand-publish
//!
//! Staged publish engine: promote a locally edited artifact into a shared
//! location without clobbering concurrent work or publishing no-op changes.
//!
//! Build a [`Publisher`] from a [`stagehand_core::PublishConfig`], attach a
//! [`RevisionControl`] backend and/or a host [`StageCapability`] as needed,
//! and call [`Publisher::publish`].

pub mod allocator;
pub mod arbiter;
pub mod change;
pub mod copier;
pub mod error;
pub mod host;
pub mod orchestrator;
pub mod preview;
pub mod promote;
pub mod revision;

pub use allocator::{list_slots, Allocator, SlotEntry};
pub use change::ChangeVerdict;
pub use error::PublishError;
pub use host::{
    ExternalReferencePolicy, HostError, HostSession, ReferencedFile, SessionStager,
    StageCapability,
};
pub use orchestrator::Publisher;
pub use revision::{RevisionControl, RevisionError};
