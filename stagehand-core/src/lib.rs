//! Stagehand core library: domain types, publish configuration, errors.
//!
//! - [`types`]: newtypes, requests, slots, destination records, outcomes
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / save of [`PublishConfig`]

pub mod config;
pub mod error;
pub mod types;

pub use config::PublishConfig;
pub use error::ConfigError;
pub use types::{
    AbortReason, Dependency, DestinationProfile, DestinationRecord, Identity, LogicalName,
    PublishOutcome, PublishRequest, StagingSlot,
};
