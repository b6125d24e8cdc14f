//! `stagehand publish <source>`: stage a file into a fresh shared-filesystem slot.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;

use stagehand_core::{config, DestinationProfile, PublishOutcome, PublishRequest};
use stagehand_publish::Publisher;

use super::{absolutize, home};

/// Arguments for `stagehand publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// File to publish.
    pub source: PathBuf,

    /// Logical name for the slot. Defaults to the source's file stem.
    #[arg(long)]
    pub name: Option<String>,

    /// Dependency file to stage alongside the source. Repeat per file.
    #[arg(long = "dep", value_name = "PATH")]
    pub deps: Vec<PathBuf>,

    /// Slot-relative location for the matching --dep, in the same order.
    #[arg(long = "dep-to", value_name = "HINT")]
    pub hints: Vec<PathBuf>,

    /// Emit the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PublishArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let config = config::load_at(&home).context("failed to load stagehand config")?;

        let source = absolutize(&self.source)?;
        let name = match self.name {
            Some(name) => name,
            None => source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .with_context(|| format!("cannot derive a name from {}", source.display()))?,
        };
        let deps = self
            .deps
            .iter()
            .map(|p| absolutize(p))
            .collect::<Result<Vec<_>>>()?;

        let request = PublishRequest::new(&source, name.as_str(), DestinationProfile::SharedFilesystem)
            .with_dependencies(deps, self.hints)
            .allow_remote_from_batch(true);

        let outcome = Publisher::new(config)
            .publish(&request)
            .with_context(|| format!("publish of '{name}' failed"))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?
            );
        } else {
            print_outcome(&name, &outcome);
        }

        match outcome {
            PublishOutcome::Aborted { reason } => Err(anyhow!("publish of '{name}' aborted: {reason}")),
            _ => Ok(()),
        }
    }
}

fn print_outcome(name: &str, outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Published { slot } => println!(
            "{} Published '{}' to {}",
            "✓".green().bold(),
            name,
            slot.destination_root.display()
        ),
        PublishOutcome::SkippedNoChange { slot } => println!(
            "{} '{}' unchanged; staged copy kept at {}",
            "•".bright_black(),
            name,
            slot.destination_root.display()
        ),
        PublishOutcome::DeferredLockedByOther { slot, holder } => println!(
            "{} '{}' is locked by {}; staged copy kept at {}",
            "!".yellow().bold(),
            name,
            holder,
            slot.destination_root.display()
        ),
        PublishOutcome::Aborted { reason } => {
            println!("{} '{}' aborted: {}", "✗".red().bold(), name, reason)
        }
    }
}
