//! `stagehand diff <local> <shared>`: preview what publishing `local` would change.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stagehand_publish::{preview::preview, ChangeVerdict};

use super::absolutize;

/// Arguments for `stagehand diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Locally edited file.
    pub local: PathBuf,

    /// Shared copy it would replace (may not exist yet).
    pub shared: PathBuf,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let local = absolutize(&self.local)?;
        let shared = absolutize(&self.shared)?;

        let result = preview(&local, &shared)
            .with_context(|| format!("diff failed for {}", local.display()))?;

        match result.verdict {
            ChangeVerdict::Identical => {
                println!("No differences.");
                return Ok(());
            }
            ChangeVerdict::DestinationAbsent => {
                println!("{} does not exist yet; publishing would create it.", shared.display())
            }
            ChangeVerdict::Changed => {}
        }

        if let Some(diff) = result.unified_diff {
            print!("{diff}");
            if !diff.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }
}
