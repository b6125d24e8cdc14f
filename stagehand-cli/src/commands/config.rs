//! `stagehand config init` and `stagehand config show`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use stagehand_core::{config, PublishConfig};

use super::{absolutize, home};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a new config file, replacing any existing one.
    Init(InitArgs),

    /// Print the current config.
    Show {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Root under which shared-filesystem slots are created.
    #[arg(long, value_name = "DIR")]
    pub shared_root: PathBuf,

    /// Local root for slots staged before a revision-controlled publish.
    #[arg(long, value_name = "DIR")]
    pub staging_root: PathBuf,

    /// Revision-control user name this machine publishes as.
    #[arg(long)]
    pub identity: String,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Init(args) => init(args),
        ConfigCommand::Show { json } => show(json),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let home = home()?;
    let cfg = PublishConfig::new(
        absolutize(&args.shared_root)?,
        absolutize(&args.staging_root)?,
        args.identity,
    );
    config::save_at(&home, &cfg).context("failed to write stagehand config")?;
    println!("✓ Wrote {}", config::config_path_at(&home).display());
    Ok(())
}

fn show(json: bool) -> Result<()> {
    let home = home()?;
    let cfg = config::load_at(&home).context("failed to load stagehand config")?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&cfg).context("failed to serialize config")?
        );
        return Ok(());
    }
    println!("config:       {}", config::config_path_at(&home).display());
    println!("shared root:  {}", cfg.shared_root.display());
    println!("staging root: {}", cfg.staging_root.display());
    println!("identity:     {}", cfg.identity);
    Ok(())
}
