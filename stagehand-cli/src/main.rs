//! Stagehand: staged publishing of shared artifacts.
//!
//! # Usage
//!
//! ```text
//! stagehand publish <source> [--name <logical>] [--dep <path> --dep-to <hint>]... [--json]
//! stagehand slots [--name <logical>] [--staging] [--json]
//! stagehand diff <local> <shared>
//! stagehand config init --shared-root <dir> --staging-root <dir> --identity <user>
//! stagehand config show [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{
    config::ConfigCommand, diff::DiffArgs, publish::PublishArgs, slots::SlotsArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stagehand",
    version,
    about = "Publish locally edited artifacts into shared locations without clobbering anyone",
    long_about = None,
)]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stage a file and its dependencies into a fresh shared slot.
    Publish(PublishArgs),

    /// List existing staging slots.
    Slots(SlotsArgs),

    /// Preview what publishing a file over another would change.
    Diff(DiffArgs),

    /// Create or inspect ~/.stagehand/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Publish(args) => args.run(),
        Commands::Slots(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}
