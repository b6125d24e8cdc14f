//! `stagehand slots`: list staging slots under the shared (or staging) root.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stagehand_core::config;
use stagehand_publish::{list_slots, SlotEntry};

use super::home;

/// Arguments for `stagehand slots`.
#[derive(Args, Debug)]
pub struct SlotsArgs {
    /// Only show slots for this logical name.
    #[arg(long)]
    pub name: Option<String>,

    /// List the local staging root instead of the shared root.
    #[arg(long)]
    pub staging: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct SlotJson {
    name: String,
    created_at: String,
    path: String,
    files: usize,
}

#[derive(Tabled)]
struct SlotRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "created (UTC)")]
    created: String,
    #[tabled(rename = "files")]
    files: usize,
    #[tabled(rename = "path")]
    path: String,
}

impl SlotsArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let config = config::load_at(&home).context("failed to load stagehand config")?;
        let root = if self.staging {
            &config.staging_root
        } else {
            &config.shared_root
        };

        let mut slots = list_slots(root)
            .with_context(|| format!("failed to list slots in {}", root.display()))?;
        if let Some(name) = self.name.as_ref() {
            slots.retain(|entry| entry.logical_name.0 == *name);
        }

        if self.json {
            let payload: Vec<SlotJson> = slots
                .iter()
                .map(|entry| SlotJson {
                    name: entry.logical_name.0.clone(),
                    created_at: entry
                        .slot
                        .created_at
                        .to_rfc3339_opts(SecondsFormat::Nanos, true),
                    path: entry.slot.destination_root.display().to_string(),
                    files: count_files(&entry.slot.destination_root),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize slots JSON")?
            );
            return Ok(());
        }

        print_table(root, slots);
        Ok(())
    }
}

fn print_table(root: &Path, slots: Vec<SlotEntry>) {
    println!("{} {}", "Slots in".bold(), root.display());
    if slots.is_empty() {
        println!("No slots found.");
        return;
    }

    let rows: Vec<SlotRow> = slots
        .into_iter()
        .map(|entry| SlotRow {
            files: count_files(&entry.slot.destination_root),
            name: entry.logical_name.0,
            created: entry.slot.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            path: entry.slot.destination_root.display().to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Regular files under `dir`, recursively. Unreadable entries count as zero.
fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| match e.file_type() {
            Ok(t) if t.is_dir() => count_files(&e.path()),
            Ok(t) if t.is_file() => 1,
            _ => 0,
        })
        .sum()
}
