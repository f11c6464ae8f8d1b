//! `mkeep list` and `mkeep max-version`.

use crate::commands::args::FilterArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use modelkeep_registry::{list_models, max_traindata_version, sort_best_first, FsModelStore};
use std::path::Path;

pub fn execute(dir: &Path, filter: &FilterArgs, json_output: bool) -> Result<()> {
    let mut models = list_models(&FsModelStore, dir, &filter.to_filter())
        .with_context(|| format!("Failed to list models in {}", dir.display()))?;
    sort_best_first(&mut models);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Models ({})", models.len()).bold().cyan());
    println!();

    if models.is_empty() {
        println!("  {}", "No models found.".dimmed());
        return Ok(());
    }

    println!("{:<10} {:<10} {:<10} {:<6} {}", "Combined", "Train", "Val", "Epoch", "File");
    println!("{}", "─".repeat(90));
    for m in &models {
        let acc = m.accuracies();
        let row = format!(
            "{:<10.5} {:<10.5} {:<10.5} {:<6} {}",
            acc.combined,
            acc.train,
            acc.val,
            m.epoch(),
            m.file_name()
        );
        if m.has_scores() {
            println!("{row}");
        } else {
            println!("{}", row.dimmed());
        }
    }
    println!();
    Ok(())
}

pub fn max_version(dir: &Path) -> Result<()> {
    let version = max_traindata_version(&FsModelStore, dir)
        .with_context(|| format!("Failed to list models in {}", dir.display()))?;
    match version {
        Some(v) => println!("{v}"),
        None => anyhow::bail!("no models found in {}", dir.display()),
    }
    Ok(())
}
