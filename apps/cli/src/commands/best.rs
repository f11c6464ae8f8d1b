//! `mkeep best`.

use crate::commands::args::FilterArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use modelkeep_registry::{best_model, FsModelStore};
use std::path::Path;

pub fn execute(dir: &Path, filter: &FilterArgs, json_output: bool) -> Result<()> {
    let best = best_model(&FsModelStore, dir, &filter.to_filter())
        .with_context(|| format!("Failed to list models in {}", dir.display()))?;

    let Some(best) = best else {
        anyhow::bail!("no models found in {}", dir.display());
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&best)?);
        return Ok(());
    }

    let acc = best.accuracies();
    println!("{}", "Best model".bold().green());
    println!("  File: {}", best.file_name().cyan());
    println!(
        "  acc_combined: {}, acc_train: {}, acc_val: {}, epoch: {}",
        acc.combined,
        acc.train,
        acc.val,
        best.epoch()
    );
    Ok(())
}
