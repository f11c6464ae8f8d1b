//! `mkeep prune` and `mkeep submit`.

use crate::commands::args::RetentionArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use modelkeep_registry::{
    Candidate, CopyArtifact, CycleReport, ModelIdentity, RetentionConfig, RetentionController, RetentionOptions,
    RetentionSink, StdoutSink, TracingSink,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Raw metrics reported by the trainer for a submitted artifact.
#[derive(Debug, Clone, Copy)]
pub struct SubmittedMetrics {
    pub train: f64,
    pub val: f64,
    pub epoch: u32,
}

fn controller(
    config: Option<&RetentionConfig>,
    dir: Option<PathBuf>,
    identity: ModelIdentity,
    options: RetentionOptions,
    json_output: bool,
) -> Result<RetentionController> {
    let dir = dir
        .or_else(|| config.and_then(|c| c.model_dir.clone()))
        .context("a model directory is required (argument or model_dir in the config file)")?;

    // JSON output must stay parseable, so events go to the log instead.
    let sink: Arc<dyn RetentionSink> = if json_output { Arc::new(TracingSink) } else { Arc::new(StdoutSink) };
    Ok(RetentionController::new(dir, identity, options).with_sink(sink))
}

pub fn prune(config: Option<&RetentionConfig>, dir: Option<PathBuf>, args: &RetentionArgs, json_output: bool) -> Result<()> {
    let (identity, options) = args.resolve(config, false)?;
    let controller = controller(config, dir, identity, options, json_output)?;
    let report = controller.run_cycle(None).context("Retention cycle failed")?;
    print_report(&report, json_output)
}

pub fn submit(
    config: Option<&RetentionConfig>,
    dir: Option<PathBuf>,
    source: PathBuf,
    metrics: SubmittedMetrics,
    args: &RetentionArgs,
    json_output: bool,
) -> Result<()> {
    let (identity, mut options) = args.resolve(config, true)?;
    if !source.exists() {
        anyhow::bail!("artifact not found: {}", source.display());
    }

    let artifact = CopyArtifact::new(source);
    if args.save_format.is_none() {
        options.save_format = artifact.save_format();
    } else if options.save_format != artifact.save_format() {
        anyhow::bail!(
            "--save-format {} does not match {}: expected {}",
            options.save_format,
            artifact.source().display(),
            artifact.save_format()
        );
    }

    let controller = controller(config, dir, identity, options, json_output)?;
    let candidate = Candidate::new(&artifact, metrics.train, metrics.val, metrics.epoch);
    let report = controller.run_cycle(Some(candidate)).context("Retention cycle failed")?;
    print_report(&report, json_output)
}

fn print_report(report: &CycleReport, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", report.to_json_pretty()?);
        return Ok(());
    }

    println!();
    match &report.saved {
        Some(path) => println!("  {} {}", "Saved:".green(), path.display()),
        None => println!("  {}", "No new model saved.".dimmed()),
    }
    println!(
        "  Kept {}, deleted {}, would delete {}",
        report.kept.len(),
        report.deleted.len(),
        report.would_delete.len()
    );
    Ok(())
}
