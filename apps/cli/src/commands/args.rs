//! Argument groups shared by several commands.

use anyhow::{Context, Result};
use clap::Args;
use modelkeep_registry::{
    ModelIdentity, MonitorMode, RecordFilter, RetentionConfig, RetentionOptions, RetentionPolicy, SaveFormat,
};

/// Optional identity constraints for listing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only models for this segment subject
    #[arg(long)]
    pub subject: Option<String>,

    /// Only models trained on this traindata version
    #[arg(long)]
    pub traindata_version: Option<u32>,

    /// Only models with this architecture
    #[arg(long = "arch")]
    pub architecture: Option<String>,

    /// Only models with this hyperparams version
    #[arg(long)]
    pub hyperparams_version: Option<u32>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> RecordFilter {
        RecordFilter {
            segment_subject: self.subject.clone(),
            model_architecture: self.architecture.clone(),
            traindata_version: self.traindata_version,
            hyperparams_version: self.hyperparams_version,
        }
    }
}

/// A complete model identity.
#[derive(Args, Debug, Clone)]
pub struct IdentityArgs {
    /// Segment subject
    #[arg(long)]
    pub subject: String,

    /// Traindata version
    #[arg(long)]
    pub traindata_version: u32,

    /// Model architecture
    #[arg(long = "arch")]
    pub architecture: String,

    /// Hyperparams version (0 is omitted from names)
    #[arg(long, default_value_t = 0)]
    pub hyperparams_version: u32,
}

impl IdentityArgs {
    pub fn to_identity(&self) -> Result<ModelIdentity> {
        Ok(ModelIdentity::new(
            self.subject.clone(),
            self.traindata_version,
            self.architecture.clone(),
            self.hyperparams_version,
        )?)
    }
}

/// Retention settings; every flag overrides the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct RetentionArgs {
    /// Segment subject
    #[arg(long)]
    pub subject: Option<String>,

    /// Traindata version
    #[arg(long)]
    pub traindata_version: Option<u32>,

    /// Model architecture
    #[arg(long = "arch")]
    pub architecture: Option<String>,

    /// Hyperparams version
    #[arg(long)]
    pub hyperparams_version: Option<u32>,

    /// Direction of the monitored metric (min, max)
    #[arg(long)]
    pub monitor_mode: Option<String>,

    /// Save format for new models (h5, tf)
    #[arg(long)]
    pub save_format: Option<String>,

    /// Keep only the best model instead of the Pareto frontier
    #[arg(long)]
    pub best_only: bool,

    /// Save weights only
    #[arg(long)]
    pub weights_only: bool,

    /// Only report what would be saved and deleted
    #[arg(long)]
    pub dry_run: bool,

    /// Report which models dominate each deleted model
    #[arg(long)]
    pub debug: bool,

    /// Do not report the best model after the cycle
    #[arg(long)]
    pub quiet: bool,
}

impl RetentionArgs {
    /// Merge flags over the optional config file.
    ///
    /// A candidate's raw metrics cannot be scored without a monitor mode, so
    /// `require_monitor_mode` turns a missing mode into an error.
    pub fn resolve(
        &self,
        config: Option<&RetentionConfig>,
        require_monitor_mode: bool,
    ) -> Result<(ModelIdentity, RetentionOptions)> {
        let id = config.map(|c| &c.identity);
        let subject = self
            .subject
            .clone()
            .or_else(|| id.map(|i| i.segment_subject.clone()))
            .context("--subject is required (or set identity.segment_subject in the config file)")?;
        let traindata_version = self
            .traindata_version
            .or_else(|| id.map(|i| i.traindata_version))
            .context("--traindata-version is required (or set identity.traindata_version in the config file)")?;
        let architecture = self
            .architecture
            .clone()
            .or_else(|| id.map(|i| i.model_architecture.clone()))
            .context("--arch is required (or set identity.model_architecture in the config file)")?;
        let hyperparams_version = self
            .hyperparams_version
            .or_else(|| id.map(|i| i.hyperparams_version))
            .unwrap_or(0);
        let identity = ModelIdentity::new(subject, traindata_version, architecture, hyperparams_version)?;

        let monitor_mode = match (&self.monitor_mode, config) {
            (Some(mode), _) => Some(mode.parse::<MonitorMode>()?),
            (None, Some(c)) => Some(c.retention.monitor_metric_mode),
            (None, None) => None,
        };
        let monitor_mode = match monitor_mode {
            Some(mode) => mode,
            None if require_monitor_mode => anyhow::bail!(
                "--monitor-mode is required (or set retention.monitor_metric_mode in the config file)"
            ),
            // Only candidates are scored; pruning compares stored scores.
            None => MonitorMode::Max,
        };

        let mut options = match config {
            Some(c) => c.options(),
            None => RetentionOptions::new(monitor_mode),
        };
        options.monitor_mode = monitor_mode;
        if let Some(format) = &self.save_format {
            options.save_format = format.parse::<SaveFormat>()?;
        }
        if self.best_only {
            options.policy = RetentionPolicy::BestOnly;
        }
        options.save_weights_only |= self.weights_only;
        options.only_report |= self.dry_run;
        options.debug |= self.debug;
        if self.quiet {
            options.verbose = false;
        }

        Ok((identity, options))
    }
}
