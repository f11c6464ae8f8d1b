//! One save-then-prune pass over a model directory.
//!
//! Ordering guarantees:
//! - every kept candidate is persisted before any discarded artifact is deleted
//! - a persist failure aborts the cycle before anything is deleted
//! - configuration and candidate validation happen before any filesystem access

use crate::codec::{Accuracies, ModelIdentity, ModelRecord, SaveFormat};
use crate::error::{RegistryError, RegistryResult};
use crate::events::{RetentionEvent, RetentionSink, TracingSink};
use crate::model::SaveableModel;
use crate::ranking::{best_of, classify, RetentionPolicy, Verdict};
use crate::scanner::{list_models, RecordFilter};
use crate::store::{FsModelStore, ModelStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Direction in which the monitored training metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MonitorMode {
    /// Lower is better (losses); stored scores become `1 - raw`.
    Min,
    /// Higher is better; stored scores equal the raw values.
    Max,
}

impl MonitorMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Normalize a raw metric value to a maximization score.
    #[must_use]
    pub fn to_score(self, raw: f64) -> f64 {
        match self {
            Self::Min => 1.0 - raw,
            Self::Max => raw,
        }
    }
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorMode {
    type Err = RegistryError;

    fn from_str(s: &str) -> RegistryResult<Self> {
        match s {
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(RegistryError::invalid_config(format!(
                "invalid monitor_metric_mode: {other}, should be one of [min, max]"
            ))),
        }
    }
}

impl TryFrom<String> for MonitorMode {
    type Error = RegistryError;

    fn try_from(value: String) -> RegistryResult<Self> {
        value.parse()
    }
}

impl From<MonitorMode> for String {
    fn from(value: MonitorMode) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionOptions {
    pub policy: RetentionPolicy,
    pub monitor_mode: MonitorMode,
    pub save_format: SaveFormat,
    pub save_weights_only: bool,
    /// Emit the best model after the cycle.
    pub verbose: bool,
    /// Emit, for every discard, the records that dominate it.
    pub debug: bool,
    /// Classify only; persist and delete nothing.
    pub only_report: bool,
}

impl RetentionOptions {
    #[must_use]
    pub fn new(monitor_mode: MonitorMode) -> Self {
        Self {
            policy: RetentionPolicy::default(),
            monitor_mode,
            save_format: SaveFormat::default(),
            save_weights_only: false,
            verbose: true,
            debug: false,
            only_report: false,
        }
    }
}

/// A freshly trained model plus the raw metrics reported for it.
pub struct Candidate<'a> {
    pub model: &'a dyn SaveableModel,
    /// Serialized instead of `model` when set (e.g. the single-device model
    /// behind a distributed training wrapper).
    pub save_source: Option<&'a dyn SaveableModel>,
    pub train_metric: Option<f64>,
    pub val_metric: Option<f64>,
    pub epoch: Option<u32>,
}

impl<'a> Candidate<'a> {
    #[must_use]
    pub fn new(model: &'a dyn SaveableModel, train_metric: f64, val_metric: f64, epoch: u32) -> Self {
        Self {
            model,
            save_source: None,
            train_metric: Some(train_metric),
            val_metric: Some(val_metric),
            epoch: Some(epoch),
        }
    }

    #[must_use]
    pub fn with_save_source(mut self, source: &'a dyn SaveableModel) -> Self {
        self.save_source = Some(source);
        self
    }

    /// Normalized scores and epoch, or an error when the metric set is partial.
    pub fn scores(&self, mode: MonitorMode) -> RegistryResult<(Accuracies, u32)> {
        let (Some(train), Some(val), Some(epoch)) = (self.train_metric, self.val_metric, self.epoch) else {
            return Err(RegistryError::IncompleteMetrics(format!(
                "a candidate model needs train, validation and epoch values, got train: {:?}, val: {:?}, epoch: {:?}",
                self.train_metric, self.val_metric, self.epoch
            )));
        };
        if !train.is_finite() || !val.is_finite() {
            return Err(RegistryError::IncompleteMetrics(format!(
                "metrics must be finite, got train: {train}, val: {val}"
            )));
        }
        Ok((Accuracies::from_train_val(mode.to_score(train), mode.to_score(val)), epoch))
    }

    fn source(&self) -> &'a dyn SaveableModel {
        self.save_source.unwrap_or(self.model)
    }
}

/// Outcome of one retention cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub kept: Vec<PathBuf>,
    pub saved: Option<PathBuf>,
    pub deleted: Vec<PathBuf>,
    /// Discards that were only reported (`only_report`).
    pub would_delete: Vec<PathBuf>,
    pub best: Option<ModelRecord>,
    pub finished_at: DateTime<Utc>,
}

impl CycleReport {
    pub fn to_json_pretty(&self) -> RegistryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs retention cycles for one identity in one directory.
#[derive(Clone)]
pub struct RetentionController {
    dir: PathBuf,
    identity: ModelIdentity,
    options: RetentionOptions,
    store: Arc<dyn ModelStore>,
    sink: Arc<dyn RetentionSink>,
}

impl RetentionController {
    #[must_use]
    pub fn new(dir: PathBuf, identity: ModelIdentity, options: RetentionOptions) -> Self {
        Self {
            dir,
            identity,
            options,
            store: Arc::new(FsModelStore),
            sink: Arc::new(TracingSink),
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ModelStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn RetentionSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    #[must_use]
    pub fn options(&self) -> &RetentionOptions {
        &self.options
    }

    /// Merge `candidate` into the registry view, persist it if it is worth
    /// keeping, then delete every dominated artifact.
    pub fn run_cycle(&self, candidate: Option<Candidate<'_>>) -> RegistryResult<CycleReport> {
        let opts = &self.options;

        let new_record = match &candidate {
            Some(c) => {
                let (accuracies, epoch) = c.scores(opts.monitor_mode)?;
                Some(ModelRecord::candidate(
                    &self.dir,
                    self.identity.clone(),
                    accuracies,
                    epoch,
                    opts.save_format,
                ))
            }
            None => None,
        };

        let existing = list_models(self.store.as_ref(), &self.dir, &RecordFilter::for_identity(&self.identity))?;
        let new_record = new_record.filter(|record| {
            let known = existing.iter().any(|r| r.path() == record.path());
            if known {
                debug!(file = %record.file_name(), "candidate already in registry");
            }
            !known
        });
        let new_path = new_record.as_ref().map(|r| r.path().to_path_buf());
        let records: Vec<ModelRecord> = existing.into_iter().chain(new_record).collect();

        let verdicts = classify(&records, opts.policy);
        debug!(
            identity = %self.identity,
            records = records.len(),
            discards = verdicts.iter().filter(|v| !v.is_keep()).count(),
            "classified registry"
        );

        let mut report = CycleReport {
            kept: Vec::new(),
            saved: None,
            deleted: Vec::new(),
            would_delete: Vec::new(),
            best: None,
            finished_at: Utc::now(),
        };

        // Persist pass: nothing is deleted until every kept candidate is on disk.
        for (record, verdict) in records.iter().zip(&verdicts) {
            if !verdict.is_keep() {
                continue;
            }
            self.sink.on_event(RetentionEvent::Keep { file: record.file_name() });
            report.kept.push(record.path().to_path_buf());

            let is_candidate = new_path.as_deref() == Some(record.path());
            if opts.only_report || !is_candidate || self.store.exists(record.path()) {
                continue;
            }
            if let Some(c) = &candidate {
                debug!(path = %record.path().display(), weights_only = opts.save_weights_only, "save model start");
                c.source().save(record.path(), opts.save_weights_only)?;
                debug!(path = %record.path().display(), "save model ready");
                self.sink.on_event(RetentionEvent::Saved { path: record.path().to_path_buf() });
                report.saved = Some(record.path().to_path_buf());
            }
        }

        // Delete pass.
        for (record, verdict) in records.iter().zip(&verdicts) {
            let Verdict::Discard { dominated_by } = verdict else {
                continue;
            };

            if opts.only_report {
                self.sink.on_event(RetentionEvent::WouldDelete { file: record.file_name() });
                report.would_delete.push(record.path().to_path_buf());
            } else if self.store.exists(record.path()) {
                if self.store.is_dir(record.path()) {
                    self.store.delete_tree(record.path())?;
                } else {
                    self.store.delete_file(record.path())?;
                }
                self.sink.on_event(RetentionEvent::Deleted { path: record.path().to_path_buf() });
                report.deleted.push(record.path().to_path_buf());
            }

            if opts.debug {
                self.sink.on_event(RetentionEvent::DominatedBy {
                    file: record.file_name(),
                    better: dominated_by.iter().map(|&i| records[i].file_name()).collect(),
                });
            }
        }

        let survivors = records.iter().zip(&verdicts).filter(|(_, v)| v.is_keep()).map(|(r, _)| r);
        report.best = best_of(survivors).cloned();
        if opts.verbose || opts.debug {
            if let Some(best) = &report.best {
                self.sink.on_event(RetentionEvent::Best {
                    file: best.file_name(),
                    accuracies: best.accuracies(),
                    epoch: best.epoch(),
                });
            }
        }

        report.finished_at = Utc::now();
        Ok(report)
    }
}

impl fmt::Debug for RetentionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetentionController")
            .field("dir", &self.dir)
            .field("identity", &self.identity)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
