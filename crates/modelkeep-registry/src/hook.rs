use crate::error::RegistryResult;
use crate::model::SaveableModel;
use crate::retention::{Candidate, CycleReport, RetentionController};
use std::collections::HashMap;
use tracing::debug;

/// Metric values a training loop reports at the end of an epoch, keyed by name.
pub type EpochLogs = HashMap<String, f64>;

/// Called by a training loop once per evaluation point, in increasing epoch
/// order, from a single thread. The loop blocks until the call returns.
pub trait EpochCallback {
    fn on_epoch_end(&self, epoch: u32, logs: &EpochLogs, model: &dyn SaveableModel) -> RegistryResult<()>;
}

/// Turns each epoch report into one retention cycle.
pub struct CheckpointHook {
    controller: RetentionController,
    monitor_metric_train: String,
    monitor_metric_validation: String,
    save_source: Option<Box<dyn SaveableModel>>,
}

impl CheckpointHook {
    #[must_use]
    pub fn new(
        controller: RetentionController,
        monitor_metric_train: impl Into<String>,
        monitor_metric_validation: impl Into<String>,
    ) -> Self {
        Self {
            controller,
            monitor_metric_train: monitor_metric_train.into(),
            monitor_metric_validation: monitor_metric_validation.into(),
            save_source: None,
        }
    }

    /// Serialize `source` instead of the model handed to `on_epoch_end`.
    #[must_use]
    pub fn with_save_source(mut self, source: Box<dyn SaveableModel>) -> Self {
        self.save_source = Some(source);
        self
    }

    #[must_use]
    pub fn controller(&self) -> &RetentionController {
        &self.controller
    }

    pub fn run_epoch(&self, epoch: u32, logs: &EpochLogs, model: &dyn SaveableModel) -> RegistryResult<CycleReport> {
        debug!(epoch, "checkpoint hook: epoch end");
        let candidate = Candidate {
            model,
            save_source: self.save_source.as_deref(),
            train_metric: logs.get(&self.monitor_metric_train).copied(),
            val_metric: logs.get(&self.monitor_metric_validation).copied(),
            epoch: Some(epoch),
        };
        self.controller.run_cycle(Some(candidate))
    }
}

impl EpochCallback for CheckpointHook {
    fn on_epoch_end(&self, epoch: u32, logs: &EpochLogs, model: &dyn SaveableModel) -> RegistryResult<()> {
        self.run_epoch(epoch, logs, model).map(|_| ())
    }
}
