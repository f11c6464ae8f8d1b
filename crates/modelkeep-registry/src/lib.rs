//! ModelKeep Registry
//!
//! Retention for a directory of trained model artifacts:
//! - Encoding model identity and scores into file names (`codec`)
//! - Listing and filtering the registry from disk (`scanner`)
//! - Ranking candidates under best-only or Pareto retention (`ranking`)
//! - Running save-then-prune cycles (`retention`) from a training loop (`hook`)

pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod hook;
pub mod model;
pub mod ranking;
pub mod retention;
pub mod scanner;
pub mod store;

pub use codec::{
    format_model_basefilename, format_model_filename, parse_model_path, Accuracies, ModelIdentity, ModelRecord,
    SaveFormat,
};
pub use config::{IdentityConfig, RetentionConfig, RetentionSection};
pub use error::{RegistryError, RegistryResult};
pub use events::{RetentionEvent, RetentionSink, StdoutSink, TracingSink};
pub use hook::{CheckpointHook, EpochCallback, EpochLogs};
pub use model::{CopyArtifact, SaveableModel};
pub use ranking::{best_of, classify, sort_best_first, RetentionPolicy, Verdict};
pub use retention::{Candidate, CycleReport, MonitorMode, RetentionController, RetentionOptions};
pub use scanner::{best_model, list_models, max_traindata_version, RecordFilter};
pub use store::{FsModelStore, ModelStore};
