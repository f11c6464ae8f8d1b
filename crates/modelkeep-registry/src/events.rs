use crate::codec::Accuracies;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// What a retention cycle did (or would do) to one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetentionEvent {
    Keep { file: String },
    Saved { path: PathBuf },
    Deleted { path: PathBuf },
    WouldDelete { file: String },
    DominatedBy { file: String, better: Vec<String> },
    Best { file: String, accuracies: Accuracies, epoch: u32 },
}

/// Receives retention events; passed explicitly into the controller.
pub trait RetentionSink: Send + Sync {
    fn on_event(&self, event: RetentionEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl RetentionSink for TracingSink {
    fn on_event(&self, event: RetentionEvent) {
        match event {
            RetentionEvent::Keep { file } => debug!(%file, "KEEP"),
            RetentionEvent::Saved { path } => info!(path = %path.display(), "saved model"),
            RetentionEvent::Deleted { path } => info!(path = %path.display(), "DELETE"),
            RetentionEvent::WouldDelete { file } => info!(%file, "DELETE (report only)"),
            RetentionEvent::DominatedBy { file, better } => {
                debug!(%file, better = ?better, "better model(s) found");
            }
            RetentionEvent::Best { file, accuracies, epoch } => info!(
                %file,
                acc_combined = accuracies.combined,
                acc_train = accuracies.train,
                acc_val = accuracies.val,
                epoch,
                "best model"
            ),
        }
    }
}

/// Prints events as plain lines.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl RetentionSink for StdoutSink {
    fn on_event(&self, event: RetentionEvent) {
        match event {
            RetentionEvent::Keep { file } => println!("[keep] {file}"),
            RetentionEvent::Saved { path } => println!("[save] {}", path.display()),
            RetentionEvent::Deleted { path } => println!("[delete] {}", path.display()),
            RetentionEvent::WouldDelete { file } => println!("[would delete] {file}"),
            RetentionEvent::DominatedBy { file, better } => {
                println!("Better one(s) found for {file}:");
                for b in better {
                    println!("  {b}");
                }
            }
            RetentionEvent::Best { accuracies, epoch, .. } => println!(
                "BEST MODEL: acc_combined: {}, acc_train: {}, acc_val: {}, epoch: {epoch}",
                accuracies.combined, accuracies.train, accuracies.val
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = RetentionEvent::WouldDelete { file: "a.hdf5".to_string() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"type": "would_delete", "file": "a.hdf5"}));
    }
}
