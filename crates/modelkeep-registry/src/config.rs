//! Retention configuration file support.
//!
//! ```toml
//! model_dir = "models"
//!
//! [identity]
//! segment_subject = "roads"
//! traindata_version = 1
//! model_architecture = "unet"
//! hyperparams_version = 0
//!
//! [retention]
//! monitor_metric_mode = "min"
//! monitor_metric_train = "loss"
//! monitor_metric_validation = "val_loss"
//! save_format = "tf"
//! save_best_only = false
//! ```

use crate::codec::{ModelIdentity, SaveFormat};
use crate::error::{RegistryError, RegistryResult};
use crate::hook::CheckpointHook;
use crate::ranking::RetentionPolicy;
use crate::retention::{MonitorMode, RetentionController, RetentionOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    pub identity: IdentityConfig,
    pub retention: RetentionSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub segment_subject: String,
    pub traindata_version: u32,
    pub model_architecture: String,
    #[serde(default)]
    pub hyperparams_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSection {
    pub monitor_metric_mode: MonitorMode,
    #[serde(default)]
    pub monitor_metric_train: Option<String>,
    #[serde(default)]
    pub monitor_metric_validation: Option<String>,
    #[serde(default)]
    pub save_format: SaveFormat,
    #[serde(default)]
    pub save_best_only: bool,
    #[serde(default)]
    pub save_weights_only: bool,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub only_report: bool,
}

fn default_verbose() -> bool {
    true
}

impl RetentionConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> RegistryResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| RegistryError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> RegistryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| RegistryError::invalid_config(format!("{}: {e}", path.display())))
    }

    pub fn validate(&self) -> RegistryResult<()> {
        self.identity()?;
        Ok(())
    }

    pub fn identity(&self) -> RegistryResult<ModelIdentity> {
        let id = &self.identity;
        ModelIdentity::new(
            id.segment_subject.clone(),
            id.traindata_version,
            id.model_architecture.clone(),
            id.hyperparams_version,
        )
    }

    #[must_use]
    pub fn options(&self) -> RetentionOptions {
        let r = &self.retention;
        RetentionOptions {
            policy: RetentionPolicy::from_save_best_only(r.save_best_only),
            monitor_mode: r.monitor_metric_mode,
            save_format: r.save_format,
            save_weights_only: r.save_weights_only,
            verbose: r.verbose,
            debug: r.debug,
            only_report: r.only_report,
        }
    }

    /// Build a controller; `model_dir` overrides the configured directory.
    pub fn controller(&self, model_dir: Option<PathBuf>) -> RegistryResult<RetentionController> {
        let dir = model_dir
            .or_else(|| self.model_dir.clone())
            .ok_or_else(|| RegistryError::invalid_config("model_dir is required"))?;
        Ok(RetentionController::new(dir, self.identity()?, self.options()))
    }

    pub fn checkpoint_hook(&self, model_dir: Option<PathBuf>) -> RegistryResult<CheckpointHook> {
        let r = &self.retention;
        let (Some(train), Some(val)) = (&r.monitor_metric_train, &r.monitor_metric_validation) else {
            return Err(RegistryError::invalid_config(
                "monitor_metric_train and monitor_metric_validation are required for the checkpoint hook",
            ));
        };
        Ok(CheckpointHook::new(self.controller(model_dir)?, train.clone(), val.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
model_dir = "models"

[identity]
segment_subject = "roads"
traindata_version = 1
model_architecture = "unet"
hyperparams_version = 3

[retention]
monitor_metric_mode = "min"
monitor_metric_train = "loss"
monitor_metric_validation = "val_loss"
save_format = "h5"
save_best_only = true
"#;

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("modelkeep.toml");
        std::fs::write(&path, CONFIG).unwrap();

        let config = RetentionConfig::load_from_file(&path).unwrap();
        assert_eq!(config.identity().unwrap().basefilename(), "roads_01_unet+03");

        let options = config.options();
        assert_eq!(options.policy, RetentionPolicy::BestOnly);
        assert_eq!(options.monitor_mode, MonitorMode::Min);
        assert_eq!(options.save_format, SaveFormat::H5);
        assert!(options.verbose);
        assert!(!options.only_report);

        let hook = config.checkpoint_hook(None).unwrap();
        assert_eq!(hook.controller().dir(), Path::new("models"));
    }

    #[test]
    fn test_defaults() {
        let config = RetentionConfig::from_toml_str(
            r#"
[identity]
segment_subject = "roads"
traindata_version = 2
model_architecture = "unet"

[retention]
monitor_metric_mode = "max"
"#,
        )
        .unwrap();
        let options = config.options();
        assert_eq!(options.policy, RetentionPolicy::Pareto);
        assert_eq!(options.save_format, SaveFormat::Tf);
        assert!(config.controller(None).is_err());
        assert!(config.checkpoint_hook(Some(PathBuf::from("m"))).is_err());
    }

    #[test]
    fn test_invalid_enum_values_are_config_errors() {
        let bad_mode = CONFIG.replace(r#"monitor_metric_mode = "min""#, r#"monitor_metric_mode = "lowest""#);
        assert!(matches!(RetentionConfig::from_toml_str(&bad_mode), Err(RegistryError::InvalidConfig(_))));

        let bad_format = CONFIG.replace(r#"save_format = "h5""#, r#"save_format = "onnx""#);
        assert!(matches!(RetentionConfig::from_toml_str(&bad_format), Err(RegistryError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_identity_is_rejected() {
        let bad = CONFIG.replace(r#"segment_subject = "roads""#, r#"segment_subject = "main_roads""#);
        assert!(matches!(RetentionConfig::from_toml_str(&bad), Err(RegistryError::InvalidConfig(_))));
    }
}
