//! CLI configuration loading.

use anyhow::{Context, Result};
use modelkeep_registry::RetentionConfig;
use std::path::{Path, PathBuf};

/// Get default local configuration file path.
pub fn default_local_path() -> PathBuf {
    PathBuf::from("modelkeep.toml")
}

/// Load the retention config.
///
/// Configuration precedence:
/// 1. CLI arguments (merged by the commands)
/// 2. Explicit `--config` file (must exist)
/// 3. Local config file (./modelkeep.toml), if present
pub fn load_config(explicit: Option<&Path>) -> Result<Option<RetentionConfig>> {
    if let Some(path) = explicit {
        let config = RetentionConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;
        return Ok(Some(config));
    }

    let local = default_local_path();
    if !local.exists() {
        return Ok(None);
    }
    let config = RetentionConfig::load_from_file(&local)
        .with_context(|| format!("Failed to load config file: {}", local.display()))?;
    Ok(Some(config))
}
