use crate::codec::{SaveFormat, TF_DIR_SUFFIX};
use crate::error::{RegistryError, RegistryResult};
use std::path::{Path, PathBuf};

/// A trained model handle that can serialize itself.
///
/// Callers only invoke `save` when `destination` does not exist yet. The
/// implementation must create either a single file or a self-contained
/// directory tree at `destination`.
pub trait SaveableModel {
    fn save(&self, destination: &Path, weights_only: bool) -> RegistryResult<()>;
}

/// A model that was already serialized by an external trainer; saving copies
/// that artifact (file or directory tree) into the registry.
#[derive(Debug, Clone)]
pub struct CopyArtifact {
    source: PathBuf,
}

impl CopyArtifact {
    #[must_use]
    pub fn new(source: PathBuf) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Format matching the source: a directory is a savedmodel, a file is h5.
    #[must_use]
    pub fn save_format(&self) -> SaveFormat {
        if self.source.is_dir() { SaveFormat::Tf } else { SaveFormat::H5 }
    }
}

impl SaveableModel for CopyArtifact {
    fn save(&self, destination: &Path, _weights_only: bool) -> RegistryResult<()> {
        if !self.source.exists() {
            return Err(RegistryError::Persist {
                path: destination.display().to_string(),
                reason: format!("source artifact does not exist: {}", self.source.display()),
            });
        }

        // A file named `_tf` or a directory named `.hdf5` would not decode.
        let expects_dir = destination
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TF_DIR_SUFFIX));
        if self.source.is_dir() != expects_dir {
            return Err(RegistryError::Persist {
                path: destination.display().to_string(),
                reason: format!(
                    "source artifact {} is a {} but save_format {} needs a {}",
                    self.source.display(),
                    kind(self.source.is_dir()),
                    if expects_dir { SaveFormat::Tf } else { SaveFormat::H5 },
                    kind(expects_dir),
                ),
            });
        }

        if self.source.is_dir() {
            copy_tree(&self.source, destination)?;
        } else {
            std::fs::copy(&self.source, destination)?;
        }
        Ok(())
    }
}

fn kind(is_dir: bool) -> &'static str {
    if is_dir { "directory" } else { "file" }
}

fn copy_tree(from: &Path, to: &Path) -> RegistryResult<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_single_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("trained.hdf5");
        std::fs::write(&source, b"weights").unwrap();

        let dest = temp.path().join("roads_01_unet_0.50000_0.50000_0.50000_1.hdf5");
        CopyArtifact::new(source).save(&dest, false).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"weights");
    }

    #[test]
    fn test_copy_directory_tree() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("export");
        std::fs::create_dir_all(source.join("variables")).unwrap();
        std::fs::write(source.join("saved_model.pb"), b"graph").unwrap();
        std::fs::write(source.join("variables").join("variables.index"), b"idx").unwrap();

        let dest = temp.path().join("roads_01_unet_0.50000_0.50000_0.50000_1_tf");
        CopyArtifact::new(source).save(&dest, false).unwrap();
        assert!(dest.join("saved_model.pb").is_file());
        assert!(dest.join("variables").join("variables.index").is_file());
    }

    #[test]
    fn test_source_kind_must_match_destination() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("trained.h5");
        std::fs::write(&file, b"weights").unwrap();
        let export = temp.path().join("export");
        std::fs::create_dir(&export).unwrap();

        let tf_dest = temp.path().join("roads_01_unet_0.50000_0.50000_0.50000_1_tf");
        let err = CopyArtifact::new(file.clone()).save(&tf_dest, false).unwrap_err();
        assert!(matches!(err, RegistryError::Persist { .. }));
        assert!(!tf_dest.exists());

        let h5_dest = temp.path().join("roads_01_unet_0.50000_0.50000_0.50000_1.hdf5");
        let err = CopyArtifact::new(export.clone()).save(&h5_dest, false).unwrap_err();
        assert!(matches!(err, RegistryError::Persist { .. }));
        assert!(!h5_dest.exists());

        assert_eq!(CopyArtifact::new(file).save_format(), SaveFormat::H5);
        assert_eq!(CopyArtifact::new(export).save_format(), SaveFormat::Tf);
    }

    #[test]
    fn test_missing_source_is_persist_error() {
        let temp = TempDir::new().unwrap();
        let err = CopyArtifact::new(temp.path().join("nope"))
            .save(&temp.path().join("x.hdf5"), false)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Persist { .. }));
    }
}
