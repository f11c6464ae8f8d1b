use crate::codec::{H5_EXTENSION, HDF5_EXTENSION, TF_DIR_SUFFIX};
use crate::error::RegistryResult;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem primitives the registry needs from the model directory.
///
/// Deletes treat an already-absent target as success.
pub trait ModelStore {
    /// Entries of `dir` that look like model artifacts (`*.hdf5`, `*.h5`, `*_tf`).
    fn list(&self, dir: &Path) -> RegistryResult<Vec<PathBuf>>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn delete_file(&self, path: &Path) -> RegistryResult<()>;

    fn delete_tree(&self, path: &Path) -> RegistryResult<()>;
}

/// `true` when a directory entry name matches one of the artifact patterns.
#[must_use]
pub fn matches_model_pattern(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with(TF_DIR_SUFFIX) {
        return true;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(H5_EXTENSION | HDF5_EXTENSION)
    )
}

/// [`ModelStore`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsModelStore;

impl ModelStore for FsModelStore {
    fn list(&self, dir: &Path) -> RegistryResult<Vec<PathBuf>> {
        let mut out = Vec::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            if matches_model_pattern(&path) {
                out.push(path);
            }
        }

        // read_dir order is platform dependent
        out.sort();
        Ok(out)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn delete_file(&self, path: &Path) -> RegistryResult<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "file already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete_tree(&self, path: &Path) -> RegistryResult<()> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "directory already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
