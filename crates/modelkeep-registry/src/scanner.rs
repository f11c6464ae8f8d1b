use crate::codec::{parse_model_path, ModelIdentity, ModelRecord};
use crate::error::RegistryResult;
use crate::ranking::best_of;
use crate::store::ModelStore;
use std::path::Path;

/// Optional equality constraints on identity fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub segment_subject: Option<String>,
    pub model_architecture: Option<String>,
    pub traindata_version: Option<u32>,
    pub hyperparams_version: Option<u32>,
}

impl RecordFilter {
    /// A filter pinned to every field of `identity`.
    #[must_use]
    pub fn for_identity(identity: &ModelIdentity) -> Self {
        Self {
            segment_subject: Some(identity.segment_subject().to_string()),
            model_architecture: Some(identity.model_architecture().to_string()),
            traindata_version: Some(identity.traindata_version()),
            hyperparams_version: Some(identity.hyperparams_version()),
        }
    }

    #[must_use]
    pub fn matches(&self, record: &ModelRecord) -> bool {
        let id = record.identity();
        self.segment_subject.as_deref().map_or(true, |s| s == id.segment_subject())
            && self.model_architecture.as_deref().map_or(true, |a| a == id.model_architecture())
            && self.traindata_version.map_or(true, |v| v == id.traindata_version())
            && self.hyperparams_version.map_or(true, |v| v == id.hyperparams_version())
    }
}

/// Decode every artifact in `dir` and keep the ones matching `filter`.
///
/// Entries that fail to decode are skipped.
pub fn list_models(
    store: &dyn ModelStore,
    dir: &Path,
    filter: &RecordFilter,
) -> RegistryResult<Vec<ModelRecord>> {
    let records = store
        .list(dir)?
        .into_iter()
        .filter_map(|path| {
            let is_dir = store.is_dir(&path);
            parse_model_path(&path, is_dir)
        })
        .filter(|record| filter.matches(record))
        .collect();
    Ok(records)
}

/// Highest traindata version present in `dir`, or `None` when it holds no models.
pub fn max_traindata_version(store: &dyn ModelStore, dir: &Path) -> RegistryResult<Option<u32>> {
    let records = list_models(store, dir, &RecordFilter::default())?;
    Ok(records.iter().map(|r| r.identity().traindata_version()).max())
}

/// Best model in `dir` for `filter`.
///
/// Without an explicit traindata version the search is pinned to the highest
/// version present in the whole directory, so a subject that has not been
/// retrained on the newest data yet has no best model.
pub fn best_model(
    store: &dyn ModelStore,
    dir: &Path,
    filter: &RecordFilter,
) -> RegistryResult<Option<ModelRecord>> {
    let mut filter = filter.clone();
    if filter.traindata_version.is_none() {
        let Some(max_version) = max_traindata_version(store, dir)? else {
            return Ok(None);
        };
        filter.traindata_version = Some(max_version);
    }

    let records = list_models(store, dir, &filter)?;
    Ok(best_of(&records).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsModelStore;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"model").unwrap();
    }

    fn names(records: &[ModelRecord]) -> Vec<String> {
        records.iter().map(ModelRecord::file_name).collect()
    }

    #[test]
    fn test_list_models_applies_filters() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(dir, "roads_01_unet_0.80000_0.79000_0.81000_5.hdf5");
        touch(dir, "roads_02_unet+01_0.70000_0.70000_0.70000_2.hdf5");
        touch(dir, "trees_01_unet_0.90000_0.90000_0.90000_7.hdf5");
        touch(dir, "readme.md");

        let all = list_models(&FsModelStore, dir, &RecordFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let roads = RecordFilter { segment_subject: Some("roads".to_string()), ..Default::default() };
        assert_eq!(list_models(&FsModelStore, dir, &roads).unwrap().len(), 2);

        let hp1 = RecordFilter { hyperparams_version: Some(1), ..Default::default() };
        assert_eq!(
            names(&list_models(&FsModelStore, dir, &hp1).unwrap()),
            vec!["roads_02_unet+01_0.70000_0.70000_0.70000_2.hdf5"]
        );
    }

    #[test]
    fn test_list_models_skips_undecodable_entries() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(dir, "roads_xx_unet_0.8_0.8_0.8_1.hdf5");
        touch(dir, "broken.h5");
        std::fs::create_dir(dir.join("roads_01_unet_0.50000_0.50000_0.50000_1_tf")).unwrap();

        let all = list_models(&FsModelStore, dir, &RecordFilter::default()).unwrap();
        assert_eq!(names(&all), vec!["roads_01_unet_0.50000_0.50000_0.50000_1_tf"]);
    }

    #[test]
    fn test_max_traindata_version() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        assert_eq!(max_traindata_version(&FsModelStore, dir).unwrap(), None);

        touch(dir, "roads_03_unet_0.10000_0.10000_0.10000_1.hdf5");
        touch(dir, "trees_07_unet_0.10000_0.10000_0.10000_1.hdf5");
        assert_eq!(max_traindata_version(&FsModelStore, dir).unwrap(), Some(7));
    }

    #[test]
    fn test_best_model_pins_highest_version() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(dir, "roads_01_unet_0.95000_0.95000_0.95000_9.hdf5");
        touch(dir, "roads_02_unet_0.60000_0.60000_0.60000_1.hdf5");
        touch(dir, "roads_02_unet_0.70000_0.70000_0.70000_2.hdf5");

        let filter = RecordFilter { segment_subject: Some("roads".to_string()), ..Default::default() };
        let best = best_model(&FsModelStore, dir, &filter).unwrap().unwrap();
        assert_eq!(best.file_name(), "roads_02_unet_0.70000_0.70000_0.70000_2.hdf5");

        let v1 = RecordFilter { traindata_version: Some(1), ..filter };
        let best = best_model(&FsModelStore, dir, &v1).unwrap().unwrap();
        assert_eq!(best.accuracies().combined, 0.95);
    }

    #[test]
    fn test_best_model_pin_ignores_subject_filter() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(dir, "roads_01_unet_0.95000_0.95000_0.95000_9.hdf5");
        touch(dir, "trees_02_unet_0.50000_0.50000_0.50000_1.hdf5");

        let roads = RecordFilter { segment_subject: Some("roads".to_string()), ..Default::default() };
        assert!(best_model(&FsModelStore, dir, &roads).unwrap().is_none());

        let trees = RecordFilter { segment_subject: Some("trees".to_string()), ..Default::default() };
        let best = best_model(&FsModelStore, dir, &trees).unwrap().unwrap();
        assert_eq!(best.file_name(), "trees_02_unet_0.50000_0.50000_0.50000_1.hdf5");

        let roads_v1 = RecordFilter { traindata_version: Some(1), ..roads };
        assert!(best_model(&FsModelStore, dir, &roads_v1).unwrap().is_some());
    }

    #[test]
    fn test_best_model_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(best_model(&FsModelStore, temp.path(), &RecordFilter::default()).unwrap().is_none());
    }
}
