//! Filename codec for model artifacts.
//!
//! A model's identity and scores are stored in its name only:
//!
//! ```text
//! {subject}_{traindata:02}_{architecture}[+{hyperparams:02}]_{combined:.5}_{train:.5}_{val:.5}_{epoch}
//! ```
//!
//! followed by `_tf` for a savedmodel directory or `.hdf5` for a single file.

use crate::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

pub const FIELD_SEPARATOR: char = '_';
pub const HYPERPARAMS_SEPARATOR: char = '+';
pub const TF_DIR_SUFFIX: &str = "_tf";
pub const HDF5_EXTENSION: &str = "hdf5";
pub const H5_EXTENSION: &str = "h5";

/// On-disk representation of a saved model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SaveFormat {
    /// Single keras file (`.hdf5`, `.h5` accepted on decode).
    H5,
    /// Self-contained savedmodel directory (`_tf`).
    #[default]
    Tf,
}

impl SaveFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::H5 => "h5",
            Self::Tf => "tf",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveFormat {
    type Err = RegistryError;

    fn from_str(s: &str) -> RegistryResult<Self> {
        match s {
            "h5" => Ok(Self::H5),
            "tf" => Ok(Self::Tf),
            other => Err(RegistryError::invalid_config(format!(
                "invalid save_format: {other}, should be one of [h5, tf]"
            ))),
        }
    }
}

impl TryFrom<String> for SaveFormat {
    type Error = RegistryError;

    fn try_from(value: String) -> RegistryResult<Self> {
        value.parse()
    }
}

impl From<SaveFormat> for String {
    fn from(value: SaveFormat) -> Self {
        value.as_str().to_string()
    }
}

/// The tuple that groups artifacts of one logical training target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelIdentity {
    segment_subject: String,
    traindata_version: u32,
    model_architecture: String,
    hyperparams_version: u32,
}

impl ModelIdentity {
    /// Validate and build an identity.
    ///
    /// Neither the subject nor the architecture may contain `_`, and the
    /// architecture may not end in `+<digits>`, otherwise the encoded name
    /// would not decode back to the same identity.
    pub fn new(
        segment_subject: impl Into<String>,
        traindata_version: u32,
        model_architecture: impl Into<String>,
        hyperparams_version: u32,
    ) -> RegistryResult<Self> {
        let segment_subject = segment_subject.into();
        let model_architecture = model_architecture.into();

        if segment_subject.trim().is_empty() {
            return Err(RegistryError::invalid_config("segment_subject is required"));
        }
        if segment_subject.contains(FIELD_SEPARATOR) {
            return Err(RegistryError::invalid_config(format!(
                "segment_subject must not contain '{FIELD_SEPARATOR}': {segment_subject}"
            )));
        }
        if model_architecture.trim().is_empty() {
            return Err(RegistryError::invalid_config("model_architecture is required"));
        }
        if model_architecture.contains(FIELD_SEPARATOR) {
            return Err(RegistryError::invalid_config(format!(
                "model_architecture must not contain '{FIELD_SEPARATOR}': {model_architecture}"
            )));
        }
        if has_hyperparams_suffix(&model_architecture) {
            return Err(RegistryError::invalid_config(format!(
                "model_architecture must not end in '+<digits>': {model_architecture}"
            )));
        }

        Ok(Self { segment_subject, traindata_version, model_architecture, hyperparams_version })
    }

    #[must_use]
    pub fn segment_subject(&self) -> &str {
        &self.segment_subject
    }

    #[must_use]
    pub fn traindata_version(&self) -> u32 {
        self.traindata_version
    }

    #[must_use]
    pub fn model_architecture(&self) -> &str {
        &self.model_architecture
    }

    #[must_use]
    pub fn hyperparams_version(&self) -> u32 {
        self.hyperparams_version
    }

    #[must_use]
    pub fn basefilename(&self) -> String {
        format_model_basefilename(self)
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.basefilename())
    }
}

/// Maximization scores; higher is always better.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accuracies {
    #[serde(rename = "acc_combined")]
    pub combined: f64,
    #[serde(rename = "acc_train")]
    pub train: f64,
    #[serde(rename = "acc_val")]
    pub val: f64,
}

impl Accuracies {
    /// Build scores from train/val with `combined` as their mean.
    #[must_use]
    pub fn from_train_val(train: f64, val: f64) -> Self {
        Self { combined: (train + val) / 2.0, train, val }
    }
}

/// One artifact in the registry, decoded from disk or wrapping a fresh candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRecord {
    #[serde(flatten)]
    identity: ModelIdentity,
    #[serde(flatten)]
    accuracies: Accuracies,
    epoch: u32,
    save_format: SaveFormat,
    has_scores: bool,
    path: PathBuf,
}

impl ModelRecord {
    /// Wrap a not-yet-persisted model; its path is derived from the other fields.
    #[must_use]
    pub fn candidate(
        dir: &Path,
        identity: ModelIdentity,
        accuracies: Accuracies,
        epoch: u32,
        save_format: SaveFormat,
    ) -> Self {
        let path = dir.join(format_model_filename(&identity, &accuracies, epoch, save_format));
        Self { identity, accuracies, epoch, save_format, has_scores: true, path }
    }

    #[must_use]
    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    #[must_use]
    pub fn accuracies(&self) -> Accuracies {
        self.accuracies
    }

    #[must_use]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    #[must_use]
    pub fn save_format(&self) -> SaveFormat {
        self.save_format
    }

    /// False when the name carried no accuracy fields.
    #[must_use]
    pub fn has_scores(&self) -> bool {
        self.has_scores
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn basefilename(&self) -> String {
        self.identity.basefilename()
    }
}

/// `{subject}_{traindata:02}_{architecture}[+{hyperparams:02}]`
#[must_use]
pub fn format_model_basefilename(identity: &ModelIdentity) -> String {
    let mut name = format!(
        "{}{FIELD_SEPARATOR}{:02}{FIELD_SEPARATOR}{}",
        identity.segment_subject, identity.traindata_version, identity.model_architecture
    );
    if identity.hyperparams_version > 0 {
        name.push_str(&format!("{HYPERPARAMS_SEPARATOR}{:02}", identity.hyperparams_version));
    }
    name
}

#[must_use]
pub fn format_model_filename(
    identity: &ModelIdentity,
    accuracies: &Accuracies,
    epoch: u32,
    save_format: SaveFormat,
) -> String {
    let mut name = format!(
        "{base}_{combined:.5}_{train:.5}_{val:.5}_{epoch}",
        base = format_model_basefilename(identity),
        combined = accuracies.combined,
        train = accuracies.train,
        val = accuracies.val,
    );
    match save_format {
        SaveFormat::Tf => name.push_str(TF_DIR_SUFFIX),
        SaveFormat::H5 => {
            name.push('.');
            name.push_str(HDF5_EXTENSION);
        }
    }
    name
}

fn has_hyperparams_suffix(token: &str) -> bool {
    token
        .rsplit_once(HYPERPARAMS_SEPARATOR)
        .is_some_and(|(_, suffix)| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
}

/// Split `unet+03` into `("unet", 3)`; a missing or non-numeric suffix yields 0.
fn split_architecture(token: &str) -> (&str, u32) {
    if has_hyperparams_suffix(token) {
        if let Some((arch, suffix)) = token.rsplit_once(HYPERPARAMS_SEPARATOR) {
            if let Ok(version) = suffix.parse() {
                return (arch, version);
            }
        }
    }
    (token, 0)
}

/// Decode a registry entry. Returns `None` (and logs why) for anything that is
/// not a model artifact.
#[must_use]
pub fn parse_model_path(path: &Path, is_dir: bool) -> Option<ModelRecord> {
    let (name, save_format) = if is_dir {
        let name = path.file_name().and_then(|n| n.to_str());
        match name {
            Some(name) if name.ends_with(TF_DIR_SUFFIX) => (name, SaveFormat::Tf),
            _ => {
                warn!(path = %path.display(), "not a model path, directory needs to end on _tf");
                return None;
            }
        }
    } else {
        let ext = path.extension().and_then(|e| e.to_str());
        let stem = path.file_stem().and_then(|s| s.to_str());
        match (ext, stem) {
            (Some(H5_EXTENSION | HDF5_EXTENSION), Some(stem)) => (stem, SaveFormat::H5),
            _ => {
                warn!(path = %path.display(), "not a model path, file needs a .h5 or .hdf5 extension");
                return None;
            }
        }
    };

    let fields: Vec<&str> = name.split(FIELD_SEPARATOR).collect();
    if fields.len() < 3 {
        warn!(path = %path.display(), "not a model path, expected at least 3 '_' separated fields");
        return None;
    }

    let Ok(traindata_version) = fields[1].parse::<u32>() else {
        warn!(path = %path.display(), field = fields[1], "not a model path, invalid traindata version");
        return None;
    };
    let (model_architecture, hyperparams_version) = split_architecture(fields[2]);
    let identity = ModelIdentity {
        segment_subject: fields[0].to_string(),
        traindata_version,
        model_architecture: model_architecture.to_string(),
        hyperparams_version,
    };

    let (accuracies, epoch, has_scores) = if fields.len() >= 7 {
        let parsed = (
            fields[3].parse::<f64>(),
            fields[4].parse::<f64>(),
            fields[5].parse::<f64>(),
            fields[6].parse::<u32>(),
        );
        let (Ok(combined), Ok(train), Ok(val), Ok(epoch)) = parsed else {
            warn!(path = %path.display(), "not a model path, accuracy or epoch fields are not numeric");
            return None;
        };
        (Accuracies { combined, train, val }, epoch, true)
    } else {
        warn!(path = %path.display(), "no model accuracy information found");
        (Accuracies::default(), 0, false)
    };

    Some(ModelRecord {
        identity,
        accuracies,
        epoch,
        save_format,
        has_scores,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roads(hyperparams_version: u32) -> ModelIdentity {
        ModelIdentity::new("roads", 1, "unet", hyperparams_version).unwrap()
    }

    #[test]
    fn test_basefilename_appends_hyperparams_when_positive() {
        assert_eq!(format_model_basefilename(&roads(3)), "roads_01_unet+03");
        assert_eq!(format_model_basefilename(&roads(0)), "roads_01_unet");
    }

    #[test]
    fn test_filename_suffix_depends_on_format() {
        let acc = Accuracies { combined: 0.8, train: 0.79, val: 0.81 };
        assert_eq!(
            format_model_filename(&roads(0), &acc, 5, SaveFormat::H5),
            "roads_01_unet_0.80000_0.79000_0.81000_5.hdf5"
        );
        assert_eq!(
            format_model_filename(&roads(2), &acc, 5, SaveFormat::Tf),
            "roads_01_unet+02_0.80000_0.79000_0.81000_5_tf"
        );
    }

    #[test]
    fn test_parse_single_file_name() {
        let path = Path::new("/models/roads_01_unet_0.80000_0.79000_0.81000_5.hdf5");
        let record = parse_model_path(path, false).unwrap();

        assert_eq!(record.identity(), &roads(0));
        assert_eq!(record.accuracies(), Accuracies { combined: 0.8, train: 0.79, val: 0.81 });
        assert_eq!(record.epoch(), 5);
        assert_eq!(record.save_format(), SaveFormat::H5);
        assert!(record.has_scores());
        assert_eq!(record.path(), path);
    }

    #[test]
    fn test_parse_h5_extension_and_tf_directory() {
        let h5 = parse_model_path(Path::new("roads_01_unet+04_0.5_0.5_0.5_1.h5"), false).unwrap();
        assert_eq!(h5.identity().hyperparams_version(), 4);
        assert_eq!(h5.identity().model_architecture(), "unet");

        let tf = parse_model_path(Path::new("roads_01_unet_0.60000_0.50000_0.70000_9_tf"), true).unwrap();
        assert_eq!(tf.save_format(), SaveFormat::Tf);
        assert_eq!(tf.epoch(), 9);
        assert_eq!(tf.accuracies().val, 0.7);
    }

    #[test]
    fn test_parse_rejects_non_model_entries() {
        assert!(parse_model_path(Path::new("roads_01_unet_0.5_0.5_0.5_1_tf"), false).is_none());
        assert!(parse_model_path(Path::new("roads_01_unet"), true).is_none());
        assert!(parse_model_path(Path::new("notes.txt"), false).is_none());
        assert!(parse_model_path(Path::new("roads_01.hdf5"), false).is_none());
        assert!(parse_model_path(Path::new("roads_xx_unet.hdf5"), false).is_none());
        assert!(parse_model_path(Path::new("roads_01_unet_high_0.5_0.5_1.hdf5"), false).is_none());
    }

    #[test]
    fn test_parse_without_scores_is_degraded() {
        let record = parse_model_path(Path::new("roads_01_unet+02.hdf5"), false).unwrap();
        assert!(!record.has_scores());
        assert_eq!(record.accuracies(), Accuracies::default());
        assert_eq!(record.epoch(), 0);
        assert_eq!(record.basefilename(), "roads_01_unet+02");
    }

    #[test]
    fn test_non_numeric_plus_suffix_stays_in_architecture() {
        let record = parse_model_path(Path::new("roads_01_unet+big_0.5_0.5_0.5_1.hdf5"), false).unwrap();
        assert_eq!(record.identity().model_architecture(), "unet+big");
        assert_eq!(record.identity().hyperparams_version(), 0);
    }

    #[test]
    fn test_identity_validation() {
        assert!(ModelIdentity::new("road_s", 1, "unet", 0).is_err());
        assert!(ModelIdentity::new("roads", 1, "u_net", 0).is_err());
        assert!(ModelIdentity::new("roads", 1, "unet+05", 0).is_err());
        assert!(ModelIdentity::new("roads", 1, "unet+00", 0).is_err());
        assert!(ModelIdentity::new("", 1, "unet", 0).is_err());
        assert!(ModelIdentity::new("roads", 1, "unet+big", 0).is_ok());
    }

    #[test]
    fn test_save_format_parsing() {
        assert_eq!("h5".parse::<SaveFormat>().unwrap(), SaveFormat::H5);
        assert_eq!("tf".parse::<SaveFormat>().unwrap(), SaveFormat::Tf);
        assert!(matches!("pt".parse::<SaveFormat>(), Err(RegistryError::InvalidConfig(_))));
    }

    #[test]
    fn test_candidate_path_lives_in_dir() {
        let acc = Accuracies::from_train_val(0.8, 0.7);
        let record = ModelRecord::candidate(Path::new("/m"), roads(0), acc, 3, SaveFormat::Tf);
        assert_eq!(record.path(), Path::new("/m/roads_01_unet_0.75000_0.80000_0.70000_3_tf"));
        assert_eq!(record.file_name(), "roads_01_unet_0.75000_0.80000_0.70000_3_tf");
    }
}
