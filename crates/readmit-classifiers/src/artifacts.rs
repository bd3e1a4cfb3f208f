//! On-disk persistence of the four training artifacts.
//!
//! Each artifact is an independent JSON file. There is no transaction across
//! the four writes: a failure part-way through leaves whatever was already
//! written in place.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ReadmitError, Result};
use crate::models::{Classifier, ClassifierModel};
use crate::preprocessing::{MedianImputer, StandardScaler};

pub const BAGGED_TREES_FILE: &str = "bagged_trees.json";
pub const BOOSTED_TREES_FILE: &str = "boosted_trees.json";
pub const IMPUTER_FILE: &str = "imputer.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const DEFAULT_ARTIFACT_DIR: &str = "models";

/// Locations of the four artifact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub bagged_trees: PathBuf,
    pub boosted_trees: PathBuf,
    pub imputer: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    /// The fixed file names inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        ArtifactPaths {
            bagged_trees: dir.join(BAGGED_TREES_FILE),
            boosted_trees: dir.join(BOOSTED_TREES_FILE),
            imputer: dir.join(IMPUTER_FILE),
            scaler: dir.join(SCALER_FILE),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [
            self.bagged_trees.as_path(),
            self.boosted_trees.as_path(),
            self.imputer.as_path(),
            self.scaler.as_path(),
        ]
    }

    /// Artifact files that do not exist yet.
    pub fn missing(&self) -> Vec<&Path> {
        self.all().into_iter().filter(|p| !p.is_file()).collect()
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        ArtifactPaths::in_dir(DEFAULT_ARTIFACT_DIR)
    }
}

pub fn save_artifact<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReadmitError::artifact(parent, e))?;
    }
    let file = File::create(path).map_err(|e| ReadmitError::artifact(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| ReadmitError::artifact(path, e))?;
    writer.flush().map_err(|e| ReadmitError::artifact(path, e))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

pub fn load_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| ReadmitError::artifact(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| ReadmitError::artifact(path, e))
}

/// Everything the inference service needs, loaded together.
#[derive(Debug)]
pub struct ArtifactBundle {
    pub bagged_trees: Classifier,
    pub boosted_trees: Classifier,
    pub imputer: MedianImputer,
    pub scaler: StandardScaler,
}

impl ArtifactBundle {
    /// Check the pieces belong together: fitted models of the expected kind,
    /// transforms sharing one feature schema, and one finite fitted value per
    /// column with every scale strictly positive.
    pub fn validate(&self) -> Result<()> {
        if self.imputer.schema != self.scaler.schema {
            return Err(ReadmitError::SchemaMismatch {
                expected: self.imputer.schema.columns().to_vec(),
                actual: self.scaler.schema.columns().to_vec(),
            });
        }
        let n_features = self.imputer.schema.len();
        if self.imputer.medians.len() != n_features {
            return Err(ReadmitError::artifact(
                IMPUTER_FILE,
                format!(
                    "{} medians for {} feature columns",
                    self.imputer.medians.len(),
                    n_features
                ),
            ));
        }
        if self.scaler.mean.len() != n_features || self.scaler.std.len() != n_features {
            return Err(ReadmitError::artifact(
                SCALER_FILE,
                format!(
                    "{} means and {} standard deviations for {} feature columns",
                    self.scaler.mean.len(),
                    self.scaler.std.len(),
                    n_features
                ),
            ));
        }
        if let Some(bad) = self.imputer.medians.iter().find(|v| !v.is_finite()) {
            return Err(ReadmitError::artifact(
                IMPUTER_FILE,
                format!("non-finite median {}", bad),
            ));
        }
        if let Some(bad) = self.scaler.mean.iter().find(|v| !v.is_finite()) {
            return Err(ReadmitError::artifact(
                SCALER_FILE,
                format!("non-finite mean {}", bad),
            ));
        }
        if let Some(bad) = self.scaler.std.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(ReadmitError::artifact(
                SCALER_FILE,
                format!("standard deviation {} is not positive", bad),
            ));
        }
        for (model, expected) in [
            (&self.bagged_trees, "bagged_trees"),
            (&self.boosted_trees, "boosted_trees"),
        ] {
            if model.name() != expected {
                return Err(ReadmitError::Model(format!(
                    "expected a {} model, found {}",
                    expected,
                    model.name()
                )));
            }
            if !model.is_fitted() {
                return Err(ReadmitError::Model(format!(
                    "{} artifact holds an unfitted model",
                    expected
                )));
            }
        }
        Ok(())
    }

    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        save_artifact(&self.bagged_trees, &paths.bagged_trees)?;
        save_artifact(&self.boosted_trees, &paths.boosted_trees)?;
        save_artifact(&self.imputer, &paths.imputer)?;
        save_artifact(&self.scaler, &paths.scaler)?;
        log::info!(
            "Saved artifacts: {}",
            paths
                .all()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let bundle = ArtifactBundle {
            bagged_trees: load_artifact(&paths.bagged_trees)?,
            boosted_trees: load_artifact(&paths.boosted_trees)?,
            imputer: load_artifact(&paths.imputer)?,
            scaler: load_artifact(&paths.scaler)?,
        };
        bundle.validate()?;
        Ok(bundle)
    }
}
