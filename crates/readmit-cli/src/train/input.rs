use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use readmit_classifiers::artifacts::DEFAULT_ARTIFACT_DIR;
use readmit_classifiers::config::EnsembleConfig;
use readmit_classifiers::preprocessing::TARGET_COLUMN;

use crate::util::{load_or_default, read_config_json, validate_tsv_or_csv_file};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TrainConfig {
    pub version: String,
    /// CSV or TSV file with a header row.
    pub train_data: String,
    pub target_column: String,
    /// Directory the four artifacts are written to.
    pub artifact_dir: String,
    pub validation_fraction: f64,
    /// Seed for the train/validation split.
    pub seed: u64,
    pub models: EnsembleConfig,
    /// HTML training report; `None` disables it.
    pub report_file: Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            version: clap::crate_version!().to_string(),
            train_data: String::new(),
            target_column: TARGET_COLUMN.to_string(),
            artifact_dir: DEFAULT_ARTIFACT_DIR.to_string(),
            validation_fraction: 0.2,
            seed: 42,
            models: EnsembleConfig::default(),
            report_file: Some(String::from("readmit_training_report.html")),
        }
    }
}

impl TrainConfig {
    /// Load `config_path` (if given) and apply command line overrides. The
    /// training data path is checked last, after every override.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = TrainConfig::default();

        if let Some(path) = config_path {
            let partial = read_config_json(path)?;
            load_or_default!(partial, config.train_data);
            load_or_default!(partial, config.target_column);
            load_or_default!(partial, config.artifact_dir);
            load_or_default!(partial, config.validation_fraction);
            load_or_default!(partial, config.seed);
            load_or_default!(partial, config.models);
            load_or_default!(partial, config.report_file);
        }

        // Apply CLI overrides
        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        if let Some(artifact_dir) = matches.get_one::<String>("artifact_dir") {
            config.artifact_dir = artifact_dir.clone();
        }
        if let Some(target) = matches.get_one::<String>("target_column") {
            config.target_column = target.clone();
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.seed = *seed;
        }
        if let Some(report) = matches.get_one::<String>("report_file") {
            config.report_file = Some(report.clone());
        }
        if matches.get_flag("no_report") {
            config.report_file = None;
        }

        if !(config.validation_fraction > 0.0 && config.validation_fraction < 1.0) {
            anyhow::bail!(
                "validation_fraction must be between 0 and 1, got {}",
                config.validation_fraction
            );
        }
        validate_tsv_or_csv_file(&config.train_data)?;

        Ok(config)
    }
}
