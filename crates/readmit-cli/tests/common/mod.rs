#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, Command};
use serde_json::json;

use readmit_cli::train::input::TrainConfig;
use readmit_cli::train::trainer::run_training;

/// Synthetic cohort where risk rises with age and prior admissions. Every
/// ninth BMI is left blank so the imputer has work to do.
pub fn write_cohort(path: &Path) {
    let mut csv = String::from("patient_id,age,bmi,num_prior_admissions,readmitted\n");
    for i in 0..60 {
        let age = 30 + (i * 7) % 55;
        let bmi = if i % 9 == 0 {
            String::new()
        } else {
            format!("{:.1}", 19.0 + (i % 13) as f64)
        };
        let admissions = (i * 3) % 6;
        let readmitted = (age > 60 || admissions >= 4) as u8;
        csv.push_str(&format!(
            "P{:03},{},{},{},{}\n",
            i, age, bmi, admissions, readmitted
        ));
    }
    fs::write(path, csv).unwrap();
}

/// Training config with small ensembles so tests stay fast.
pub fn write_config(path: &Path, train_data: &Path, artifact_dir: &Path) {
    let config = json!({
        "train_data": train_data.to_str().unwrap(),
        "artifact_dir": artifact_dir.to_str().unwrap(),
        "models": {
            "bagged": {
                "kind": "bagged_trees",
                "n_estimators": 15,
                "max_depth": 5,
                "min_samples_split": 2,
                "min_samples_leaf": 1,
                "seed": 42
            },
            "boosted": {
                "kind": "boosted_trees",
                "learning_rate": 0.1,
                "max_depth": 3,
                "num_boost_round": 15,
                "min_leaf_size": 1,
                "debug": false,
                "training_optimization_level": 2,
                "loss_type": "LogLikelyhood"
            }
        },
        "report_file": null
    });
    fs::write(path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
}

/// Write a cohort and config into `dir`; returns (config path, artifact dir).
pub fn prepare_training(dir: &Path) -> (PathBuf, PathBuf) {
    let data = dir.join("train.csv");
    let artifact_dir = dir.join("models");
    let config = dir.join("train_config.json");
    write_cohort(&data);
    write_config(&config, &data, &artifact_dir);
    (config, artifact_dir)
}

/// The `train` arguments `TrainConfig::from_arguments` reads, none given.
pub fn empty_train_matches() -> clap::ArgMatches {
    Command::new("train")
        .arg(Arg::new("train_data").long("train-data"))
        .arg(Arg::new("artifact_dir").long("artifact-dir"))
        .arg(Arg::new("target_column").long("target"))
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(Arg::new("report_file").long("report"))
        .arg(Arg::new("no_report").long("no-report").action(ArgAction::SetTrue))
        .try_get_matches_from(["train"])
        .unwrap()
}

/// Run a full training into `dir` and return the artifact directory.
pub fn train_artifacts(dir: &Path) -> PathBuf {
    let (config_path, artifact_dir) = prepare_training(dir);
    let config = TrainConfig::from_arguments(Some(&config_path), &empty_train_matches()).unwrap();
    run_training(&config).unwrap();
    artifact_dir
}
