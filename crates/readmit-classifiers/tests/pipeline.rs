use std::fs;
use std::path::Path;

use readmit_classifiers::artifacts::{ArtifactBundle, ArtifactPaths};
use readmit_classifiers::config::{EnsembleConfig, ModelType};
use readmit_classifiers::data_handling::Dataset;
use readmit_classifiers::error::ReadmitError;
use readmit_classifiers::inference::{InferenceService, PatientRecord};
use readmit_classifiers::io::{read_table, Table};
use readmit_classifiers::preprocessing::{fit_transform, FeatureFrame, TARGET_COLUMN};
use readmit_classifiers::trainer::train;

fn small_config() -> EnsembleConfig {
    EnsembleConfig {
        bagged: ModelType::BaggedTrees {
            n_estimators: 20,
            max_depth: Some(5),
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        },
        boosted: ModelType::BoostedTrees {
            learning_rate: 0.1,
            max_depth: 3,
            num_boost_round: 20,
            min_leaf_size: 1,
            debug: false,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        },
    }
}

/// Synthetic cohort where risk rises with age and prior admissions.
fn write_cohort(path: &Path, header: &str, column_order: [usize; 3]) {
    let mut csv = format!("patient_id,{},readmitted\n", header);
    for i in 0..60 {
        let age = 30 + (i * 7) % 55;
        let bmi = if i % 9 == 0 {
            String::new()
        } else {
            format!("{:.1}", 19.0 + (i % 13) as f64)
        };
        let admissions = (i * 3) % 6;
        let readmitted = (age > 60 || admissions >= 4) as u8;
        let fields = [age.to_string(), bmi, admissions.to_string()];
        let ordered: Vec<&str> = column_order.iter().map(|&c| fields[c].as_str()).collect();
        csv.push_str(&format!("P{:03},{},{}\n", i, ordered.join(","), readmitted));
    }
    fs::write(path, csv).unwrap();
}

fn train_into(dir: &Path, data: &Path) -> ArtifactPaths {
    let table = read_table(data).unwrap();
    let pre = fit_transform(&table, TARGET_COLUMN).unwrap();
    let dataset = Dataset::new(pre.features.values.clone(), pre.labels.clone()).unwrap();
    let (train_split, val_split) = dataset.train_validation_split(0.2, 42).unwrap();
    let outcome = train(
        &small_config(),
        &train_split.x,
        train_split.y.as_slice().unwrap(),
        &val_split.x,
        val_split.y.as_slice().unwrap(),
    )
    .unwrap();

    let paths = ArtifactPaths::in_dir(dir);
    ArtifactBundle {
        bagged_trees: outcome.bagged_trees,
        boosted_trees: outcome.boosted_trees,
        imputer: pre.imputer,
        scaler: pre.scaler,
    }
    .save(&paths)
    .unwrap();
    paths
}

#[test]
fn worked_example_imputes_median_and_standardizes() {
    let table = Table::from_rows(
        ["age", "bmi", "readmitted"],
        vec![
            vec!["40", "22", "0"],
            vec!["60", "30", "1"],
            vec!["NaN", "28", "0"],
        ],
    )
    .unwrap();
    let pre = fit_transform(&table, TARGET_COLUMN).unwrap();

    assert_eq!(pre.imputer.medians, vec![50.0, 28.0]);
    assert_eq!(pre.labels.to_vec(), vec![0, 1, 0]);
    assert_eq!(pre.features.missing_count(), 0);
    for c in 0..2 {
        let column = pre.features.values.column(c);
        let mean = column.sum() / 3.0;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / 3.0;
        assert!(mean.abs() < 1e-5, "column {c} mean {mean}");
        assert!((var.sqrt() - 1.0).abs() < 1e-4, "column {c} std {}", var.sqrt());
    }
    // The imputed age equals the median, which is also the mean here.
    assert!(pre.features.values[[2, 0]].abs() < 1e-6);
}

#[test]
fn fitted_transforms_are_reusable_and_deterministic() {
    let table = Table::from_rows(
        ["patient_id", "age", "bmi", "readmitted"],
        vec![
            vec!["a", "70", "", "1"],
            vec!["b", "35", "24.5", "0"],
            vec!["c", "", "31", "1"],
            vec!["d", "52", "27", "0"],
        ],
    )
    .unwrap();
    let pre = fit_transform(&table, TARGET_COLUMN).unwrap();
    assert_eq!(pre.features.columns, vec!["age".to_string(), "bmi".to_string()]);

    let raw = FeatureFrame::from_table(&table, &["patient_id", TARGET_COLUMN]).unwrap();
    let once = pre.scaler.transform(&pre.imputer.transform(&raw).unwrap()).unwrap();
    let twice = pre.scaler.transform(&pre.imputer.transform(&raw).unwrap()).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once, pre.features);
}

#[test]
fn empty_and_all_missing_tables_are_rejected() {
    let empty = Table::from_rows(["age", "readmitted"], Vec::<Vec<&str>>::new()).unwrap();
    assert!(matches!(
        fit_transform(&empty, TARGET_COLUMN),
        Err(ReadmitError::EmptyDataset(_))
    ));

    let all_missing =
        Table::from_rows(["age", "readmitted"], vec![vec!["", "0"], vec!["NA", "1"]]).unwrap();
    assert!(matches!(
        fit_transform(&all_missing, TARGET_COLUMN),
        Err(ReadmitError::DataValidation(_))
    ));
}

#[test]
fn end_to_end_scores_are_deterministic_averages() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("train.csv");
    write_cohort(&data, "age,bmi,num_prior_admissions", [0, 1, 2]);
    let paths = train_into(&dir.path().join("models"), &data);
    assert!(paths.missing().is_empty());

    let service = InferenceService::load(&paths);
    assert!(service.is_ready());

    let record = PatientRecord {
        age: 45.0,
        bmi: 25.0,
        num_prior_admissions: 0,
    };
    let first = service.predict(&record).unwrap();
    let second = service.predict(&record).unwrap();
    assert_eq!(first, second);

    assert!(first.readmission_score > 0.0 && first.readmission_score < 1.0);
    assert!((0.0..=1.0).contains(&first.bagged_probability));
    assert!((0.0..=1.0).contains(&first.boosted_probability));
    let mean = (first.bagged_probability + first.boosted_probability) / 2.0;
    assert!((first.readmission_score - mean).abs() < 1e-12);
}

#[test]
fn artifacts_with_other_column_order_are_a_schema_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("train.csv");
    write_cohort(&data, "bmi,age,num_prior_admissions", [1, 0, 2]);
    let paths = train_into(&dir.path().join("models"), &data);

    let service = InferenceService::load(&paths);
    assert!(service.is_ready());
    let err = service
        .predict(&PatientRecord {
            age: 45.0,
            bmi: 25.0,
            num_prior_admissions: 0,
        })
        .unwrap_err();
    assert!(matches!(err, ReadmitError::SchemaMismatch { .. }));
}

#[test]
fn partially_missing_artifacts_leave_service_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("train.csv");
    write_cohort(&data, "age,bmi,num_prior_admissions", [0, 1, 2]);
    let paths = train_into(&dir.path().join("models"), &data);
    fs::remove_file(&paths.scaler).unwrap();

    let service = InferenceService::load(&paths);
    assert!(!service.is_ready());
    let err = service
        .predict(&PatientRecord {
            age: 45.0,
            bmi: 25.0,
            num_prior_admissions: 0,
        })
        .unwrap_err();
    assert!(matches!(err, ReadmitError::ModelsNotLoaded(_)));
}

#[test]
fn request_without_bmi_fails_validation() {
    let err = PatientRecord::from_json(&serde_json::json!({
        "age": 45,
        "num_prior_admissions": 0
    }))
    .unwrap_err();
    match err {
        ReadmitError::RequestValidation { field, .. } => assert_eq!(field, "bmi"),
        other => panic!("unexpected error {other:?}"),
    }
}
