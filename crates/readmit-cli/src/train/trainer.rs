use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use maud::{html, Markup};

use readmit_classifiers::artifacts::{ArtifactBundle, ArtifactPaths};
use readmit_classifiers::data_handling::Dataset;
use readmit_classifiers::inference::PatientRecord;
use readmit_classifiers::io::read_table;
use readmit_classifiers::metrics::ClassificationReport;
use readmit_classifiers::preprocessing::fit_transform;
use readmit_classifiers::report::plots::{plot_f1_comparison, plot_score_histogram};
use readmit_classifiers::report::{Report, ReportSection};
use readmit_classifiers::trainer::{train, ModelEvaluation};

use crate::train::input::TrainConfig;

/// What a finished training run produced.
#[derive(Debug)]
pub struct TrainingSummary {
    pub artifacts: ArtifactPaths,
    pub feature_columns: Vec<String>,
    pub reports: Vec<(String, ClassificationReport)>,
    pub report_file: Option<PathBuf>,
}

pub fn run_training(config: &TrainConfig) -> Result<TrainingSummary> {
    let start_time = Instant::now();

    let table = read_table(&config.train_data)
        .with_context(|| format!("Failed to load training data from {}", config.train_data))?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.nrows(),
        table.ncols(),
        config.train_data
    );

    let preprocessed = fit_transform(&table, &config.target_column)
        .context("Preprocessing failed: could not fit the imputer and scaler")?;
    let feature_columns = preprocessed.imputer.schema.columns().to_vec();
    if feature_columns != PatientRecord::COLUMNS {
        log::warn!(
            "Training features {:?} differ from the inference record fields {:?}; \
             the service will answer every prediction with a schema mismatch",
            feature_columns,
            PatientRecord::COLUMNS
        );
    }

    let dataset = Dataset::new(
        preprocessed.features.values.clone(),
        preprocessed.labels.clone(),
    )?;
    dataset.log_input_data_summary();
    let (train_split, val_split) = dataset
        .train_validation_split(config.validation_fraction, config.seed)
        .context("Failed to split the training table")?;
    log::info!(
        "Split into {} training and {} validation rows",
        train_split.len(),
        val_split.len()
    );

    let y_train = train_split.y.to_vec();
    let y_val = val_split.y.to_vec();
    let outcome = train(&config.models, &train_split.x, &y_train, &val_split.x, &y_val)
        .with_context(|| "Training failed: an error occurred while fitting the ensembles")?;
    log::info!("Training completed in {:?}", start_time.elapsed());
    let disagreement = outcome.disagreement_rate();

    let artifacts = ArtifactPaths::in_dir(&config.artifact_dir);
    let bundle = ArtifactBundle {
        bagged_trees: outcome.bagged_trees,
        boosted_trees: outcome.boosted_trees,
        imputer: preprocessed.imputer,
        scaler: preprocessed.scaler,
    };
    bundle
        .save(&artifacts)
        .with_context(|| format!("Failed to write artifacts to {}", config.artifact_dir))?;

    let config_path = Path::new(&config.artifact_dir).join("training_config.json");
    fs::write(&config_path, serde_json::to_string_pretty(config)?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let report_file = match &config.report_file {
        Some(path) => {
            let report = build_report(
                config,
                &feature_columns,
                &outcome.evaluations,
                disagreement,
                &y_val,
            )?;
            report
                .save_to_file(path)
                .with_context(|| format!("Failed to write report to {}", path))?;
            log::info!("Training report saved to {}", path);
            Some(PathBuf::from(path))
        }
        None => None,
    };

    Ok(TrainingSummary {
        artifacts,
        feature_columns,
        reports: outcome
            .evaluations
            .iter()
            .map(|e| (e.name.clone(), e.report.clone()))
            .collect(),
        report_file,
    })
}

fn metrics_table(report: &ClassificationReport) -> Markup {
    let rows = [
        ("not readmitted", &report.classes[0]),
        ("readmitted", &report.classes[1]),
        ("macro avg", &report.macro_avg),
        ("weighted avg", &report.weighted_avg),
    ];
    html! {
        p { "Validation accuracy: " strong { (format!("{:.3}", report.accuracy)) } }
        table {
            tr { th { "" } th { "precision" } th { "recall" } th { "f1-score" } th { "support" } }
            @for (name, m) in rows {
                tr {
                    td { (name) }
                    td { (format!("{:.3}", m.precision)) }
                    td { (format!("{:.3}", m.recall)) }
                    td { (format!("{:.3}", m.f1)) }
                    td { (m.support) }
                }
            }
        }
    }
}

fn build_report(
    config: &TrainConfig,
    feature_columns: &[String],
    evaluations: &[ModelEvaluation],
    disagreement: f64,
    y_val: &[u8],
) -> Result<Report> {
    let mut report = Report::new("readmit", &config.version, "Readmission Risk Training Report");

    /* Section 1: Overview */
    {
        let mut overview = ReportSection::new("Overview");
        overview.add_content(html! {
            p {
                "Two tree ensembles were fitted on the training split and scored on a held-out "
                "validation split. The service averages their positive-class probabilities."
            }
            p { "Features: " (feature_columns.join(", ")) }
            p {
                (format!("Models disagree on {:.1}% of validation rows.", disagreement * 100.0))
            }
        });
        let named: Vec<(&str, &ClassificationReport)> = evaluations
            .iter()
            .map(|e| (e.name.as_str(), &e.report))
            .collect();
        overview.add_plot(plot_f1_comparison(&named, "Validation F1 by class"));
        report.add_section(overview);
    }

    /* Section 2: one per model */
    for evaluation in evaluations {
        let mut section = ReportSection::new(&evaluation.name);
        section.add_content(metrics_table(&evaluation.report));
        let plot = plot_score_histogram(
            &evaluation.scores,
            y_val,
            &format!("{} validation scores", evaluation.name),
        )?;
        section.add_plot(plot);
        report.add_section(section);
    }

    /* Section 3: Configuration */
    {
        let config_json = serde_json::to_string_pretty(config)?;
        let mut config_section = ReportSection::new("Configuration");
        config_section.add_content(html! {
            pre {
                code { (config_json) }
            }
        });
        report.add_section(config_section);
    }

    Ok(report)
}
