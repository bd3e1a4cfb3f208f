//! Fitting and evaluating both ensemble members.
use std::time::Instant;

use ndarray::Array2;

use crate::config::EnsembleConfig;
use crate::error::{ReadmitError, Result};
use crate::metrics::ClassificationReport;
use crate::models::{build_model, Classifier, ClassifierModel};

/// Validation results for one fitted model.
#[derive(Debug, Clone)]
pub struct ModelEvaluation {
    pub name: String,
    pub report: ClassificationReport,
    /// Positive-class probability for every validation row.
    pub scores: Vec<f32>,
}

/// Both fitted models with their validation results.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub bagged_trees: Classifier,
    pub boosted_trees: Classifier,
    pub evaluations: Vec<ModelEvaluation>,
}

impl TrainingOutcome {
    /// Fraction of validation rows where the two models' hard predictions
    /// differ.
    pub fn disagreement_rate(&self) -> f64 {
        let [a, b] = match self.evaluations.as_slice() {
            [a, b] => [a, b],
            _ => return 0.0,
        };
        if a.scores.is_empty() {
            return 0.0;
        }
        let differ = a
            .scores
            .iter()
            .zip(&b.scores)
            .filter(|(x, y)| (**x > 0.5) != (**y > 0.5))
            .count();
        differ as f64 / a.scores.len() as f64
    }
}

fn evaluate(model: &Classifier, x_val: &Array2<f32>, y_val: &[u8]) -> Result<ModelEvaluation> {
    let scores = model.predict_proba(x_val)?;
    let predicted: Vec<u8> = scores.iter().map(|&p| (p > 0.5) as u8).collect();
    let report = ClassificationReport::from_predictions(y_val, &predicted);
    log::info!(
        "{} validation accuracy: {:.4}\n{}",
        model.name(),
        report.accuracy,
        report
    );
    Ok(ModelEvaluation {
        name: model.name().to_string(),
        report,
        scores,
    })
}

/// Fit the bagged and boosted ensembles on the training split only, then
/// score both on the validation split. Metrics are diagnostic; nothing here
/// rejects a poorly performing model.
pub fn train(
    config: &EnsembleConfig,
    x_train: &Array2<f32>,
    y_train: &[u8],
    x_val: &Array2<f32>,
    y_val: &[u8],
) -> Result<TrainingOutcome> {
    if x_train.nrows() != y_train.len() || x_val.nrows() != y_val.len() {
        return Err(ReadmitError::DataValidation(
            "feature and label row counts differ".to_string(),
        ));
    }
    if x_train.nrows() == 0 {
        return Err(ReadmitError::EmptyDataset(
            "training split has no rows".to_string(),
        ));
    }
    let positives = y_train.iter().filter(|&&v| v == 1).count();
    if positives == 0 || positives == y_train.len() {
        return Err(ReadmitError::DataValidation(
            "training split contains a single class; both readmitted and not readmitted rows are required"
                .to_string(),
        ));
    }

    let mut bagged = build_model(&config.bagged);
    let mut boosted = build_model(&config.boosted);

    let mut evaluations = Vec::with_capacity(2);
    for model in [&mut bagged, &mut boosted] {
        let start = Instant::now();
        log::info!("Training {} on {} rows", model.name(), x_train.nrows());
        model.fit(x_train, y_train)?;
        log::info!("{} trained in {:?}", model.name(), start.elapsed());

        if x_val.nrows() > 0 {
            evaluations.push(evaluate(model, x_val, y_val)?);
        }
    }

    let outcome = TrainingOutcome {
        bagged_trees: bagged,
        boosted_trees: boosted,
        evaluations,
    };
    if outcome.evaluations.len() == 2 {
        let rate = outcome.disagreement_rate();
        if rate > 0.25 {
            log::warn!(
                "Models disagree on {:.1}% of validation rows",
                rate * 100.0
            );
        } else {
            log::info!("Models disagree on {:.1}% of validation rows", rate * 100.0);
        }
    }
    Ok(outcome)
}
