use ::gbdt::config::Config;
use ::gbdt::decision_tree::{Data, DataVec};
use ::gbdt::gradient_boost::GBDT;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::ModelType;
use crate::error::{ReadmitError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// Gradient Boosting Decision Tree (GBDT) classifier
#[derive(Serialize, Deserialize)]
pub struct GbdtClassifier {
    model: Option<GBDT>,
    params: ModelType,
    n_features: usize,
}

impl GbdtClassifier {
    pub fn new(params: ModelType) -> Self {
        GbdtClassifier {
            model: None,
            params,
            n_features: 0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn to_test_data(x: &Array2<f32>) -> DataVec {
        x.rows()
            .into_iter()
            .map(|row| Data::new_test_data(row.to_vec(), None))
            .collect()
    }
}

impl std::fmt::Debug for GbdtClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GbdtClassifier")
            .field("params", &self.params)
            .field("fitted", &self.is_fitted())
            .field("n_features", &self.n_features)
            .finish()
    }
}

impl ClassifierModel for GbdtClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[u8]) -> Result<()> {
        let feature_size = x.ncols();

        let ModelType::BoostedTrees {
            learning_rate,
            max_depth,
            num_boost_round,
            min_leaf_size,
            debug,
            training_optimization_level,
            loss_type,
        } = &self.params
        else {
            return Err(ReadmitError::Model(format!(
                "expected boosted_trees parameters, got {}",
                self.params.name()
            )));
        };

        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(ReadmitError::Model(format!(
                "cannot fit on {} rows with {} labels",
                x.nrows(),
                y.len()
            )));
        }
        // The log-likelihood initial guess is infinite for a single class.
        let positives = y.iter().filter(|&&v| v == 1).count();
        if positives == 0 || positives == y.len() {
            return Err(ReadmitError::Model(
                "boosted_trees needs both classes in the training labels".to_string(),
            ));
        }

        let mut config = Config::new();
        config.set_feature_size(feature_size);
        config.set_shrinkage(*learning_rate);
        config.set_max_depth(*max_depth);
        config.set_iterations(*num_boost_round as usize);
        config.set_min_leaf_size(*min_leaf_size);
        config.set_debug(*debug);
        config.set_training_optimization_level(*training_optimization_level);
        config.set_loss(loss_type);

        let mut gbdt = GBDT::new(&config);

        // LogLikelyhood expects labels in {-1, 1}.
        let mut train_x: DataVec = x
            .rows()
            .into_iter()
            .zip(y)
            .map(|(row, &label)| {
                let target = if label == 1 { 1.0 } else { -1.0 };
                Data::new_training_data(row.to_vec(), 1.0, target, None)
            })
            .collect();

        log::debug!(
            "Boosting {} rounds (depth {}, shrinkage {}) on {} rows",
            num_boost_round,
            max_depth,
            learning_rate,
            train_x.len()
        );
        gbdt.fit(&mut train_x);

        self.model = Some(gbdt);
        self.n_features = feature_size;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let model = self.model.as_ref().ok_or_else(|| {
            ReadmitError::Model("boosted_trees model has not been fitted".to_string())
        })?;
        if x.ncols() != self.n_features {
            return Err(ReadmitError::Model(format!(
                "boosted_trees model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        let test_x = Self::to_test_data(x);
        let predictions = model.predict(&test_x);
        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(ReadmitError::Model(
                "boosted_trees produced a non-finite probability".to_string(),
            ));
        }
        Ok(predictions.into_iter().map(|p| p.clamp(0.0, 1.0)).collect())
    }

    fn name(&self) -> &str {
        "boosted_trees"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelType {
        ModelType::BoostedTrees {
            learning_rate: 0.1,
            max_depth: 3,
            num_boost_round: 20,
            min_leaf_size: 1,
            debug: false,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        }
    }

    #[test]
    fn test_gbdt_classifier() {
        // Label follows the sign of the second feature.
        let x = Array2::from_shape_vec(
            (10, 3),
            vec![
                0.1, 1.0, 5.0, 0.4, -1.0, 5.0, 0.6, 1.0, 5.0, 0.9, -1.0, 5.0, 1.2, 1.0, 5.0, 1.5,
                -1.0, 5.0, 1.8, 1.0, 5.0, 2.1, -1.0, 5.0, 2.4, 1.0, 5.0, 2.7, -1.0, 5.0,
            ],
        )
        .unwrap();
        let y = vec![1u8, 0, 1, 0, 1, 0, 1, 0, 1, 0];

        let mut classifier = GbdtClassifier::new(params());
        classifier.fit(&x, &y).unwrap();

        let proba = classifier.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), y.len());
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        for (p, label) in proba.iter().zip(&y) {
            if *label == 1 {
                assert!(*p > 0.5, "expected positive, got {p}");
            } else {
                assert!(*p < 0.5, "expected negative, got {p}");
            }
        }
    }

    #[test]
    fn rejects_single_class() {
        let x = Array2::from_shape_vec((3, 1), vec![1.0, 2.0, 3.0]).unwrap();
        let mut classifier = GbdtClassifier::new(params());
        assert!(classifier.fit(&x, &[1, 1, 1]).is_err());
    }

    #[test]
    fn wrong_params_variant() {
        let x = Array2::from_shape_vec((2, 1), vec![1.0, 2.0]).unwrap();
        let mut classifier = GbdtClassifier::new(ModelType::bagged_trees());
        assert!(matches!(
            classifier.fit(&x, &[0, 1]),
            Err(ReadmitError::Model(_))
        ));
    }
}
