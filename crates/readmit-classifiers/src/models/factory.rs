use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::ModelType;
use crate::error::Result;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::gbdt::GbdtClassifier;
use crate::models::random_forest::RandomForestClassifier;

/// Either ensemble member, as persisted in a model artifact.
///
/// A closed enum rather than a trait object so the fitted model can be
/// written to and read back from JSON.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum Classifier {
    BaggedTrees(RandomForestClassifier),
    BoostedTrees(GbdtClassifier),
}

/// Build an unfitted classifier from its hyper-parameters.
pub fn build_model(params: &ModelType) -> Classifier {
    match params {
        ModelType::BaggedTrees { .. } => {
            Classifier::BaggedTrees(RandomForestClassifier::new(params.clone()))
        }
        ModelType::BoostedTrees { .. } => {
            Classifier::BoostedTrees(GbdtClassifier::new(params.clone()))
        }
    }
}

impl Classifier {
    pub fn is_fitted(&self) -> bool {
        match self {
            Classifier::BaggedTrees(m) => m.is_fitted(),
            Classifier::BoostedTrees(m) => m.is_fitted(),
        }
    }
}

impl ClassifierModel for Classifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[u8]) -> Result<()> {
        match self {
            Classifier::BaggedTrees(m) => m.fit(x, y),
            Classifier::BoostedTrees(m) => m.fit(x, y),
        }
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        match self {
            Classifier::BaggedTrees(m) => m.predict_proba(x),
            Classifier::BoostedTrees(m) => m.predict_proba(x),
        }
    }

    fn name(&self) -> &str {
        match self {
            Classifier::BaggedTrees(m) => m.name(),
            Classifier::BoostedTrees(m) => m.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_matches_model_type() {
        let bagged = build_model(&ModelType::bagged_trees());
        assert_eq!(bagged.name(), "bagged_trees");
        assert!(!bagged.is_fitted());
        let boosted = build_model(&ModelType::boosted_trees());
        assert_eq!(boosted.name(), "boosted_trees");
    }
}
