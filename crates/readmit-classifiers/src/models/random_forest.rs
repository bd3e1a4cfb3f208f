use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ModelType;
use crate::error::{ReadmitError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::{DecisionTree, TreeParams};

/// Bagged CART ensemble (random forest).
///
/// Every tree sees a bootstrap sample of the training rows and draws
/// `floor(sqrt(n_features))` candidate features at each split. Tree `i` is
/// seeded with `seed + i`, so the fitted forest does not depend on how rayon
/// schedules the work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ModelType,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(params: ModelType) -> Self {
        RandomForestClassifier {
            params,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

fn max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

impl ClassifierModel for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[u8]) -> Result<()> {
        let ModelType::BaggedTrees {
            n_estimators,
            max_depth,
            min_samples_split,
            min_samples_leaf,
            seed,
        } = self.params
        else {
            return Err(ReadmitError::Model(format!(
                "expected bagged_trees parameters, got {}",
                self.params.name()
            )));
        };

        let n_samples = x.nrows();
        if n_samples == 0 || n_samples != y.len() {
            return Err(ReadmitError::Model(format!(
                "cannot fit on {} rows with {} labels",
                n_samples,
                y.len()
            )));
        }
        if n_estimators == 0 {
            return Err(ReadmitError::Model(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        let tree_params = TreeParams {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            min_samples_leaf: min_samples_leaf.max(1),
            max_features: max_features(x.ncols()),
        };

        log::debug!(
            "Growing {} trees on {} rows ({} candidate features per split)",
            n_estimators,
            n_samples,
            tree_params.max_features
        );

        let trees: Vec<DecisionTree> = (0..n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(tree_idx as u64));
                let bootstrap: Vec<usize> = (0..n_samples)
                    .map(|_| rng.gen_range(0..n_samples))
                    .collect();
                DecisionTree::fit(x, y, &bootstrap, &tree_params, &mut rng)
            })
            .collect();

        let max_depth_seen = trees.iter().map(DecisionTree::depth).max().unwrap_or(0);
        let total_leaves: usize = trees.iter().map(DecisionTree::n_leaves).sum();
        let total_nodes: usize = trees.iter().map(DecisionTree::n_nodes).sum();
        log::debug!(
            "Grew {} trees: {} nodes, {:.1} leaves per tree, max depth {}",
            trees.len(),
            total_nodes,
            total_leaves as f64 / trees.len() as f64,
            max_depth_seen
        );

        self.trees = trees;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        if !self.is_fitted() {
            return Err(ReadmitError::Model(
                "bagged_trees model has not been fitted".to_string(),
            ));
        }
        if x.ncols() != self.n_features {
            return Err(ReadmitError::Model(format!(
                "bagged_trees model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        let n_trees = self.n_trees() as f32;
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let sum: f32 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                (sum / n_trees).clamp(0.0, 1.0)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "bagged_trees"
    }
}
