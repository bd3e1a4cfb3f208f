use serde::{Deserialize, Serialize};

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelType {
    /// Bootstrap-aggregated CART trees (random forest).
    BaggedTrees {
        n_estimators: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
        seed: u64,
    },
    /// Gradient boosted regression trees with a log-likelihood loss.
    BoostedTrees {
        learning_rate: f32,
        max_depth: u32,
        num_boost_round: u32,
        min_leaf_size: usize,
        debug: bool,
        training_optimization_level: u8,
        loss_type: String,
    },
}

impl ModelType {
    pub fn bagged_trees() -> Self {
        ModelType::BaggedTrees {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }

    pub fn boosted_trees() -> Self {
        ModelType::BoostedTrees {
            learning_rate: 0.1,
            max_depth: 6,
            num_boost_round: 200,
            min_leaf_size: 1,
            debug: false,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelType::BaggedTrees { .. } => "bagged_trees",
            ModelType::BoostedTrees { .. } => "boosted_trees",
        }
    }
}

/// The two independently configured members of the scoring ensemble.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnsembleConfig {
    pub bagged: ModelType,
    pub boosted: ModelType,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            bagged: ModelType::bagged_trees(),
            boosted: ModelType::boosted_trees(),
        }
    }
}
