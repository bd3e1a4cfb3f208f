//! CART classification tree used as the base learner of the bagged ensemble.
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

/// Tree node stored in a flat arena; children are indices into `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        /// Fraction of positive samples that reached this leaf.
        probability: f32,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of candidate features drawn at every split.
    pub max_features: usize,
}

/// Binary classification tree grown with Gini impurity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Candidate {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` named by `indices` (duplicates allowed,
    /// as produced by bootstrap sampling).
    pub fn fit(
        x: &Array2<f32>,
        y: &[u8],
        indices: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = DecisionTree { nodes: Vec::new() };
        tree.grow(x, y, indices.to_vec(), 0, params, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &Array2<f32>,
        y: &[u8],
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> usize {
        let n = indices.len();
        let positives = indices.iter().filter(|&&i| y[i] == 1).count();
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            probability: if n == 0 { 0.0 } else { positives as f32 / n as f32 },
            n_samples: n,
        });

        let should_stop = n < params.min_samples_split
            || n < 2 * params.min_samples_leaf
            || params.max_depth.map_or(false, |d| depth >= d)
            || positives == 0
            || positives == n;
        if should_stop {
            return node_id;
        }

        let parent_impurity = gini(positives, n);
        let Some(best) = best_split(x, y, &indices, parent_impurity, params, rng) else {
            return node_id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, best.feature]] <= best.threshold);

        let left = self.grow(x, y, left_idx, depth + 1, params, rng);
        let right = self.grow(x, y, right_idx, depth + 1, params, rng);
        self.nodes[node_id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_id
    }

    /// Positive-class probability for a single feature row.
    pub fn predict_row(&self, row: ArrayView1<f32>) -> f32 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { probability, .. } => return *probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

/// Sweep sorted values of a random feature subset and return the threshold
/// with the lowest weighted child impurity, if it improves on the parent.
fn best_split(
    x: &Array2<f32>,
    y: &[u8],
    indices: &[usize],
    parent_impurity: f64,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<Candidate> {
    let n_features = x.ncols();
    let n_try = params.max_features.clamp(1, n_features);
    let features = sample(rng, n_features, n_try).into_vec();

    let n = indices.len();
    let total_pos = indices.iter().filter(|&&i| y[i] == 1).count();
    let mut best: Option<Candidate> = None;

    for feature in features {
        let mut order: Vec<(f32, u8)> = indices.iter().map(|&i| (x[[i, feature]], y[i])).collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_pos = 0usize;
        for split in 1..n {
            left_pos += order[split - 1].1 as usize;
            let (lo, hi) = (order[split - 1].0, order[split].0);
            if lo == hi {
                continue;
            }
            let left_n = split;
            let right_n = n - split;
            if left_n < params.min_samples_leaf || right_n < params.min_samples_leaf {
                continue;
            }
            let impurity = (left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(total_pos - left_pos, right_n))
                / n as f64;
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = lo + (hi - lo) / 2.0;
                // Midpoint can round up to `hi` for adjacent floats.
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(Candidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }

    best.filter(|b| b.impurity < parent_impurity - 1e-12)
}
