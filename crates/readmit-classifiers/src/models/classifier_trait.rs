use ndarray::Array2;

use crate::error::Result;

/// Binary classifier contract shared by both ensemble members.
///
/// Labels use 0 (not readmitted) and 1 (readmitted). A fitted model is only
/// read afterwards, so prediction takes `&self`.
pub trait ClassifierModel {
    fn fit(&mut self, x: &Array2<f32>, y: &[u8]) -> Result<()>;

    /// Probability of the positive class for each row, in [0, 1].
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>>;

    /// Hard 0/1 predictions; ties at 0.5 go to the negative class.
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| (p > 0.5) as u8)
            .collect())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
