//! Column statistics used to fit the imputer and scaler.
use statrs::statistics::{Data, Median, Statistics};

/// Median of the finite values in `values`, or `None` when there are none.
///
/// For an even count the mean of the two middle values is returned.
pub fn nan_median(values: &[f32]) -> Option<f64> {
    let observed: Vec<f64> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect();
    if observed.is_empty() {
        return None;
    }
    Some(Data::new(observed).median())
}

/// Mean and population standard deviation of `values`.
///
/// Returns `None` for an empty slice.
pub fn mean_std(values: &[f32]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let values: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    let mean = values.iter().mean();
    let std = values.iter().population_std_dev();
    Some((mean, std))
}
