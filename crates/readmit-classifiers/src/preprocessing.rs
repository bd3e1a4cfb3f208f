//! Median imputation and standard scaling bound to a feature schema.
//!
//! Both transforms are fitted once on the training table and must then be
//! applied unchanged to every inference input. Each one carries the ordered
//! [`FeatureSchema`] it was fitted on and refuses input whose columns differ
//! in name or order.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ReadmitError, Result};
use crate::io::Table;
use crate::stats::{mean_std, nan_median};

/// Identifier column dropped before training when present.
pub const ID_COLUMN: &str = "patient_id";
/// Default binary label column.
pub const TARGET_COLUMN: &str = "readmitted";

const MISSING_TOKENS: [&str; 5] = ["na", "nan", "null", "none", "?"];

/// Ordered list of feature column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Fail unless `columns` matches this schema exactly, order included.
    pub fn validate(&self, columns: &[String]) -> Result<()> {
        if self.columns.as_slice() != columns {
            return Err(ReadmitError::SchemaMismatch {
                expected: self.columns.clone(),
                actual: columns.to_vec(),
            });
        }
        Ok(())
    }
}

/// Numeric feature matrix with named columns. Missing values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    pub columns: Vec<String>,
    pub values: Array2<f32>,
}

impl FeatureFrame {
    pub fn new(columns: Vec<String>, values: Array2<f32>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(ReadmitError::DataValidation(format!(
                "{} column names for a matrix with {} columns",
                columns.len(),
                values.ncols()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Parse every column of `table` except `excluded` as numbers.
    pub fn from_table(table: &Table, excluded: &[&str]) -> Result<Self> {
        let indices: Vec<usize> = table
            .headers()
            .iter()
            .enumerate()
            .filter(|(_, h)| !excluded.contains(&h.as_str()))
            .map(|(i, _)| i)
            .collect();
        let columns: Vec<String> = indices.iter().map(|&i| table.headers()[i].clone()).collect();

        let mut data = Vec::with_capacity(table.nrows() * indices.len());
        for (row_idx, row) in table.rows().iter().enumerate() {
            for &col in &indices {
                let value = parse_cell(&row[col]).ok_or_else(|| {
                    ReadmitError::DataValidation(format!(
                        "non-numeric value '{}' in column '{}' at row {}",
                        row[col],
                        table.headers()[col],
                        row_idx + 1
                    ))
                })?;
                data.push(value);
            }
        }

        let values = Array2::from_shape_vec((table.nrows(), indices.len()), data)
            .map_err(|e| ReadmitError::DataValidation(e.to_string()))?;
        Self::new(columns, values)
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

/// Parse one cell. Missing markers become `NaN`; anything else that is not a
/// number yields `None`.
fn parse_cell(cell: &str) -> Option<f32> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Some(f32::NAN);
    }
    trimmed.parse::<f32>().ok().filter(|v| !v.is_infinite())
}

fn parse_label(cell: &str) -> Option<u8> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "0" | "0.0" | "false" => Some(0),
        "1" | "1.0" | "true" => Some(1),
        _ => None,
    }
}

/// Per-column median imputer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    pub schema: FeatureSchema,
    pub medians: Vec<f32>,
}

impl MedianImputer {
    /// Learn the median of every column from the non-missing values.
    pub fn fit(frame: &FeatureFrame) -> Result<Self> {
        if frame.nrows() == 0 {
            return Err(ReadmitError::EmptyDataset(
                "cannot fit an imputer on zero rows".to_string(),
            ));
        }
        let mut medians = Vec::with_capacity(frame.columns.len());
        for (c, name) in frame.columns.iter().enumerate() {
            let column = frame.values.column(c).to_vec();
            let median = nan_median(&column).ok_or_else(|| {
                ReadmitError::DataValidation(format!(
                    "column '{}' has no observed values; its median is undefined",
                    name
                ))
            })?;
            medians.push(median as f32);
        }
        Ok(Self {
            schema: FeatureSchema::new(frame.columns.clone()),
            medians,
        })
    }

    /// Replace missing values with the fitted medians.
    pub fn transform(&self, frame: &FeatureFrame) -> Result<FeatureFrame> {
        self.schema.validate(&frame.columns)?;
        let mut values = frame.values.clone();
        for mut row in values.axis_iter_mut(Axis(0)) {
            for (v, &median) in row.iter_mut().zip(self.medians.iter()) {
                if v.is_nan() {
                    *v = median;
                }
            }
        }
        FeatureFrame::new(frame.columns.clone(), values)
    }
}

/// Standardizes each schema column with the mean and population standard
/// deviation learned at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub schema: FeatureSchema,
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl StandardScaler {
    /// Standard deviations below this are treated as a constant column.
    const MIN_STD: f64 = 1e-6;

    /// Fit on an imputed frame. Constant columns get a scale of 1.
    pub fn fit(frame: &FeatureFrame) -> Result<Self> {
        if frame.nrows() == 0 {
            return Err(ReadmitError::EmptyDataset(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }
        if frame.missing_count() > 0 {
            return Err(ReadmitError::DataValidation(
                "scaler input still contains missing values; impute first".to_string(),
            ));
        }
        let mut mean = Vec::with_capacity(frame.columns.len());
        let mut std = Vec::with_capacity(frame.columns.len());
        for c in 0..frame.columns.len() {
            let column = frame.values.column(c).to_vec();
            let (m, s) = mean_std(&column).unwrap_or((0.0, 1.0));
            mean.push(m as f32);
            std.push(if s < Self::MIN_STD { 1.0 } else { s as f32 });
        }
        Ok(Self {
            schema: FeatureSchema::new(frame.columns.clone()),
            mean,
            std,
        })
    }

    pub fn transform(&self, frame: &FeatureFrame) -> Result<FeatureFrame> {
        self.schema.validate(&frame.columns)?;
        let mut values = frame.values.clone();
        for mut row in values.axis_iter_mut(Axis(0)) {
            for ((v, mean), std) in row.iter_mut().zip(&self.mean).zip(&self.std) {
                *v = (*v - mean) / std;
            }
        }
        FeatureFrame::new(frame.columns.clone(), values)
    }
}

/// Output of [`fit_transform`].
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub features: FeatureFrame,
    pub labels: Array1<u8>,
    pub imputer: MedianImputer,
    pub scaler: StandardScaler,
}

/// Fit the imputer and scaler on `table` and return the transformed features
/// together with the 0/1 labels from `target_column`.
///
/// The [`ID_COLUMN`] is dropped when present.
pub fn fit_transform(table: &Table, target_column: &str) -> Result<Preprocessed> {
    if table.is_empty() {
        return Err(ReadmitError::EmptyDataset(
            "training table has no rows".to_string(),
        ));
    }

    let label_cells = table.column(target_column).ok_or_else(|| {
        ReadmitError::DataValidation(format!("missing label column '{}'", target_column))
    })?;
    let labels = label_cells
        .iter()
        .enumerate()
        .map(|(row_idx, cell)| {
            parse_label(cell).ok_or_else(|| {
                ReadmitError::DataValidation(format!(
                    "label '{}' at row {} is not 0 or 1",
                    cell,
                    row_idx + 1
                ))
            })
        })
        .collect::<Result<Vec<u8>>>()?;

    let raw = FeatureFrame::from_table(table, &[ID_COLUMN, target_column])?;
    if raw.columns.is_empty() {
        return Err(ReadmitError::DataValidation(
            "no feature columns left after removing the label and identifier".to_string(),
        ));
    }

    let imputer = MedianImputer::fit(&raw)?;
    let imputed = imputer.transform(&raw)?;
    let scaler = StandardScaler::fit(&imputed)?;
    let features = scaler.transform(&imputed)?;

    log::debug!(
        "Fitted preprocessing on {} rows; imputed {} missing values across {} features",
        raw.nrows(),
        raw.missing_count(),
        raw.columns.len()
    );

    Ok(Preprocessed {
        features,
        labels: Array1::from_vec(labels),
        imputer,
        scaler,
    })
}
