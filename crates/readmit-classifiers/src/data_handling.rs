//! Labelled feature matrices and the train/validation split.
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{ReadmitError, Result};

/// Preprocessed features with their 0/1 labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f32>,
    pub y: Array1<u8>,
}

impl Dataset {
    pub fn new(x: Array2<f32>, y: Array1<u8>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(ReadmitError::DataValidation(format!(
                "feature matrix has {} rows but there are {} labels",
                x.nrows(),
                y.len()
            )));
        }
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// `(negatives, positives)`
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.y.iter().filter(|&&v| v == 1).count();
        (self.y.len() - positives, positives)
    }

    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }

    pub fn log_input_data_summary(&self) {
        let (negatives, positives) = self.class_counts();
        log::info!("----- Input Data Summary -----");
        log::info!(
            "{} readmitted and {} not readmitted patients",
            positives,
            negatives
        );
        log::info!("{} feature columns", self.x.ncols());
        log::info!("------------------------------");
    }

    /// Split into `(train, validation)` with `validation_fraction` of the rows
    /// held out, preserving the class ratio when both classes have at least two
    /// rows. Falls back to a plain shuffled split otherwise.
    pub fn train_validation_split(
        &self,
        validation_fraction: f64,
        seed: u64,
    ) -> Result<(Dataset, Dataset)> {
        if !(0.0..1.0).contains(&validation_fraction) || validation_fraction == 0.0 {
            return Err(ReadmitError::DataValidation(format!(
                "validation fraction must be in (0, 1), got {}",
                validation_fraction
            )));
        }
        let n = self.len();
        if n < 2 {
            return Err(ReadmitError::DataValidation(format!(
                "need at least 2 rows to split into train and validation, got {}",
                n
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let n_val = ((n as f64) * validation_fraction - 1e-9)
            .ceil()
            .clamp(1.0, (n - 1) as f64) as usize;

        let mut negatives: Vec<usize> = (0..n).filter(|&i| self.y[i] == 0).collect();
        let mut positives: Vec<usize> = (0..n).filter(|&i| self.y[i] == 1).collect();

        let (mut train_idx, mut val_idx) = if negatives.len() >= 2 && positives.len() >= 2 {
            negatives.shuffle(&mut rng);
            positives.shuffle(&mut rng);
            let val_pos = ((n_val as f64) * positives.len() as f64 / n as f64)
                .round()
                .clamp(1.0, (positives.len() - 1) as f64) as usize;
            let val_neg = (n_val - val_pos.min(n_val)).clamp(1, negatives.len() - 1);

            let mut val = positives[..val_pos].to_vec();
            val.extend_from_slice(&negatives[..val_neg]);
            let mut train = positives[val_pos..].to_vec();
            train.extend_from_slice(&negatives[val_neg..]);
            (train, val)
        } else {
            log::warn!(
                "Too few rows per class for a stratified split; using a shuffled split instead"
            );
            let mut all: Vec<usize> = (0..n).collect();
            all.shuffle(&mut rng);
            let val = all[..n_val].to_vec();
            let train = all[n_val..].to_vec();
            (train, val)
        };

        train_idx.sort_unstable();
        val_idx.sort_unstable();

        Ok((self.select(&train_idx), self.select(&val_idx)))
    }
}
