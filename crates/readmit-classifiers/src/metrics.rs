//! Validation metrics for binary classifiers.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Accuracy plus a per-class breakdown with macro and weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// Indexed by class label: `[not readmitted, readmitted]`.
    pub classes: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Compare hard 0/1 predictions against the true labels. Undefined
    /// ratios (no predicted or no true members of a class) are reported as 0.
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        debug_assert_eq!(y_true.len(), y_pred.len());
        let total = y_true.len();
        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();

        let mut classes = [ClassMetrics::default(); 2];
        for (label, metrics) in classes.iter_mut().enumerate() {
            let label = label as u8;
            let tp = y_true
                .iter()
                .zip(y_pred)
                .filter(|&(&t, &p)| t == label && p == label)
                .count();
            let predicted = y_pred.iter().filter(|&&p| p == label).count();
            let support = y_true.iter().filter(|&&t| t == label).count();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            *metrics = ClassMetrics {
                precision,
                recall,
                f1,
                support,
            };
        }

        let macro_avg = ClassMetrics {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1: (classes[0].f1 + classes[1].f1) / 2.0,
            support: total,
        };
        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| f(c) * c.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|c: &ClassMetrics| c.precision),
            recall: weight(|c: &ClassMetrics| c.recall),
            f1: weight(|c: &ClassMetrics| c.f1),
            support: total,
        };

        ClassificationReport {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_matches_hand_computation() {
        let y_true = [0, 0, 0, 1, 1];
        let y_pred = [0, 0, 1, 1, 0];
        let report = ClassificationReport::from_predictions(&y_true, &y_pred);

        assert!((report.accuracy - 0.6).abs() < 1e-12);
        let neg = report.classes[0];
        assert!((neg.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((neg.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(neg.support, 3);
        let pos = report.classes[1];
        assert!((pos.precision - 0.5).abs() < 1e-12);
        assert!((pos.recall - 0.5).abs() < 1e-12);
        assert!((report.weighted_avg.f1 - (3.0 * 2.0 / 3.0 + 2.0 * 0.5) / 5.0).abs() < 1e-12);
    }

    #[test]
    fn missing_class_reports_zero() {
        let report = ClassificationReport::from_predictions(&[0, 0], &[0, 0]);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.classes[1], ClassMetrics::default());
        assert!(report.to_string().contains("weighted avg"));
    }
}
