use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Bar, Histogram, Plot};

use crate::error::{ReadmitError, Result};
use crate::metrics::ClassificationReport;

/// Plot a histogram of the validation scores split by true label.
pub fn plot_score_histogram(scores: &[f32], labels: &[u8], title: &str) -> Result<Plot> {
    if scores.len() != labels.len() {
        return Err(ReadmitError::DataValidation(format!(
            "{} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }

    let mut scores_positive = Vec::new();
    let mut scores_negative = Vec::new();

    for (score, label) in scores.iter().zip(labels) {
        if *label == 1 {
            scores_positive.push(*score);
        } else {
            scores_negative.push(*score);
        }
    }

    let trace_positive = Histogram::new(scores_positive)
        .name("Readmitted")
        .opacity(0.6);

    let trace_negative = Histogram::new(scores_negative)
        .name("Not readmitted")
        .opacity(0.6);

    let layout = Layout::new()
        .title(title)
        .bar_mode(BarMode::Overlay)
        .x_axis(Axis::new().title("Positive-class probability"))
        .y_axis(Axis::new().title("Count"));

    let mut plot = Plot::new();
    plot.add_trace(trace_negative);
    plot.add_trace(trace_positive);
    plot.set_layout(layout);

    Ok(plot)
}

/// Grouped bars of per-class F1 for each named model.
pub fn plot_f1_comparison(reports: &[(&str, &ClassificationReport)], title: &str) -> Plot {
    let classes = vec!["Not readmitted".to_string(), "Readmitted".to_string()];
    let mut plot = Plot::new();
    for (name, report) in reports {
        let f1: Vec<f64> = report.classes.iter().map(|c| c.f1).collect();
        plot.add_trace(Bar::new(classes.clone(), f1).name(*name));
    }
    plot.set_layout(
        Layout::new()
            .title(title)
            .bar_mode(BarMode::Group)
            .y_axis(Axis::new().title("F1").range(vec![0.0, 1.0])),
    );
    plot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_rejects_length_mismatch() {
        assert!(plot_score_histogram(&[0.1, 0.2], &[1], "scores").is_err());
        assert!(plot_score_histogram(&[0.1, 0.9], &[0, 1], "scores").is_ok());
    }
}
