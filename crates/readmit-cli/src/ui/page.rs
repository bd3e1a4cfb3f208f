//! HTML form and result rendering.
use maud::{html, Markup, DOCTYPE};
use serde::{Deserialize, Serialize};

use readmit_classifiers::inference::PatientRecord;

/// Qualitative band shown next to the score. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score < 0.4 {
            RiskBand::Low
        } else if score < 0.7 {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Low => "low risk",
            RiskBand::Medium => "medium risk",
            RiskBand::High => "high risk",
        }
    }

    fn css_class(&self) -> &'static str {
        match self {
            RiskBand::Low => "band-low",
            RiskBand::Medium => "band-medium",
            RiskBand::High => "band-high",
        }
    }
}

/// Raw form fields, kept as text so the page can echo back what was typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormValues {
    pub age: String,
    pub bmi: String,
    pub num_prior_admissions: String,
}

impl Default for FormValues {
    fn default() -> Self {
        FormValues {
            age: String::from("45"),
            bmi: String::from("25.0"),
            num_prior_admissions: String::from("0"),
        }
    }
}

impl FormValues {
    /// Apply the widget limits (age 0 to 120, non-negative whole admissions).
    /// Everything else is left to the service.
    pub fn to_record(&self) -> Result<PatientRecord, String> {
        let age: f64 = self
            .age
            .trim()
            .parse()
            .map_err(|_| format!("Age must be a number, got '{}'", self.age))?;
        if !(0.0..=120.0).contains(&age) {
            return Err(format!("Age must be between 0 and 120, got {}", age));
        }
        let bmi: f64 = self
            .bmi
            .trim()
            .parse()
            .map_err(|_| format!("BMI must be a number, got '{}'", self.bmi))?;
        let num_prior_admissions: u32 = self.num_prior_admissions.trim().parse().map_err(|_| {
            format!(
                "Prior admissions must be a whole number of at least 0, got '{}'",
                self.num_prior_admissions
            )
        })?;
        Ok(PatientRecord {
            age,
            bmi,
            num_prior_admissions,
        })
    }
}

/// What to show under the form after a submit.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Score(f64),
    Error(String),
}

/// Score as displayed: three decimals.
pub fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

pub fn format_score(score: f64) -> String {
    format!("{:.3}", round_score(score))
}

/// Formatted score and the band of the value actually shown, so the two never
/// disagree at a band edge.
pub fn describe_score(score: f64) -> (String, RiskBand) {
    (format_score(score), RiskBand::from_score(round_score(score)))
}

pub fn render_page(form: &FormValues, outcome: Option<&Outcome>) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Patient Readmission Predictor" }
                style {
                    "body { font-family: sans-serif; max-width: 560px; margin: 3em auto; }
                     label { display: block; margin-top: 1em; }
                     input { width: 100%; padding: 6px; }
                     button { margin-top: 1.5em; padding: 8px 20px; }
                     .result { margin-top: 2em; padding: 1em; border-radius: 6px; }
                     .band-low { background: #e6f4ea; }
                     .band-medium { background: #fff4e0; }
                     .band-high { background: #fde7e9; }
                     .error { background: #fde7e9; color: #8a1c24; }"
                }
            }
            body {
                h1 { "Patient Readmission Predictor" }
                form method="post" action="/" {
                    label for="age" { "Age" }
                    input id="age" name="age" type="number" min="0" max="120" step="1"
                        value=(form.age);
                    label for="bmi" { "BMI" }
                    input id="bmi" name="bmi" type="number" step="0.1" value=(form.bmi);
                    label for="num_prior_admissions" { "Prior admissions" }
                    input id="num_prior_admissions" name="num_prior_admissions" type="number"
                        min="0" step="1" value=(form.num_prior_admissions);
                    button type="submit" { "Predict" }
                }
                @match outcome {
                    Some(Outcome::Score(score)) => {
                        @let (shown, band) = describe_score(*score);
                        div class={ "result " (band.css_class()) } {
                            "Readmission risk score: "
                            strong { (shown) }
                            " (" (band.label()) ")"
                        }
                    }
                    Some(Outcome::Error(message)) => {
                        div class="result error" { (message) }
                    }
                    None => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_fixed_thresholds() {
        assert_eq!(RiskBand::from_score(0.0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(0.399), RiskBand::Low);
        assert_eq!(RiskBand::from_score(0.4), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(0.699), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(0.7), RiskBand::High);
        assert_eq!(RiskBand::from_score(1.0), RiskBand::High);
    }

    #[test]
    fn band_follows_the_displayed_score() {
        assert_eq!(describe_score(0.6996), ("0.700".to_string(), RiskBand::High));
        assert_eq!(describe_score(0.3996), ("0.400".to_string(), RiskBand::Medium));
        assert_eq!(describe_score(0.3994), ("0.399".to_string(), RiskBand::Low));

        let html = render_page(&FormValues::default(), Some(&Outcome::Score(0.6996))).into_string();
        assert!(html.contains("0.700"));
        assert!(html.contains("high risk"));
        assert!(!html.contains("medium risk"));
    }

    #[test]
    fn default_form_builds_record() {
        let record = FormValues::default().to_record().unwrap();
        assert_eq!(record.age, 45.0);
        assert_eq!(record.bmi, 25.0);
        assert_eq!(record.num_prior_admissions, 0);
    }

    #[test]
    fn widget_limits_are_enforced() {
        let form = FormValues {
            age: "130".into(),
            ..FormValues::default()
        };
        assert!(form.to_record().unwrap_err().contains("between 0 and 120"));
        let form = FormValues {
            num_prior_admissions: "-1".into(),
            ..FormValues::default()
        };
        assert!(form.to_record().is_err());
    }

    #[test]
    fn score_rendered_with_three_decimals() {
        let html = render_page(&FormValues::default(), Some(&Outcome::Score(0.71234))).into_string();
        assert!(html.contains("0.712"));
        assert!(html.contains("high risk"));
    }
}
