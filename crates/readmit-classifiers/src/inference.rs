//! Transport-independent single-record scoring.
//!
//! [`InferenceService`] owns the loaded artifacts and is shared read-only
//! across request handlers. When the artifacts cannot be loaded at startup
//! the service is still constructed, in the [`ModelState::NotLoaded`] state,
//! and every prediction fails with [`ReadmitError::ModelsNotLoaded`].
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifacts::{ArtifactBundle, ArtifactPaths};
use crate::error::{ReadmitError, Result};
use crate::models::ClassifierModel;
use crate::preprocessing::FeatureFrame;

/// One patient as submitted for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: f64,
    pub bmi: f64,
    pub num_prior_admissions: u32,
}

impl PatientRecord {
    /// Feature columns in the order the record is presented to the models.
    pub const COLUMNS: [&'static str; 3] = ["age", "bmi", "num_prior_admissions"];

    /// Build a record from a JSON object, applying the range checks of
    /// [`PatientRecord::validate`]. Numeric strings are accepted.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            ReadmitError::request_validation("body", "expected a JSON object")
        })?;

        let number = |field: &str| -> Result<f64> {
            match object.get(field) {
                None | Some(Value::Null) => {
                    Err(ReadmitError::request_validation(field, "field required"))
                }
                Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
                    ReadmitError::request_validation(field, "value is not a valid number")
                }),
                Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
                    ReadmitError::request_validation(field, "value is not a valid number")
                }),
                Some(_) => Err(ReadmitError::request_validation(
                    field,
                    "value is not a valid number",
                )),
            }
        };

        let age = number("age")?;
        let bmi = number("bmi")?;
        let admissions = number("num_prior_admissions")?;
        if !admissions.is_finite() || admissions.fract() != 0.0 {
            return Err(ReadmitError::request_validation(
                "num_prior_admissions",
                "value is not a valid integer",
            ));
        }
        if admissions < 0.0 || admissions > u32::MAX as f64 {
            return Err(ReadmitError::request_validation(
                "num_prior_admissions",
                "must be a non-negative integer",
            ));
        }

        let record = PatientRecord {
            age,
            bmi,
            num_prior_admissions: admissions as u32,
        };
        record.validate()?;
        Ok(record)
    }

    /// Features are scored as `f32`, so values that overflow it are rejected
    /// here rather than reaching the models as infinities.
    pub fn validate(&self) -> Result<()> {
        if !(self.age as f32).is_finite() || self.age < 0.0 {
            return Err(ReadmitError::request_validation(
                "age",
                "must be a finite number >= 0",
            ));
        }
        if !(self.bmi as f32).is_finite() || self.bmi <= 0.0 {
            return Err(ReadmitError::request_validation(
                "bmi",
                "must be a finite number > 0",
            ));
        }
        Ok(())
    }

    /// One-row feature frame with the record's column names.
    pub fn to_frame(&self) -> Result<FeatureFrame> {
        let values = Array2::from_shape_vec(
            (1, Self::COLUMNS.len()),
            vec![
                self.age as f32,
                self.bmi as f32,
                self.num_prior_admissions as f32,
            ],
        )
        .map_err(|e| ReadmitError::DataValidation(e.to_string()))?;
        FeatureFrame::new(Self::COLUMNS.iter().map(|c| c.to_string()).collect(), values)
    }
}

/// Score for one record plus the two model probabilities it averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub readmission_score: f64,
    pub bagged_probability: f64,
    pub boosted_probability: f64,
}

#[derive(Debug)]
pub enum ModelState {
    Ready(Box<ArtifactBundle>),
    /// Carries the reason loading failed.
    NotLoaded(String),
}

#[derive(Debug)]
pub struct InferenceService {
    state: ModelState,
}

impl InferenceService {
    /// Load all four artifacts. Any failure yields a service in the
    /// `NotLoaded` state instead of an error.
    pub fn load(paths: &ArtifactPaths) -> Self {
        let missing = paths.missing();
        if !missing.is_empty() {
            let reason = format!(
                "missing artifact(s): {}. Run `readmit train` first to generate them",
                missing
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            log::warn!("Starting without models: {}", reason);
            return Self::not_loaded(reason);
        }
        match ArtifactBundle::load(paths) {
            Ok(bundle) => {
                log::info!(
                    "Loaded models for features {:?}",
                    bundle.imputer.schema.columns()
                );
                Self::from_bundle(bundle)
            }
            Err(e) => {
                log::warn!("Starting without models: {}", e);
                Self::not_loaded(e.to_string())
            }
        }
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Self {
        InferenceService {
            state: ModelState::Ready(Box::new(bundle)),
        }
    }

    pub fn not_loaded(reason: impl Into<String>) -> Self {
        InferenceService {
            state: ModelState::NotLoaded(reason.into()),
        }
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    /// Impute, scale and score one record with both models and return the
    /// unweighted mean of their positive-class probabilities.
    pub fn predict(&self, record: &PatientRecord) -> Result<Prediction> {
        let bundle = match &self.state {
            ModelState::Ready(bundle) => bundle,
            ModelState::NotLoaded(reason) => {
                return Err(ReadmitError::ModelsNotLoaded(reason.clone()))
            }
        };
        record.validate()?;

        let frame = record.to_frame()?;
        let imputed = bundle.imputer.transform(&frame)?;
        let scaled = bundle.scaler.transform(&imputed)?;

        let bagged = single_probability(&bundle.bagged_trees, &scaled.values)?;
        let boosted = single_probability(&bundle.boosted_trees, &scaled.values)?;

        Ok(Prediction {
            readmission_score: (bagged + boosted) / 2.0,
            bagged_probability: bagged,
            boosted_probability: boosted,
        })
    }
}

fn single_probability<M: ClassifierModel>(model: &M, x: &Array2<f32>) -> Result<f64> {
    let proba = model.predict_proba(x)?;
    match proba.as_slice() {
        [p] if (0.0..=1.0).contains(p) => Ok(*p as f64),
        [p] => Err(ReadmitError::Model(format!(
            "{} returned probability {} outside [0, 1]",
            model.name(),
            p
        ))),
        other => Err(ReadmitError::Model(format!(
            "{} returned {} probabilities for one record",
            model.name(),
            other.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_valid_record() {
        let record =
            PatientRecord::from_json(&json!({"age": 45, "bmi": 25.0, "num_prior_admissions": 0}))
                .unwrap();
        assert_eq!(
            record,
            PatientRecord {
                age: 45.0,
                bmi: 25.0,
                num_prior_admissions: 0
            }
        );
    }

    #[test]
    fn accepts_numeric_strings_and_integral_floats() {
        let record = PatientRecord::from_json(
            &json!({"age": "61", "bmi": " 31.5", "num_prior_admissions": 2.0}),
        )
        .unwrap();
        assert_eq!(record.num_prior_admissions, 2);
        assert_eq!(record.age, 61.0);
    }

    fn invalid_field(value: Value) -> String {
        match PatientRecord::from_json(&value).unwrap_err() {
            ReadmitError::RequestValidation { field, .. } => field,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_fields() {
        assert_eq!(invalid_field(json!({"age": 45, "num_prior_admissions": 0})), "bmi");
        assert_eq!(
            invalid_field(json!({"age": -1, "bmi": 25.0, "num_prior_admissions": 0})),
            "age"
        );
        assert_eq!(
            invalid_field(json!({"age": 45, "bmi": 0, "num_prior_admissions": 0})),
            "bmi"
        );
        assert_eq!(
            invalid_field(json!({"age": 45, "bmi": 25.0, "num_prior_admissions": 1.5})),
            "num_prior_admissions"
        );
        assert_eq!(
            invalid_field(json!({"age": 45, "bmi": 25.0, "num_prior_admissions": -2})),
            "num_prior_admissions"
        );
        assert_eq!(
            invalid_field(json!({"age": true, "bmi": 25.0, "num_prior_admissions": 0})),
            "age"
        );
        assert_eq!(invalid_field(json!([1, 2, 3])), "body");
    }

    #[test]
    fn rejects_values_beyond_f32_range() {
        assert_eq!(
            invalid_field(json!({"age": 1e300, "bmi": 25.0, "num_prior_admissions": 0})),
            "age"
        );
        assert_eq!(
            invalid_field(json!({"age": 45, "bmi": 1e40, "num_prior_admissions": 0})),
            "bmi"
        );
        let record = PatientRecord {
            age: 45.0,
            bmi: 25.0,
            num_prior_admissions: 0,
        };
        assert!(PatientRecord { age: 1e300, ..record }.validate().is_err());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn not_loaded_service_refuses_to_predict() {
        let service = InferenceService::not_loaded("no artifacts");
        assert!(!service.is_ready());
        let record = PatientRecord {
            age: 45.0,
            bmi: 25.0,
            num_prior_admissions: 0,
        };
        assert!(matches!(
            service.predict(&record),
            Err(ReadmitError::ModelsNotLoaded(_))
        ));
    }

    #[test]
    fn missing_directory_means_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let service = InferenceService::load(&ArtifactPaths::in_dir(dir.path().join("absent")));
        match service.state() {
            ModelState::NotLoaded(reason) => assert!(reason.contains("imputer.json")),
            ModelState::Ready(_) => panic!("expected NotLoaded"),
        }
    }
}
