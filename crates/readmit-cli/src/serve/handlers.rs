use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use readmit_classifiers::inference::{InferenceService, PatientRecord};

use crate::serve::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub readmission_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Running, but without models; predictions answer 503.
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub models_loaded: bool,
    pub version: String,
}

/// `POST /predict`
///
/// The body is validated before the model state is consulted, so a malformed
/// request is a 422 even when no models are loaded.
pub async fn predict(
    State(service): State<Arc<InferenceService>>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        log::warn!("Rejected /predict request: invalid JSON: {}", e);
        ApiError::unprocessable(format!("Invalid JSON body: {}", e))
    })?;

    let record = PatientRecord::from_json(&value).map_err(|e| {
        log::warn!("Rejected /predict request: {}", e);
        ApiError::from(e)
    })?;

    match service.predict(&record) {
        Ok(prediction) => {
            log::debug!(
                "Scored {:?}: bagged={:.4} boosted={:.4} score={:.4}",
                record,
                prediction.bagged_probability,
                prediction.boosted_probability,
                prediction.readmission_score
            );
            Ok(Json(PredictResponse {
                readmission_score: prediction.readmission_score,
            }))
        }
        Err(e) => {
            log::warn!("Prediction failed: {}", e);
            Err(ApiError::from(e))
        }
    }
}

/// `GET /health`
pub async fn health(State(service): State<Arc<InferenceService>>) -> impl IntoResponse {
    let models_loaded = service.is_ready();
    let response = HealthResponse {
        status: if models_loaded {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        models_loaded,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }
}
