//! HTTP client for the inference API.
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use readmit_classifiers::inference::PatientRecord;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The service could not be reached or did not answer in time.
    #[error("Could not reach the prediction service at {url}: {detail}")]
    Connection { url: String, detail: String },

    #[error(
        "The prediction service returned HTTP {status}: {}",
        .message.as_deref().unwrap_or("no error message")
    )]
    Service { status: u16, message: Option<String> },

    #[error("Unexpected response from the prediction service: {0}")]
    InvalidResponse(String),
}

/// Sends one record per call to `POST {api_url}/predict`.
#[derive(Debug, Clone)]
pub struct PredictClient {
    http: reqwest::Client,
    predict_url: String,
    timeout: Duration,
}

impl PredictClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let predict_url = format!("{}/predict", api_url.trim_end_matches('/'));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Connection {
                url: predict_url.clone(),
                detail: e.to_string(),
            })?;
        Ok(PredictClient {
            http,
            predict_url,
            timeout,
        })
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    pub async fn predict(&self, record: &PatientRecord) -> Result<f64, ClientError> {
        let response = self
            .http
            .post(&self.predict_url)
            .json(record)
            .send()
            .await
            .map_err(|e| ClientError::Connection {
                url: self.predict_url.clone(),
                detail: if e.is_timeout() {
                    format!("no response within {} s", self.timeout.as_secs())
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ClientError::Connection {
            url: self.predict_url.clone(),
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(ClientError::Service {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(format!("body is not JSON: {}", e)))?;
        let score = value
            .get("readmission_score")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                ClientError::InvalidResponse("missing numeric 'readmission_score'".to_string())
            })?;
        if !(0.0..=1.0).contains(&score) {
            return Err(ClientError::InvalidResponse(format!(
                "score {} is outside [0, 1]",
                score
            )));
        }
        Ok(score)
    }
}

/// Pull `error.message` out of a structured error body, falling back to the
/// raw text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value
            .pointer("/error/message")
            .or_else(|| value.get("detail"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}
