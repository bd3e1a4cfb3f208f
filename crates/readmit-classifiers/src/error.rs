use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading data, fitting transforms and models, or
/// serving predictions.
#[derive(Debug, Error)]
pub enum ReadmitError {
    /// Malformed or missing training data.
    #[error("data validation failed: {0}")]
    DataValidation(String),

    /// Columns presented at transform time differ from the fitted schema.
    #[error("schema mismatch: expected columns {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("dataset is empty: {0}")]
    EmptyDataset(String),

    /// Inference was requested while the service runs without artifacts.
    /// Re-running training fixes this.
    #[error("models not loaded: {0}")]
    ModelsNotLoaded(String),

    /// A single inference payload failed validation.
    #[error("invalid field '{field}': {message}")]
    RequestValidation { field: String, message: String },

    /// Reading or writing one of the four artifact files failed. Artifacts are
    /// written independently, so a failure here can leave the directory with a
    /// mix of old and new files.
    #[error("artifact {}: {}", .path.display(), .message)]
    Artifact { path: PathBuf, message: String },

    #[error("model error: {0}")]
    Model(String),
}

impl ReadmitError {
    pub fn request_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ReadmitError::RequestValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn artifact(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ReadmitError::Artifact {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReadmitError>;
