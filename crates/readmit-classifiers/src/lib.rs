//! readmit-classifiers: training and inference building blocks for 30-day
//! readmission risk scoring.
//!
//! This crate provides tabular loading, median imputation and standard
//! scaling bound to an explicit feature schema, two tree ensembles (a bagged
//! random forest and gradient boosted trees), validation metrics, artifact
//! persistence and the transport-independent inference service used by the
//! `readmit` binary.
//!
//! Everything here is synchronous; the HTTP surface lives in `readmit-cli`.
pub mod artifacts;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod inference;
pub mod io;
pub mod metrics;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod stats;
pub mod trainer;

pub use error::{ReadmitError, Result};
