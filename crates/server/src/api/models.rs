//! Request and response data transfer objects for the REST API.
//!
//! Prediction results are serialized straight from
//! [`spamfr_core::Prediction`]; only the request envelopes and the health
//! payload live here.

use serde::{Deserialize, Serialize};

/// Body of `POST /predict`, as JSON or as a form.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    pub text: Option<String>,
}

/// Request body for `POST /predict/batch`.
#[derive(Debug, Deserialize)]
pub struct BatchPredictRequest {
    pub texts: Vec<String>,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    pub model_loaded: bool,
    pub vocabulary_size: Option<usize>,
    pub version: String,
    pub uptime_seconds: u64,
}
