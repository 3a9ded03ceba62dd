//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::metrics;
use crate::api::models::*;
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::{Form, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use spamfr_core::config;
use spamfr_core::detector::MODEL_NOT_LOADED;
use spamfr_core::{Prediction, SpamDetector};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state passed to every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup, read-only afterwards.
    pub detector: Arc<SpamDetector>,
    pub prometheus_handle: PrometheusHandle,
    pub start_time: Instant,
    /// Directory served as the router fallback, if any.
    pub static_dir: Option<PathBuf>,
}

/// The `text` field of a predict request, read from a JSON body, a
/// urlencoded form, or a multipart form.
///
/// A body that does not parse is treated like a missing field. A body over
/// the size limit is rejected with 413.
pub struct TextInput(pub Option<String>);

#[axum::async_trait]
impl<S> FromRequest<S> for TextInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
            let body = serde_json::from_slice::<PredictRequest>(&bytes).ok();
            Ok(TextInput(body.and_then(|b| b.text)))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            match Form::<PredictRequest>::from_request(req, state).await {
                Ok(Form(body)) => Ok(TextInput(body.text)),
                Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    Err(ApiError::PayloadTooLarge(e.body_text()))
                }
                Err(_) => Ok(TextInput(None)),
            }
        } else if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
            multipart_text(multipart).await.map(TextInput)
        } else {
            Ok(TextInput(None))
        }
    }
}

/// First `text` field of a multipart body.
async fn multipart_text(mut multipart: Multipart) -> Result<Option<String>, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiError::PayloadTooLarge(e.body_text()))
            }
            Err(_) => return Ok(None),
        };
        if field.name() != Some("text") {
            continue;
        }
        return match field.text().await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(ApiError::PayloadTooLarge(e.body_text()))
            }
            Err(_) => Ok(None),
        };
    }
}

fn require_loaded(state: &AppState) -> Result<(), ApiError> {
    if !state.detector.is_loaded() {
        metrics::record_prediction("error");
        return Err(ApiError::Internal(MODEL_NOT_LOADED.into()));
    }
    Ok(())
}

fn validate_text(text: Option<String>) -> Result<String, ApiError> {
    let text = text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Field \"text\" is required".into()))?;
    if text.len() > config::MAX_TEXT_LEN {
        return Err(ApiError::BadRequest(format!(
            "Text exceeds maximum length of {} bytes",
            config::MAX_TEXT_LEN
        )));
    }
    Ok(text)
}

fn record(prediction: &Prediction) {
    metrics::record_prediction(prediction.label().unwrap_or("error"));
}

/// `POST /predict`
pub async fn predict(
    State(state): State<AppState>,
    TextInput(text): TextInput,
) -> Result<Json<Prediction>, ApiError> {
    require_loaded(&state)?;
    let text = validate_text(text)?;

    let detector = state.detector.clone();
    let prediction = tokio::task::spawn_blocking(move || detector.predict(&text))
        .await
        .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))?;
    record(&prediction);
    if let Some(error) = prediction.error() {
        tracing::warn!("Prediction failed: {}", error);
        return Err(ApiError::Internal(error.to_string()));
    }
    Ok(Json(prediction))
}

/// `POST /predict/batch`
pub async fn predict_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchPredictRequest>,
) -> Result<Json<Vec<Prediction>>, ApiError> {
    require_loaded(&state)?;
    if req.texts.len() > config::MAX_BATCH_SIZE {
        return Err(ApiError::BadRequest(format!(
            "Batch exceeds maximum of {} texts",
            config::MAX_BATCH_SIZE
        )));
    }

    let detector = state.detector.clone();
    let texts = req.texts;
    let predictions = tokio::task::spawn_blocking(move || detector.batch_predict(&texts))
        .await
        .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))?;
    predictions.iter().for_each(record);
    Ok(Json(predictions))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let loaded = state.detector.is_loaded();
    let status_code = if loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status_code,
        Json(HealthResponse {
            status: if loaded { "ok" } else { "degraded" }.to_string(),
            model_loaded: loaded,
            vocabulary_size: state.detector.vocabulary_size(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        }),
    )
}

/// `GET /metrics`
pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}
