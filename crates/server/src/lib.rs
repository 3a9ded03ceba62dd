//! spamfr-server: HTTP prediction endpoint for the French spam classifier.
//!
//! Wraps a [`spamfr_core::SpamDetector`] loaded once at startup.
//! Classification logic lives in `spamfr-core`.

/// REST API layer: Axum router, HTTP handlers, models, metrics.
pub mod api;
