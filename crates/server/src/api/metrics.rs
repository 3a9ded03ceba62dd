//! Prometheus metrics recording.

use metrics::{counter, histogram};
use std::time::Duration;

/// Records HTTP request metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Records one prediction outcome: `"SPAM"`, `"HAM"`, or `"error"`.
pub fn record_prediction(outcome: &str) {
    counter!(
        "spamfr_predictions_total",
        "label" => outcome.to_string()
    )
    .increment(1);
}
