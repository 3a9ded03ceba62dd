//! Runs in its own process so the global Prometheus recorder is this test's.

use reqwest::StatusCode;
use spamfr_core::storage::ArtifactPaths;
use spamfr_core::SpamDetector;
use spamfr_server::api::create_router;
use spamfr_server::api::handlers::AppState;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_unmatched_paths_share_one_metrics_label() {
    let tmp_dir = TempDir::new().unwrap();
    let web = tmp_dir.path().join("web");
    std::fs::create_dir_all(&web).unwrap();
    std::fs::write(web.join("index.html"), "<h1>Détecteur de spam</h1>").unwrap();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .unwrap();
    let state = AppState {
        detector: Arc::new(SpamDetector::load(&ArtifactPaths::in_dir(
            &tmp_dir.path().join("missing"),
        ))),
        prometheus_handle,
        start_time: std::time::Instant::now(),
        static_dir: Some(web),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    let base_url = format!("http://{}", addr);
    let client = reqwest::Client::new();

    for path in ["/wp-login.php", "/admin/7f3a9c", "/index.html"] {
        client.get(format!("{}{}", base_url, path)).send().await.unwrap();
    }
    let resp = client.get(format!("{}/health", base_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let rendered = client
        .get(format!("{}/metrics", base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(rendered.contains("path=\"fallback\""), "{rendered}");
    assert!(rendered.contains("path=\"/health\""), "{rendered}");
    assert!(!rendered.contains("wp-login"), "{rendered}");
    assert!(!rendered.contains("7f3a9c"), "{rendered}");
}
