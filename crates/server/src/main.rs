use clap::Parser;
use spamfr_core::config;
use spamfr_core::storage::ArtifactPaths;
use spamfr_core::SpamDetector;
use spamfr_server::api::create_router;
use spamfr_server::api::handlers::AppState;
use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spamfr-server", about = "French spam classifier prediction server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Path to the fitted classifier artifact
    #[arg(long, env = "SPAMFR_MODEL_PATH", default_value = config::DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Path to the fitted vectorizer artifact
    #[arg(long, env = "SPAMFR_VECTORIZER_PATH", default_value = config::DEFAULT_VECTORIZER_PATH)]
    vectorizer_path: PathBuf,

    /// Directory served at `/` (landing page)
    #[arg(long, env = "SPAMFR_STATIC_DIR", default_value = config::DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("spamfr_server=info".parse()?)
                .add_directive("spamfr_core=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if args.port == 0 {
        eprintln!("Error: port must be > 0");
        std::process::exit(1);
    }

    let paths = ArtifactPaths::new(&args.model_path, &args.vectorizer_path);
    let detector = SpamDetector::load(&paths);
    if detector.is_loaded() {
        tracing::info!("Model and vectorizer loaded");
    } else {
        tracing::warn!(
            reason = detector.load_error().unwrap_or_default(),
            "Serving in degraded mode: every prediction will fail until artifacts are trained"
        );
    }

    let prometheus_handle =
        metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let state = AppState {
        detector: Arc::new(detector),
        prometheus_handle,
        start_time: Instant::now(),
        static_dir: Some(args.static_dir.clone()),
    };
    let model_loaded = state.detector.is_loaded();
    let vocabulary_size = state.detector.vocabulary_size().unwrap_or(0);
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        model_path = %args.model_path.display(),
        vectorizer_path = %args.vectorizer_path.display(),
        static_dir = %args.static_dir.display(),
        model_loaded,
        vocabulary_size,
        "spamfr-server ready"
    );

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let signal = shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            signal.notify_one();
        })
        .into_future();

    let drain_deadline = async {
        shutdown.notified().await;
        tokio::time::sleep(Duration::from_secs(args.shutdown_timeout)).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::error!(
                "Shutdown timeout ({}s) exceeded, dropping in-flight requests",
                args.shutdown_timeout
            );
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}
