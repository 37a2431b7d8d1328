//! HTTP Server
//!
//! This module wires the exporter together and serves it over HTTP.
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page linking to the metrics path
//! - `GET <metrics_path>` - runs one scrape pass and returns Prometheus text
//! - `GET /health` - 200 if the last pass saw OPNsense up, 503 otherwise
//!
//! Scrapes are driven by Prometheus requests; there is no background loop. A
//! failing OPNsense only ever shows up in the metric values, the metrics handler
//! answers 500 solely when the text exposition cannot be rendered.

use crate::collectors::AdapterRegistry;
use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::opnsense::OpnSenseClient;
use crate::scrape::Scraper;
use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
struct AppState {
    scraper: Arc<Scraper>,
    metrics_path: String,
}

/// Build the scraper described by `config`: client, pruned collector set and
/// meta metrics.
pub fn build_scraper(config: &Config) -> anyhow::Result<Scraper> {
    let client = Arc::new(
        OpnSenseClient::new(&config.opnsense).context("Failed to build OPNsense client")?,
    );

    let mut registry = AdapterRegistry::with_all();
    registry.without_all(config.collectors.disabled())?;
    info!(collectors = ?registry.names(), "enabled collectors");

    let instance = config.exporter.instance_label.as_str();
    let metrics = MetricsCollector::new(instance, client.endpoints().keys().map(String::as_str))?;
    if config.exporter.disable_exporter_metrics {
        info!("exporter process metrics disabled");
    } else {
        metrics.register_process_metrics()?;
    }

    Ok(Scraper::new(client, registry.register_all(instance), metrics))
}

/// Router serving `scraper` with the metrics under `metrics_path`
pub fn router(scraper: Arc<Scraper>, metrics_path: &str) -> Router {
    let state = AppState {
        scraper,
        metrics_path: metrics_path.to_string(),
    };

    let mut app = Router::new().route(metrics_path, get(metrics_handler));
    if metrics_path != "/" {
        app = app.route("/", get(root_handler));
    }
    app.route("/health", get(health_handler)).with_state(state)
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let scraper = Arc::new(build_scraper(&config)?);
    info!("OPNsense API: {}", scraper.client().base_url());

    if config.exporter.firmware_check_on_start {
        let client = Arc::clone(scraper.client());
        tokio::spawn(async move {
            info!("triggering firmware status update");
            match client.trigger_firmware_status_update().await {
                Ok(()) => info!("firmware status update finished"),
                Err(e) => warn!(error = %e, "firmware status update failed"),
            }
        });
    }

    let app = router(scraper, &config.server.metrics_path);

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Metrics server listening on {}", addr);
    info!(
        "Metrics available at http://{}{}",
        addr, config.server.metrics_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

async fn root_handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<html>
<head><title>OPNsense Exporter</title></head>
<body>
<h1>OPNsense Prometheus Exporter</h1>
<p><a href="{}">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
        state.metrics_path
    ))
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.scraper.scrape().await {
        Ok(metrics) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            metrics,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.scraper.metrics().is_up() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "OPNsense API unreachable")
    }
}
