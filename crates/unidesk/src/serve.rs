// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unidesk serve` command implementation.
//!
//! Starts the full helpdesk stack: SQLite-backed store, Gemini model
//! gateway, knowledge base, session manager, webhook simulator, and the
//! HTTP gateway serving the dashboard API.

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};

use unidesk_config::UnideskConfig;
use unidesk_core::UnideskError;
use unidesk_gateway::{AppState, HealthState, ServerConfig, WebStudent, start_server};
use unidesk_gemini::GeminiModel;
use unidesk_kb::KnowledgeBase;
use unidesk_session::SessionManager;
use unidesk_simulator::WebhookSimulator;
use unidesk_storage::HelpdeskStore;

/// Runs the `unidesk serve` command.
///
/// Initializes every subsystem from configuration and serves until the
/// process is terminated.
pub async fn run_serve(config: UnideskConfig) -> Result<(), UnideskError> {
    init_tracing(&config.logging.level);

    info!("starting unidesk serve");

    let store = Arc::new(HelpdeskStore::open(&config.storage.database_path).await?);
    info!(path = %config.storage.database_path, "store opened");

    let model = Arc::new(GeminiModel::new(&config).map_err(|e| {
        eprintln!(
            "error: Gemini API key required. Set gemini.api_key in config or the GEMINI_API_KEY environment variable."
        );
        e
    })?);

    let kb = KnowledgeBase::new(store.clone());
    let manager = SessionManager::new(model, store.clone(), kb.clone());
    let simulator = WebhookSimulator::new(manager.clone());

    // Install the Prometheus recorder before any metric is touched. Only
    // one recorder can exist per process.
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        if config.gateway.metrics {
            let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
                UnideskError::Internal(format!("failed to install Prometheus recorder: {e}"))
            })?;
            unidesk_session::metrics::register_metrics();
            info!("prometheus metrics recorder installed");
            Some(Arc::new(move || handle.render()))
        } else {
            debug!("prometheus metrics disabled by configuration");
            None
        };

    let state = AppState {
        manager,
        store,
        kb,
        simulator,
        web_student: WebStudent {
            id: config.assistant.student_id.clone(),
            name: config.assistant.student_name.clone(),
        },
        health: HealthState {
            start_time: Instant::now(),
            prometheus_render,
        },
    };

    let server_config = ServerConfig {
        host: config.gateway.bind_address.clone(),
        port: config.gateway.port,
    };

    start_server(&server_config, state).await?;

    info!("unidesk serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("unidesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
