// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the dashboard API.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;

use unidesk_core::UnideskError;
use unidesk_kb::KnowledgeBase;
use unidesk_session::SessionManager;
use unidesk_simulator::WebhookSimulator;
use unidesk_storage::HelpdeskStore;

use crate::handlers;

/// Health state for the unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session manager driving chat exchanges.
    pub manager: SessionManager,
    /// Direct store access for conversation and reset routes.
    pub store: Arc<HelpdeskStore>,
    /// Knowledge base for the FAQ routes.
    pub kb: KnowledgeBase,
    /// Webhook simulator for the simulate route.
    pub simulator: WebhookSimulator,
    /// Identity stamped on web conversations that do not name a student.
    pub web_student: WebStudent,
    /// Health state for unauthenticated endpoints.
    pub health: HealthState,
}

/// Default student identity for the web channel.
#[derive(Debug, Clone)]
pub struct WebStudent {
    pub id: String,
    pub name: String,
}

/// Gateway server configuration (mirrors the `[gateway]` config table,
/// kept local to avoid a dependency on the config crate).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/v1/chat", post(handlers::post_chat))
        .route("/v1/conversations", get(handlers::list_conversations))
        .route(
            "/v1/conversations/{id}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route(
            "/v1/conversations/{id}/status",
            put(handlers::put_conversation_status),
        )
        .route(
            "/v1/faqs",
            get(handlers::list_faqs).post(handlers::post_faq),
        )
        .route("/v1/faqs/{id}", delete(handlers::delete_faq))
        .route("/v1/simulate", post(handlers::post_simulate))
        .route("/v1/analytics", get(handlers::get_analytics))
        .route("/v1/reset", post(handlers::post_reset))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until the process exits.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), UnideskError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| UnideskError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| UnideskError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
