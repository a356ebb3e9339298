// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway exposing the helpdesk to the dashboard.
//!
//! A thin axum layer: every route delegates to the session manager, the
//! knowledge base, the webhook simulator, or the store. The chat route
//! answers with plain JSON, or upgrades to Server-Sent Events when the
//! client sends `Accept: text/event-stream`.
//!
//! Routes:
//! - `GET /health`, `GET /metrics`
//! - `POST /v1/chat`
//! - `GET /v1/conversations`, `GET|DELETE /v1/conversations/{id}`,
//!   `PUT /v1/conversations/{id}/status`
//! - `GET|POST /v1/faqs`, `DELETE /v1/faqs/{id}`
//! - `POST /v1/simulate`
//! - `GET /v1/analytics`
//! - `POST /v1/reset`

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{AppState, HealthState, ServerConfig, WebStudent, router, start_server};
