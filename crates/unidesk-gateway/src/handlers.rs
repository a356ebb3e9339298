// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the gateway API.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use unidesk_core::{AnalyticsSummary, Category, Platform, Sentiment, TicketStatus, UnideskError};
use unidesk_session::{AnswerMode, ChatSession, IgnoreReason, Submission};

use crate::server::AppState;
use crate::sse;

/// Request body for POST /v1/chat.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The student's message.
    pub message: String,
    /// Existing conversation to continue. A fresh one is created when
    /// absent; an unknown id is adopted as-is for the new record.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Student id to record on a new conversation.
    #[serde(default)]
    pub student_id: Option<String>,
    /// Student display name to record on a new conversation.
    #[serde(default)]
    pub student_name: Option<String>,
}

/// Response body for POST /v1/chat (non-streaming).
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Id of the conversation the exchange was appended to.
    pub conversation_id: String,
    /// Full text of the assistant's answer.
    pub reply: String,
    /// Category assigned to this query.
    pub category: Category,
    /// Sentiment assigned to this query.
    pub sentiment: Sentiment,
    /// Ticket status after the exchange.
    pub status: TicketStatus,
    /// True when a model failure was papered over with defaults.
    pub degraded: bool,
}

/// Request body for PUT /v1/conversations/{id}/status.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// New ticket status.
    pub status: TicketStatus,
}

/// Request body for POST /v1/faqs.
#[derive(Debug, Deserialize)]
pub struct FaqRequest {
    /// Question text shown to students.
    pub question: String,
    /// Canonical answer.
    pub answer: String,
    /// Category the entry belongs to. Defaults to `Other`.
    #[serde(default)]
    pub category: Category,
}

/// Request body for POST /v1/simulate.
#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    /// Channel to fabricate the webhook on.
    pub platform: Platform,
    /// Inbound message text.
    pub message: String,
}

/// One display-log line in a simulate response.
#[derive(Debug, Serialize)]
pub struct LogLine {
    /// Wall-clock time the line was produced.
    pub time: String,
    /// `WEBHOOK_INCOMING` or `WEBHOOK_OUTGOING`.
    pub direction: String,
    /// Logged text.
    pub text: String,
}

impl From<unidesk_simulator::LogEntry> for LogLine {
    fn from(entry: unidesk_simulator::LogEntry) -> Self {
        Self {
            time: entry.time,
            direction: entry.direction.to_string(),
            text: entry.text,
        }
    }
}

/// Response body for POST /v1/simulate.
#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    /// Id of the conversation the simulator created.
    pub conversation_id: String,
    /// Status the record was persisted with.
    pub status: TicketStatus,
    /// The assistant's reply text.
    pub reply: String,
    /// Inbound display-log line.
    pub incoming: LogLine,
    /// Outbound display-log line.
    pub outgoing: LogLine,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since the gateway started.
    pub uptime_secs: u64,
}

/// Error body returned by every non-2xx route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description of the failure.
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn internal_error(e: UnideskError) -> Response {
    error!(error = %e, "request failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Loads the session named by the request, or builds a fresh one.
///
/// A known conversation id rehydrates the stored record. An unknown id is
/// adopted for the new session so externally generated ids survive the
/// first exchange.
pub(crate) async fn resolve_session(
    state: &AppState,
    request: &ChatRequest,
) -> Result<ChatSession, UnideskError> {
    let student_id = request
        .student_id
        .clone()
        .unwrap_or_else(|| state.web_student.id.clone());
    let student_name = request
        .student_name
        .clone()
        .unwrap_or_else(|| state.web_student.name.clone());

    match &request.conversation_id {
        Some(id) => {
            if let Some(record) = state.store.conversation(id).await? {
                Ok(ChatSession::from_conversation(&record))
            } else {
                let mut session = ChatSession::new(student_id, student_name);
                session.id = id.clone();
                Ok(session)
            }
        }
        None => Ok(ChatSession::new(student_id, student_name)),
    }
}

/// POST /v1/chat
///
/// Returns the complete answer as JSON, or a Server-Sent Events stream when
/// the client sends `Accept: text/event-stream`.
pub async fn post_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    let wants_stream = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));
    if wants_stream {
        return sse::stream_chat(state, request).await.into_response();
    }

    let mut session = match resolve_session(&state, &request).await {
        Ok(session) => session,
        Err(e) => return internal_error(e),
    };

    match state
        .manager
        .submit_query(&mut session, &request.message, AnswerMode::Complete, None)
        .await
    {
        Ok(Submission::Completed(report)) => (
            StatusCode::OK,
            Json(ChatResponse {
                conversation_id: report.conversation.id.clone(),
                reply: report.bot_message.text.clone(),
                category: report.conversation.category,
                sentiment: report.conversation.sentiment,
                status: report.conversation.status,
                degraded: report.generation_degraded || report.classification_degraded,
            }),
        )
            .into_response(),
        Ok(Submission::Ignored(reason)) => ignored_response(reason),
        Err(e) => internal_error(e),
    }
}

pub(crate) fn ignored_reason_message(reason: IgnoreReason) -> &'static str {
    match reason {
        IgnoreReason::BlankQuery => "message must not be blank",
        IgnoreReason::ExchangeInFlight => "another exchange is in flight for this conversation",
    }
}

fn ignored_response(reason: IgnoreReason) -> Response {
    let status = match reason {
        IgnoreReason::BlankQuery => StatusCode::UNPROCESSABLE_ENTITY,
        IgnoreReason::ExchangeInFlight => StatusCode::CONFLICT,
    };
    error_response(status, ignored_reason_message(reason))
}

/// GET /v1/conversations
pub async fn list_conversations(State(state): State<AppState>) -> Response {
    match state.store.conversations().await {
        Ok(conversations) => (StatusCode::OK, Json(conversations)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/conversations/{id}
pub async fn get_conversation(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.conversation(&id).await {
        Ok(Some(conversation)) => (StatusCode::OK, Json(conversation)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("no conversation {id}")),
        Err(e) => internal_error(e),
    }
}

/// DELETE /v1/conversations/{id}
///
/// Idempotent: deleting an unknown id still returns 204.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.delete_conversation(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

/// PUT /v1/conversations/{id}/status
///
/// Idempotent: an unknown id is a no-op and still returns 204.
pub async fn put_conversation_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Response {
    match state.store.set_status(&id, request.status).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/faqs
pub async fn list_faqs(State(state): State<AppState>) -> Response {
    match state.kb.list().await {
        Ok(faqs) => (StatusCode::OK, Json(faqs)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /v1/faqs
pub async fn post_faq(State(state): State<AppState>, Json(request): Json<FaqRequest>) -> Response {
    match state
        .kb
        .add(&request.question, &request.answer, request.category)
        .await
    {
        Ok(Some(faq)) => (StatusCode::CREATED, Json(faq)).into_response(),
        Ok(None) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "question and answer must not be blank",
        ),
        Err(e) => internal_error(e),
    }
}

/// DELETE /v1/faqs/{id}
///
/// Idempotent: deleting an unknown id still returns 204.
pub async fn delete_faq(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.kb.remove(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /v1/simulate
pub async fn post_simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulateRequest>,
) -> Response {
    match state
        .simulator
        .simulate(request.platform, &request.message)
        .await
    {
        Ok(Some(delivery)) => (
            StatusCode::OK,
            Json(SimulateResponse {
                conversation_id: delivery.conversation.id.clone(),
                status: delivery.conversation.status,
                reply: delivery.reply,
                incoming: delivery.incoming.into(),
                outgoing: delivery.outgoing.into(),
            }),
        )
            .into_response(),
        Ok(None) => error_response(StatusCode::UNPROCESSABLE_ENTITY, "message must not be blank"),
        Err(e) => internal_error(e),
    }
}

/// GET /v1/analytics
pub async fn get_analytics(State(state): State<AppState>) -> Response {
    match state.store.conversations().await {
        Ok(conversations) => (
            StatusCode::OK,
            Json(AnalyticsSummary::from_conversations(&conversations)),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /v1/reset
pub async fn post_reset(State(state): State<AppState>) -> Response {
    match state.store.reset().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Present only when a Prometheus recorder was installed at startup;
/// responds 404 otherwise.
pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (StatusCode::OK, render()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use unidesk_simulator::WebhookSimulator;
    use unidesk_test_utils::TestHarness;

    use crate::server::{HealthState, WebStudent};

    use super::*;

    fn state_over(harness: &TestHarness) -> AppState {
        AppState {
            manager: harness.manager.clone(),
            store: harness.store.clone(),
            kb: harness.kb.clone(),
            simulator: WebhookSimulator::new(harness.manager.clone())
                .with_log_delay(Duration::from_millis(1)),
            web_student: WebStudent {
                id: "STUD-001".to_string(),
                name: "Demo Student".to_string(),
            },
            health: HealthState {
                start_time: Instant::now(),
                prometheus_render: None,
            },
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            conversation_id: None,
            student_id: None,
            student_name: None,
        }
    }

    #[test]
    fn chat_request_accepts_minimal_json() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(request.message, "hi");
        assert!(request.conversation_id.is_none());
        assert!(request.student_id.is_none());
    }

    #[test]
    fn chat_request_accepts_full_json() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"message": "hi", "conversation_id": "c1", "student_id": "S-9", "student_name": "Ada"}"#,
        )
        .unwrap();
        assert_eq!(request.conversation_id.as_deref(), Some("c1"));
        assert_eq!(request.student_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn simulate_request_parses_platform_names() {
        let request: SimulateRequest =
            serde_json::from_str(r#"{"platform": "WhatsApp", "message": "hi"}"#).unwrap();
        assert_eq!(request.platform, Platform::WhatsApp);
    }

    #[tokio::test]
    async fn health_reports_ok_and_version() {
        let harness = TestHarness::builder().build().await.unwrap();
        let state = state_over(&harness);

        let Json(health) = get_health(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn metrics_route_is_absent_without_recorder() {
        let harness = TestHarness::builder().build().await.unwrap();
        let state = state_over(&harness);

        let response = get_metrics(State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_route_renders_when_installed() {
        let harness = TestHarness::builder().build().await.unwrap();
        let mut state = state_over(&harness);
        state.health.prometheus_render = Some(Arc::new(|| "unidesk_up 1".to_string()));

        let response = get_metrics(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"unidesk_up 1");
    }

    #[tokio::test]
    async fn chat_returns_the_model_reply() {
        let harness = TestHarness::builder()
            .with_replies(vec!["Office hours are 9 to 5.".to_string()])
            .build()
            .await
            .unwrap();
        let state = state_over(&harness);

        let response = post_chat(
            State(state),
            HeaderMap::new(),
            Json(chat_request("When are office hours?")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["reply"], "Office hours are 9 to 5.");
        assert_eq!(body["degraded"], false);
        assert!(!body["conversation_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_chat_message_is_rejected() {
        let harness = TestHarness::builder().build().await.unwrap();
        let state = state_over(&harness);

        let response = post_chat(State(state), HeaderMap::new(), Json(chat_request("   "))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn chat_reuses_an_existing_conversation() {
        let harness = TestHarness::builder()
            .with_replies(vec!["first".to_string(), "second".to_string()])
            .build()
            .await
            .unwrap();
        let state = state_over(&harness);

        let first = body_json(
            post_chat(
                State(state.clone()),
                HeaderMap::new(),
                Json(chat_request("hello")),
            )
            .await,
        )
        .await;
        let id = first["conversation_id"].as_str().unwrap().to_string();

        let mut followup = chat_request("and again");
        followup.conversation_id = Some(id.clone());
        let second = body_json(post_chat(State(state), HeaderMap::new(), Json(followup)).await).await;

        assert_eq!(second["conversation_id"], id.as_str());
        let record = harness.store.conversation(&id).await.unwrap().unwrap();
        assert_eq!(record.messages.len(), 4);
    }

    #[tokio::test]
    async fn chat_adopts_an_unknown_conversation_id() {
        let harness = TestHarness::builder().build().await.unwrap();
        let state = state_over(&harness);

        let mut request = chat_request("hello");
        request.conversation_id = Some("ext-42".to_string());
        let body = body_json(post_chat(State(state), HeaderMap::new(), Json(request)).await).await;

        assert_eq!(body["conversation_id"], "ext-42");
        assert!(harness
            .store
            .conversation("ext-42")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn conversation_routes_roundtrip() {
        let harness = TestHarness::builder().build().await.unwrap();
        let state = state_over(&harness);

        let chat = body_json(
            post_chat(
                State(state.clone()),
                HeaderMap::new(),
                Json(chat_request("hello")),
            )
            .await,
        )
        .await;
        let id = chat["conversation_id"].as_str().unwrap().to_string();

        let listed = body_json(list_conversations(State(state.clone())).await).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let fetched = get_conversation(State(state.clone()), Path(id.clone())).await;
        assert_eq!(fetched.status(), StatusCode::OK);

        let updated = put_conversation_status(
            State(state.clone()),
            Path(id.clone()),
            Json(StatusRequest {
                status: TicketStatus::Resolved,
            }),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::NO_CONTENT);
        let record = harness.store.conversation(&id).await.unwrap().unwrap();
        assert_eq!(record.status, TicketStatus::Resolved);

        let deleted = delete_conversation(State(state.clone()), Path(id.clone())).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        let missing = get_conversation(State(state), Path(id)).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn faq_routes_roundtrip() {
        let harness = TestHarness::builder().build().await.unwrap();
        let state = state_over(&harness);
        let seeded = harness.kb.list().await.unwrap().len();

        let created = post_faq(
            State(state.clone()),
            Json(FaqRequest {
                question: "Where is the library?".to_string(),
                answer: "Central campus, building C.".to_string(),
                category: Category::Other,
            }),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let faq = body_json(created).await;
        let id = faq["id"].as_str().unwrap().to_string();

        let listed = body_json(list_faqs(State(state.clone())).await).await;
        assert_eq!(listed.as_array().unwrap().len(), seeded + 1);

        let deleted = delete_faq(State(state.clone()), Path(id)).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        let listed = body_json(list_faqs(State(state)).await).await;
        assert_eq!(listed.as_array().unwrap().len(), seeded);
    }

    #[tokio::test]
    async fn blank_faq_is_rejected() {
        let harness = TestHarness::builder().build().await.unwrap();
        let state = state_over(&harness);

        let response = post_faq(
            State(state),
            Json(FaqRequest {
                question: "  ".to_string(),
                answer: "something".to_string(),
                category: Category::Other,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn simulate_creates_a_prefixed_conversation() {
        let harness = TestHarness::builder()
            .with_replies(vec!["Use the portal.".to_string()])
            .build()
            .await
            .unwrap();
        let state = state_over(&harness);

        let response = post_simulate(
            State(state),
            Json(SimulateRequest {
                platform: Platform::WhatsApp,
                message: "How do I pay fees?".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let id = body["conversation_id"].as_str().unwrap();
        assert!(id.starts_with("wa-"));
        assert_eq!(body["reply"], "Use the portal.");
        assert_eq!(body["incoming"]["direction"], "WEBHOOK_INCOMING");
        assert_eq!(body["outgoing"]["direction"], "WEBHOOK_OUTGOING");
        assert!(harness.store.conversation(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn analytics_reflects_stored_conversations() {
        let harness = TestHarness::builder()
            .with_replies(vec!["a".to_string(), "b".to_string()])
            .build()
            .await
            .unwrap();
        let state = state_over(&harness);

        for text in ["first question", "second question"] {
            post_chat(State(state.clone()), HeaderMap::new(), Json(chat_request(text))).await;
        }

        let body = body_json(get_analytics(State(state)).await).await;
        assert_eq!(body["totalQueries"], 2);
        assert_eq!(body["open"], 2);
    }

    #[tokio::test]
    async fn reset_restores_seed_data() {
        let harness = TestHarness::builder().build().await.unwrap();
        let state = state_over(&harness);

        post_chat(
            State(state.clone()),
            HeaderMap::new(),
            Json(chat_request("hello")),
        )
        .await;
        assert_eq!(harness.store.conversations().await.unwrap().len(), 1);

        let response = post_reset(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(harness.store.conversations().await.unwrap().is_empty());
        assert!(!harness.kb.list().await.unwrap().is_empty());
    }
}
