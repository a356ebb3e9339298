// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events streaming for the chat route.
//!
//! Wire format, one SSE event per line group:
//!
//! ```text
//! event: text_delta
//! data: {"text": "..."}
//!
//! event: message_stop
//! data: {"content": "...", "conversation_id": "...", "status": "Open"}
//!
//! event: error
//! data: {"error": "..."}
//! ```
//!
//! `text_delta` carries each answer fragment as it arrives, `message_stop`
//! fires once after the exchange is persisted, and `error` replaces
//! `message_stop` when the submission was rejected or failed outright.

use std::convert::Infallible;

use axum::response::sse::{Event, Sse};
use futures::{Stream, stream};
use tokio::sync::mpsc;

use unidesk_session::{AnswerMode, ExchangeEvent, IgnoreReason, Submission};

use crate::handlers::{ChatRequest, ignored_reason_message, resolve_session};
use crate::server::AppState;

/// One item on the wire before SSE encoding.
enum ChatStreamItem {
    Progress(ExchangeEvent),
    Rejected(IgnoreReason),
    Failed(String),
}

/// Runs the exchange in a background task and streams its events.
///
/// The exchange keeps running even if the client disconnects mid-stream,
/// so the conversation is persisted either way.
pub async fn stream_chat(
    state: AppState,
    request: ChatRequest,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (item_tx, item_rx) = mpsc::unbounded_channel::<ChatStreamItem>();

    match resolve_session(&state, &request).await {
        Ok(mut session) => {
            let manager = state.manager.clone();
            let message = request.message.clone();
            let task_tx = item_tx.clone();
            tokio::spawn(async move {
                let (event_tx, mut event_rx) = mpsc::unbounded_channel();
                let forward_tx = task_tx.clone();
                let forwarder = tokio::spawn(async move {
                    while let Some(event) = event_rx.recv().await {
                        let _ = forward_tx.send(ChatStreamItem::Progress(event));
                    }
                });

                let result = manager
                    .submit_query(&mut session, &message, AnswerMode::Streaming, Some(event_tx))
                    .await;
                // The event sender is dropped once submit_query returns, so
                // the forwarder drains everything before the terminal item.
                let _ = forwarder.await;

                match result {
                    Ok(Submission::Completed(_)) => {}
                    Ok(Submission::Ignored(reason)) => {
                        let _ = task_tx.send(ChatStreamItem::Rejected(reason));
                    }
                    Err(e) => {
                        let _ = task_tx.send(ChatStreamItem::Failed(e.to_string()));
                    }
                }
            });
        }
        Err(e) => {
            let _ = item_tx.send(ChatStreamItem::Failed(e.to_string()));
        }
    }
    drop(item_tx);

    let events = stream::unfold(item_rx, |mut rx| async move {
        loop {
            let item = rx.recv().await?;
            if let Some((name, data)) = describe_item(item) {
                return Some((Ok::<_, Infallible>(Event::default().event(name).data(data)), rx));
            }
        }
    });
    Sse::new(events)
}

/// Maps a stream item to its SSE event name and JSON payload.
///
/// Progress events with no wire representation map to `None`.
fn describe_item(item: ChatStreamItem) -> Option<(&'static str, String)> {
    match item {
        ChatStreamItem::Progress(ExchangeEvent::AnswerDelta { delta, .. }) => {
            Some(("text_delta", serde_json::json!({ "text": delta }).to_string()))
        }
        ChatStreamItem::Progress(ExchangeEvent::Saved { conversation }) => {
            let content = conversation
                .messages
                .last()
                .map(|m| m.text.clone())
                .unwrap_or_default();
            let data = serde_json::json!({
                "content": content,
                "conversation_id": conversation.id,
                "status": conversation.status,
            });
            Some(("message_stop", data.to_string()))
        }
        ChatStreamItem::Progress(_) => None,
        ChatStreamItem::Rejected(reason) => {
            let data = serde_json::json!({ "error": ignored_reason_message(reason) });
            Some(("error", data.to_string()))
        }
        ChatStreamItem::Failed(message) => {
            Some(("error", serde_json::json!({ "error": message }).to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use unidesk_core::{Message, MessageRole, Platform};

    use super::*;

    fn delta_item(delta: &str) -> ChatStreamItem {
        ChatStreamItem::Progress(ExchangeEvent::AnswerDelta {
            message_id: "m1".to_string(),
            delta: delta.to_string(),
            text: delta.to_string(),
        })
    }

    #[test]
    fn deltas_become_text_delta_events() {
        let (name, data) = describe_item(delta_item("Hel")).unwrap();
        assert_eq!(name, "text_delta");
        assert_eq!(data, r#"{"text":"Hel"}"#);
    }

    #[test]
    fn saved_becomes_message_stop_with_the_final_answer() {
        let mut conversation =
            unidesk_core::Conversation::new("c-9", "S-1", "Sam", Platform::Web);
        conversation
            .messages
            .push(Message::new(MessageRole::User, "hi"));
        conversation
            .messages
            .push(Message::new(MessageRole::Bot, "Hello there."));

        let (name, data) = describe_item(ChatStreamItem::Progress(ExchangeEvent::Saved {
            conversation,
        }))
        .unwrap();
        assert_eq!(name, "message_stop");

        let body: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(body["content"], "Hello there.");
        assert_eq!(body["conversation_id"], "c-9");
        assert_eq!(body["status"], "Open");
    }

    #[test]
    fn rejections_become_error_events() {
        let (name, data) = describe_item(ChatStreamItem::Rejected(IgnoreReason::BlankQuery)).unwrap();
        assert_eq!(name, "error");
        assert!(data.contains("blank"));
    }

    #[test]
    fn intermediate_progress_events_are_silent() {
        let message = Message::new(MessageRole::User, "hi");
        let item = ChatStreamItem::Progress(ExchangeEvent::QueryAccepted { message });
        assert!(describe_item(item).is_none());
    }
}
