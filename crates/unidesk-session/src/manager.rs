// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session manager.
//!
//! `SessionManager` runs one chat exchange end to end: accept a query,
//! append the user turn immediately, produce the answer (whole or as an
//! ordered delta stream) while classifying the query alongside, then
//! persist the merged conversation record exactly once after everything
//! settles. Model failures degrade to documented defaults and never
//! abort the exchange; only storage failures propagate.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use unidesk_core::types::now_ms;
use unidesk_core::{
    Conversation, LanguageModel, Message, MessageRole, QueryAnalysis, Sentiment, TicketStatus,
    UnideskError,
};
use unidesk_kb::KnowledgeBase;
use unidesk_storage::HelpdeskStore;

use crate::metrics;
use crate::session::ChatSession;

/// Fixed user-facing text shown when generation fails outright.
pub const FALLBACK_ANSWER: &str =
    "An error occurred while processing your request. Please try again later.";

/// How the answer is delivered to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    /// One call returning the full text.
    Complete,
    /// An ordered stream of text deltas.
    Streaming,
}

impl AnswerMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Streaming => "streaming",
        }
    }
}

/// Progress notifications emitted while an exchange runs.
///
/// Event order for a streamed exchange: `QueryAccepted`, `AnswerStarted`,
/// zero or more `AnswerDelta`, `AnswerCompleted`, `Saved`. Complete mode
/// skips `AnswerStarted` and `AnswerDelta`.
#[derive(Debug, Clone)]
pub enum ExchangeEvent {
    /// The user turn was appended to the session.
    QueryAccepted { message: Message },
    /// An empty bot turn was appended; deltas will fill it.
    AnswerStarted { message: Message },
    /// One delta arrived. `text` is the running total after applying it.
    AnswerDelta {
        message_id: String,
        delta: String,
        text: String,
    },
    /// The bot turn reached its final text.
    AnswerCompleted { message: Message, degraded: bool },
    /// The conversation record was written to storage.
    Saved { conversation: Conversation },
}

/// Why a submission was ignored without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The query was blank or whitespace-only.
    BlankQuery,
    /// Another exchange for this session has not settled yet.
    ExchangeInFlight,
}

/// Everything a completed exchange produced.
#[derive(Debug, Clone)]
pub struct ExchangeReport {
    /// The record as persisted, including both new turns.
    pub conversation: Conversation,
    pub user_message: Message,
    pub bot_message: Message,
    pub analysis: QueryAnalysis,
    /// Generation fell back to the apology text or a partial stream.
    pub generation_degraded: bool,
    /// Classification fell back to `{Other, Neutral}`.
    pub classification_degraded: bool,
}

/// Outcome of a `submit_query` call.
#[derive(Debug, Clone)]
pub enum Submission {
    /// The exchange ran and the conversation was persisted.
    Completed(ExchangeReport),
    /// Nothing happened: no message appended, nothing persisted.
    Ignored(IgnoreReason),
}

/// Runs chat exchanges against a language model, knowledge base, and store.
///
/// Cloning is cheap; clones share the in-flight guard so the
/// at-most-one-exchange-per-session rule holds across callers.
#[derive(Clone)]
pub struct SessionManager {
    model: Arc<dyn LanguageModel>,
    store: Arc<HelpdeskStore>,
    kb: KnowledgeBase,
    inflight: Arc<DashMap<String, ()>>,
}

/// Removes the session's in-flight mark when the exchange settles or
/// its future is dropped.
struct InflightGuard<'a> {
    inflight: &'a DashMap<String, ()>,
    session_id: String,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.inflight.remove(&self.session_id);
    }
}

impl SessionManager {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        store: Arc<HelpdeskStore>,
        kb: KnowledgeBase,
    ) -> Self {
        Self {
            model,
            store,
            kb,
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// Runs one exchange for the given session.
    ///
    /// The user turn is appended to `session.messages` before any model
    /// call; in streaming mode the bot turn is appended empty and grows
    /// as deltas arrive, so the caller can render `session.messages`
    /// directly at any point. Progress is also reported through `events`
    /// when a sender is supplied.
    ///
    /// Blank queries and submissions while another exchange is in flight
    /// return [`Submission::Ignored`] and leave no trace. Dropping the
    /// returned future cancels the exchange: delta application stops and
    /// nothing is persisted.
    pub async fn submit_query(
        &self,
        session: &mut ChatSession,
        query_text: &str,
        mode: AnswerMode,
        events: Option<mpsc::UnboundedSender<ExchangeEvent>>,
    ) -> Result<Submission, UnideskError> {
        if query_text.trim().is_empty() {
            debug!(session_id = %session.id, "ignoring blank query");
            metrics::record_ignored("blank_query");
            return Ok(Submission::Ignored(IgnoreReason::BlankQuery));
        }

        let _guard = match self.inflight.entry(session.id.clone()) {
            Entry::Occupied(_) => {
                warn!(session_id = %session.id, "exchange already in flight, ignoring submission");
                metrics::record_ignored("in_flight");
                return Ok(Submission::Ignored(IgnoreReason::ExchangeInFlight));
            }
            Entry::Vacant(entry) => {
                entry.insert(());
                InflightGuard {
                    inflight: &self.inflight,
                    session_id: session.id.clone(),
                }
            }
        };

        let started = Instant::now();
        let session_id = session.id.clone();

        // Prior turns only; the new query is passed to the model separately.
        let history = session.messages.clone();

        let user_message = Message::new(MessageRole::User, query_text);
        session.messages.push(user_message.clone());
        emit(
            &events,
            ExchangeEvent::QueryAccepted {
                message: user_message.clone(),
            },
        );

        let context = self.kb.context_block().await?;

        let ((analysis, classification_degraded), (bot_index, generation_degraded)) = tokio::join!(
            self.classify_or_default(&session_id, query_text),
            self.produce_answer(
                &session_id,
                &mut session.messages,
                query_text,
                &history,
                &context,
                mode,
                &events,
            ),
        );

        let prior_status = self
            .store
            .conversation(&session_id)
            .await?
            .map(|record| record.status);
        let status = merge_status(prior_status, analysis.sentiment);

        let conversation = Conversation {
            id: session_id.clone(),
            student_id: session.student_id.clone(),
            student_name: session.student_name.clone(),
            messages: session.messages.clone(),
            category: analysis.category,
            sentiment: analysis.sentiment,
            platform: session.platform,
            last_activity: now_ms(),
            status,
        };
        self.store.save_conversation(&conversation).await?;
        emit(
            &events,
            ExchangeEvent::Saved {
                conversation: conversation.clone(),
            },
        );

        info!(
            session_id = %session_id,
            category = %analysis.category,
            sentiment = %analysis.sentiment,
            status = %status,
            "exchange persisted"
        );
        metrics::record_exchange(&session.platform.to_string(), mode.as_str());
        metrics::record_exchange_duration(started.elapsed().as_secs_f64());

        let bot_message = session.messages[bot_index].clone();
        Ok(Submission::Completed(ExchangeReport {
            conversation,
            user_message,
            bot_message,
            analysis,
            generation_degraded,
            classification_degraded,
        }))
    }

    /// Classifies the query, falling back to `{Other, Neutral}` on failure.
    async fn classify_or_default(&self, session_id: &str, query: &str) -> (QueryAnalysis, bool) {
        match self.model.classify(query).await {
            Ok(analysis) => (analysis, false),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "classification failed, using defaults");
                metrics::record_degraded("classification");
                (QueryAnalysis::default(), true)
            }
        }
    }

    /// Produces the bot turn and appends it to `messages`.
    ///
    /// Returns the bot message's index and whether the answer degraded.
    /// Never fails: generation errors turn into the fallback text and a
    /// mid-stream failure keeps whatever text already arrived.
    #[allow(clippy::too_many_arguments)]
    async fn produce_answer(
        &self,
        session_id: &str,
        messages: &mut Vec<Message>,
        query: &str,
        history: &[Message],
        context: &str,
        mode: AnswerMode,
        events: &Option<mpsc::UnboundedSender<ExchangeEvent>>,
    ) -> (usize, bool) {
        match mode {
            AnswerMode::Complete => {
                let (text, degraded) = match self.model.generate(query, history, context).await {
                    Ok(text) => (text, false),
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "generation failed, sending fallback answer");
                        metrics::record_degraded("generation");
                        (FALLBACK_ANSWER.to_string(), true)
                    }
                };
                messages.push(Message::new(MessageRole::Bot, text));
                let index = messages.len() - 1;
                emit(
                    events,
                    ExchangeEvent::AnswerCompleted {
                        message: messages[index].clone(),
                        degraded,
                    },
                );
                (index, degraded)
            }
            AnswerMode::Streaming => {
                let bot = Message::new(MessageRole::Bot, "");
                emit(
                    events,
                    ExchangeEvent::AnswerStarted {
                        message: bot.clone(),
                    },
                );
                messages.push(bot);
                let index = messages.len() - 1;

                let mut text = String::new();
                let mut degraded = false;

                match self.model.generate_stream(query, history, context).await {
                    Ok(mut stream) => {
                        while let Some(item) = stream.next().await {
                            match item {
                                Ok(delta) => {
                                    text.push_str(&delta);
                                    messages[index].text = text.clone();
                                    emit(
                                        events,
                                        ExchangeEvent::AnswerDelta {
                                            message_id: messages[index].id.clone(),
                                            delta,
                                            text: text.clone(),
                                        },
                                    );
                                }
                                Err(e) => {
                                    warn!(session_id = %session_id, error = %e, "stream failed mid-answer, keeping partial text");
                                    metrics::record_degraded("stream");
                                    degraded = true;
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "stream could not start");
                        metrics::record_degraded("stream");
                        degraded = true;
                    }
                }

                // A failure before the first delta leaves nothing to show;
                // use the fixed apology rather than an empty bubble.
                if degraded && text.is_empty() {
                    messages[index].text = FALLBACK_ANSWER.to_string();
                }

                emit(
                    events,
                    ExchangeEvent::AnswerCompleted {
                        message: messages[index].clone(),
                        degraded,
                    },
                );
                (index, degraded)
            }
        }
    }
}

/// Merges the classified sentiment with any previously stored status.
///
/// Negative sentiment always escalates. Otherwise a Resolved or
/// Escalated record keeps its status; nothing ever moves back to Open,
/// and a Positive turn does not auto-resolve.
fn merge_status(prior: Option<TicketStatus>, sentiment: Sentiment) -> TicketStatus {
    if sentiment == Sentiment::Negative {
        return TicketStatus::Escalated;
    }
    match prior {
        Some(TicketStatus::Resolved) => TicketStatus::Resolved,
        Some(TicketStatus::Escalated) => TicketStatus::Escalated,
        _ => TicketStatus::Open,
    }
}

fn emit(events: &Option<mpsc::UnboundedSender<ExchangeEvent>>, event: ExchangeEvent) {
    if let Some(tx) = events {
        // A dropped receiver means the caller stopped listening;
        // the exchange itself still runs to completion.
        let _ = tx.send(event);
    }
}
