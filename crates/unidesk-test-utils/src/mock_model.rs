// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model for deterministic testing.
//!
//! `MockModel` implements `LanguageModel` with scripted replies and
//! classifications, enabling fast, CI-runnable tests without Gemini
//! API calls. Every generation call is recorded so tests can assert
//! on the query, history, and context the session manager passed in.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use unidesk_core::{LanguageModel, Message, QueryAnalysis, TextStream, UnideskError};

/// One scripted answer, popped per generation call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Full text returned at once (streamed as a single delta).
    Text(String),
    /// An ordered delta sequence; joined into one string for sync calls.
    Deltas(Vec<String>),
    /// Deltas delivered before the stream fails. Sync calls fail outright.
    FailAfter(Vec<String>),
    /// The call itself fails with this message.
    Failure(String),
}

/// A captured `generate`/`generate_stream` invocation.
#[derive(Debug, Clone)]
pub struct RecordedGenerateCall {
    pub query: String,
    pub history_len: usize,
    pub context: String,
    pub streaming: bool,
}

/// A mock language model that returns scripted replies.
///
/// Replies and classifications are popped from FIFO queues. When a
/// queue is empty, `generate` falls back to a fixed "mock response"
/// text and `classify` to the default `{Other, Neutral}` analysis.
pub struct MockModel {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    analyses: Arc<Mutex<VecDeque<Result<QueryAnalysis, UnideskError>>>>,
    generate_calls: Arc<Mutex<Vec<RecordedGenerateCall>>>,
    classify_calls: Arc<Mutex<Vec<String>>>,
}

impl MockModel {
    /// Create a new mock model with empty queues.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            analyses: Arc::new(Mutex::new(VecDeque::new())),
            generate_calls: Arc::new(Mutex::new(Vec::new())),
            classify_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock model pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            analyses: Arc::new(Mutex::new(VecDeque::new())),
            generate_calls: Arc::new(Mutex::new(Vec::new())),
            classify_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a plain-text reply to the end of the queue.
    pub async fn add_reply(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .await
            .push_back(MockReply::Text(text.into()));
    }

    /// Add a scripted reply to the end of the queue.
    pub async fn add_scripted(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Queue a classification result.
    pub async fn add_analysis(&self, analysis: QueryAnalysis) {
        self.analyses.lock().await.push_back(Ok(analysis));
    }

    /// Queue a classification failure.
    pub async fn fail_next_analysis(&self, message: impl Into<String>) {
        self.analyses
            .lock()
            .await
            .push_back(Err(UnideskError::model(message)));
    }

    /// All recorded generation calls, in invocation order.
    pub async fn generate_calls(&self) -> Vec<RecordedGenerateCall> {
        self.generate_calls.lock().await.clone()
    }

    /// All queries passed to `classify`, in invocation order.
    pub async fn classify_calls(&self) -> Vec<String> {
        self.classify_calls.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Text("mock response".to_string()))
    }

    async fn record_generate(&self, query: &str, history: &[Message], context: &str, streaming: bool) {
        self.generate_calls.lock().await.push(RecordedGenerateCall {
            query: query.to_string(),
            history_len: history.len(),
            context: context.to_string(),
            streaming,
        });
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn classify(&self, query: &str) -> Result<QueryAnalysis, UnideskError> {
        self.classify_calls.lock().await.push(query.to_string());
        self.analyses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(QueryAnalysis::default()))
    }

    async fn generate(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
    ) -> Result<String, UnideskError> {
        self.record_generate(query, history, context, false).await;
        match self.next_reply().await {
            MockReply::Text(text) => Ok(text),
            MockReply::Deltas(deltas) => Ok(deltas.concat()),
            MockReply::FailAfter(_) | MockReply::Failure(_) => {
                Err(UnideskError::model("mock generation failure"))
            }
        }
    }

    async fn generate_stream(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
    ) -> Result<TextStream, UnideskError> {
        self.record_generate(query, history, context, true).await;
        let items: Vec<Result<String, UnideskError>> = match self.next_reply().await {
            MockReply::Text(text) => vec![Ok(text)],
            MockReply::Deltas(deltas) => deltas.into_iter().map(Ok).collect(),
            MockReply::FailAfter(deltas) => {
                let mut items: Vec<Result<String, UnideskError>> =
                    deltas.into_iter().map(Ok).collect();
                items.push(Err(UnideskError::model("mock stream failure")));
                items
            }
            MockReply::Failure(message) => return Err(UnideskError::model(message)),
        };
        Ok(Box::pin(stream::iter(items)))
    }
}
