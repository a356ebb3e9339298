// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete helpdesk stack: a mock language
//! model, a temp SQLite database, the knowledge base, and the session
//! manager. Provides `ask()` and `ask_streaming()` to drive the full
//! exchange pipeline in tests.

use std::sync::Arc;

use tokio::sync::mpsc;

use unidesk_core::{QueryAnalysis, UnideskError};
use unidesk_kb::KnowledgeBase;
use unidesk_session::{AnswerMode, ChatSession, ExchangeEvent, SessionManager, Submission};
use unidesk_storage::HelpdeskStore;

use crate::mock_model::{MockModel, MockReply};

/// Builder for creating test environments with scripted model behavior.
pub struct TestHarnessBuilder {
    replies: Vec<MockReply>,
    analyses: Vec<QueryAnalysis>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            analyses: Vec::new(),
        }
    }

    /// Queue plain-text replies for the mock model.
    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies.into_iter().map(MockReply::Text).collect();
        self
    }

    /// Queue scripted replies (deltas, failures) for the mock model.
    pub fn with_scripted(mut self, replies: Vec<MockReply>) -> Self {
        self.replies = replies;
        self
    }

    /// Queue classification results for the mock model.
    pub fn with_analyses(mut self, analyses: Vec<QueryAnalysis>) -> Self {
        self.analyses = analyses;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, UnideskError> {
        // Temp directory keeps each harness on its own database.
        let temp_dir = tempfile::TempDir::new().map_err(UnideskError::storage)?;
        let db_path = temp_dir.path().join("helpdesk.db").to_string_lossy().to_string();

        let store = Arc::new(HelpdeskStore::open(&db_path).await?);
        let model = Arc::new(MockModel::with_replies(self.replies));
        for analysis in self.analyses {
            model.add_analysis(analysis).await;
        }

        let kb = KnowledgeBase::new(store.clone());
        let manager = SessionManager::new(model.clone(), store.clone(), kb.clone());

        Ok(TestHarness {
            model,
            store,
            kb,
            manager,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock model and temp storage.
pub struct TestHarness {
    /// The mock language model.
    pub model: Arc<MockModel>,
    /// Helpdesk store over a temp database, cleaned up on drop.
    pub store: Arc<HelpdeskStore>,
    /// Knowledge base over the same store.
    pub kb: KnowledgeBase,
    /// The session manager under test.
    pub manager: SessionManager,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Create a fresh web session with a fixed test identity.
    pub fn session(&self) -> ChatSession {
        ChatSession::new("S-001", "Test Student")
    }

    /// Run one complete-mode exchange.
    pub async fn ask(
        &self,
        session: &mut ChatSession,
        text: &str,
    ) -> Result<Submission, UnideskError> {
        self.manager
            .submit_query(session, text, AnswerMode::Complete, None)
            .await
    }

    /// Run one streaming exchange and collect the events it emitted.
    pub async fn ask_streaming(
        &self,
        session: &mut ChatSession,
        text: &str,
    ) -> Result<(Submission, Vec<ExchangeEvent>), UnideskError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let submission = self
            .manager
            .submit_query(session, text, AnswerMode::Streaming, Some(tx))
            .await?;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        Ok((submission, events))
    }

    /// Queue another reply on the mock model.
    pub async fn add_reply(&self, text: impl Into<String>) {
        self.model.add_reply(text).await;
    }
}
