// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FAQ knowledge base for the Unidesk helpdesk agent.
//!
//! Entries live in the persistence gateway's `faqs` collection; every
//! mutation writes the full collection back. The knowledge base also renders
//! the grounding context block the model receives with each query.

use std::sync::Arc;

use tracing::debug;
use unidesk_core::types::{Category, Faq};
use unidesk_core::UnideskError;
use unidesk_storage::HelpdeskStore;

/// Editable FAQ collection plus model-context rendering.
#[derive(Clone)]
pub struct KnowledgeBase {
    store: Arc<HelpdeskStore>,
}

impl KnowledgeBase {
    pub fn new(store: Arc<HelpdeskStore>) -> Self {
        Self { store }
    }

    /// All entries in insertion order.
    pub async fn list(&self) -> Result<Vec<Faq>, UnideskError> {
        self.store.faqs().await
    }

    /// Appends a new entry. A blank question or answer is rejected: the
    /// call returns `Ok(None)` and writes nothing.
    pub async fn add(
        &self,
        question: &str,
        answer: &str,
        category: Category,
    ) -> Result<Option<Faq>, UnideskError> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            debug!("ignoring FAQ entry with blank question or answer");
            return Ok(None);
        }

        let entry = Faq {
            id: uuid::Uuid::new_v4().to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            category,
        };

        let mut faqs = self.store.faqs().await?;
        faqs.push(entry.clone());
        self.store.save_faqs(&faqs).await?;
        debug!(faq_id = %entry.id, category = %entry.category, "FAQ entry added");
        Ok(Some(entry))
    }

    /// Removes the entry with the given id. Unknown ids are a no-op.
    pub async fn remove(&self, id: &str) -> Result<(), UnideskError> {
        let mut faqs = self.store.faqs().await?;
        let before = faqs.len();
        faqs.retain(|f| f.id != id);
        if faqs.len() == before {
            return Ok(());
        }
        debug!(faq_id = %id, "FAQ entry removed");
        self.store.save_faqs(&faqs).await
    }

    /// Renders the whole knowledge base as the model's grounding context.
    pub async fn context_block(&self) -> Result<String, UnideskError> {
        Ok(render_context(&self.store.faqs().await?))
    }
}

/// One `Q:`/`A:` paragraph per entry, separated by `---` lines.
pub fn render_context(faqs: &[Faq]) -> String {
    faqs.iter()
        .map(|f| format!("Q: {}\nA: {}", f.question, f.answer))
        .collect::<Vec<_>>()
        .join("\n---\n")
}
