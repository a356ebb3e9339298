// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed helpdesk collections over the raw kv table.
//!
//! Two collections exist: `faqs` and `conversations`. Every mutation reads
//! the full collection, applies the change in memory, and writes the whole
//! payload back. A failed write leaves the previous payload untouched.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use unidesk_core::types::{Category, Conversation, Faq, TicketStatus};
use unidesk_core::UnideskError;

use crate::database::Database;
use crate::kv;

pub const FAQS_COLLECTION: &str = "faqs";
pub const CONVERSATIONS_COLLECTION: &str = "conversations";

/// Persistence gateway for the helpdesk's two record collections.
#[derive(Clone)]
pub struct HelpdeskStore {
    db: Database,
}

impl HelpdeskStore {
    /// Wraps an already-open database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens (creating if needed) the database at `path`.
    pub async fn open(path: &str) -> Result<Self, UnideskError> {
        Ok(Self::new(Database::open(path).await?))
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// All FAQ entries in insertion order. A store that has never been
    /// written seeds with the default entries.
    pub async fn faqs(&self) -> Result<Vec<Faq>, UnideskError> {
        match self.read_collection::<Faq>(FAQS_COLLECTION).await? {
            Some(faqs) => Ok(faqs),
            None => Ok(default_faqs()),
        }
    }

    /// Replaces the FAQ collection wholesale.
    pub async fn save_faqs(&self, faqs: &[Faq]) -> Result<(), UnideskError> {
        self.write_collection(FAQS_COLLECTION, faqs).await
    }

    /// All conversations, most-recently-created-first.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, UnideskError> {
        Ok(self
            .read_collection::<Conversation>(CONVERSATIONS_COLLECTION)
            .await?
            .unwrap_or_default())
    }

    /// Looks up a single conversation by id.
    pub async fn conversation(&self, id: &str) -> Result<Option<Conversation>, UnideskError> {
        Ok(self
            .conversations()
            .await?
            .into_iter()
            .find(|c| c.id == id))
    }

    /// Upserts one conversation: an existing record with the same id is
    /// replaced in place, otherwise the record is prepended so the newest
    /// conversation lists first.
    pub async fn save_conversation(&self, conversation: &Conversation) -> Result<(), UnideskError> {
        let mut conversations = self.conversations().await?;
        match conversations.iter_mut().find(|c| c.id == conversation.id) {
            Some(slot) => *slot = conversation.clone(),
            None => conversations.insert(0, conversation.clone()),
        }
        self.write_collection(CONVERSATIONS_COLLECTION, &conversations)
            .await
    }

    /// Removes the conversation with the given id. Unknown ids are a no-op.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), UnideskError> {
        let mut conversations = self.conversations().await?;
        let before = conversations.len();
        conversations.retain(|c| c.id != id);
        if conversations.len() == before {
            return Ok(());
        }
        debug!(conversation_id = %id, "conversation deleted");
        self.write_collection(CONVERSATIONS_COLLECTION, &conversations)
            .await
    }

    /// Updates one conversation's ticket status. Unknown ids are a no-op.
    pub async fn set_status(&self, id: &str, status: TicketStatus) -> Result<(), UnideskError> {
        let mut conversations = self.conversations().await?;
        let Some(conversation) = conversations.iter_mut().find(|c| c.id == id) else {
            return Ok(());
        };
        conversation.status = status;
        debug!(conversation_id = %id, status = %status, "ticket status updated");
        self.write_collection(CONVERSATIONS_COLLECTION, &conversations)
            .await
    }

    /// Clears both collections back to their seeded state: default FAQs,
    /// no conversations. Safe to call repeatedly.
    pub async fn reset(&self) -> Result<(), UnideskError> {
        kv::delete(&self.db, FAQS_COLLECTION).await?;
        kv::delete(&self.db, CONVERSATIONS_COLLECTION).await?;
        debug!("store reset to seeded state");
        Ok(())
    }

    async fn read_collection<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Option<Vec<T>>, UnideskError> {
        match kv::get(&self.db, collection).await? {
            Some(payload) => {
                let records = serde_json::from_str(&payload).map_err(UnideskError::storage)?;
                Ok(Some(records))
            }
            None => Ok(None),
        }
    }

    async fn write_collection<T: Serialize>(
        &self,
        collection: &str,
        records: &[T],
    ) -> Result<(), UnideskError> {
        let payload = serde_json::to_string(records).map_err(UnideskError::storage)?;
        kv::put(&self.db, collection, &payload).await
    }
}

/// The FAQ set a fresh install starts with.
pub fn default_faqs() -> Vec<Faq> {
    vec![
        Faq {
            id: "1".to_string(),
            question: "How do I apply for admission?".to_string(),
            answer: "You can apply through our online portal at admissions.university.edu."
                .to_string(),
            category: Category::Admissions,
        },
        Faq {
            id: "2".to_string(),
            question: "What is the fee for Computer Science?".to_string(),
            answer: "The annual fee for CS is $5,000 per year.".to_string(),
            category: Category::FeesFinance,
        },
        Faq {
            id: "3".to_string(),
            question: "When are the mid-term exams?".to_string(),
            answer: "Mid-term exams usually start in the second week of October.".to_string(),
            category: Category::Exams,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use unidesk_core::types::{Message, MessageRole, Platform, Sentiment};

    async fn setup_store() -> (HelpdeskStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("store_test.db");
        let store = HelpdeskStore::open(db_path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }

    fn make_conversation(id: &str) -> Conversation {
        let mut conversation =
            Conversation::new(id, "STUD-001", "Demo Student", Platform::Web);
        conversation
            .messages
            .push(Message::new(MessageRole::User, "hello"));
        conversation
    }

    #[tokio::test]
    async fn fresh_store_seeds_three_default_faqs() {
        let (store, _dir) = setup_store().await;
        let faqs = store.faqs().await.unwrap();
        assert_eq!(faqs.len(), 3);
        assert_eq!(faqs[0].question, "How do I apply for admission?");
        assert_eq!(faqs[1].category, Category::FeesFinance);
        assert_eq!(faqs[2].category, Category::Exams);
    }

    #[tokio::test]
    async fn save_faqs_replaces_whole_collection() {
        let (store, _dir) = setup_store().await;
        let mut faqs = store.faqs().await.unwrap();
        faqs.remove(0);
        store.save_faqs(&faqs).await.unwrap();

        let reloaded = store.faqs().await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0].id, "2");
    }

    #[tokio::test]
    async fn fresh_store_has_no_conversations() {
        let (store, _dir) = setup_store().await;
        assert!(store.conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_conversation_prepends_new_records() {
        let (store, _dir) = setup_store().await;
        store
            .save_conversation(&make_conversation("first"))
            .await
            .unwrap();
        store
            .save_conversation(&make_conversation("second"))
            .await
            .unwrap();

        let conversations = store.conversations().await.unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].id, "second");
        assert_eq!(conversations[1].id, "first");
    }

    #[tokio::test]
    async fn save_conversation_replaces_in_place_by_id() {
        let (store, _dir) = setup_store().await;
        store
            .save_conversation(&make_conversation("a"))
            .await
            .unwrap();
        store
            .save_conversation(&make_conversation("b"))
            .await
            .unwrap();

        let mut updated = make_conversation("a");
        updated.messages.push(Message::new(MessageRole::Bot, "hi"));
        store.save_conversation(&updated).await.unwrap();

        let conversations = store.conversations().await.unwrap();
        assert_eq!(conversations.len(), 2, "upsert must not duplicate");
        // Position is preserved: "a" stays behind the more recent "b".
        assert_eq!(conversations[0].id, "b");
        assert_eq!(conversations[1].id, "a");
        assert_eq!(conversations[1].messages.len(), 2);
    }

    #[tokio::test]
    async fn conversation_lookup_by_id() {
        let (store, _dir) = setup_store().await;
        store
            .save_conversation(&make_conversation("findme"))
            .await
            .unwrap();

        assert!(store.conversation("findme").await.unwrap().is_some());
        assert!(store.conversation("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_matching_id() {
        let (store, _dir) = setup_store().await;
        store
            .save_conversation(&make_conversation("keep"))
            .await
            .unwrap();
        store
            .save_conversation(&make_conversation("drop"))
            .await
            .unwrap();

        store.delete_conversation("drop").await.unwrap();

        let conversations = store.conversations().await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id, "keep");
    }

    #[tokio::test]
    async fn delete_unknown_id_is_a_noop() {
        let (store, _dir) = setup_store().await;
        store
            .save_conversation(&make_conversation("only"))
            .await
            .unwrap();

        store.delete_conversation("never-existed").await.unwrap();
        assert_eq!(store.conversations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_status_updates_single_record() {
        let (store, _dir) = setup_store().await;
        store
            .save_conversation(&make_conversation("t1"))
            .await
            .unwrap();
        store
            .save_conversation(&make_conversation("t2"))
            .await
            .unwrap();

        store
            .set_status("t1", TicketStatus::Resolved)
            .await
            .unwrap();

        let t1 = store.conversation("t1").await.unwrap().unwrap();
        let t2 = store.conversation("t2").await.unwrap().unwrap();
        assert_eq!(t1.status, TicketStatus::Resolved);
        assert_eq!(t2.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn set_status_unknown_id_is_a_noop() {
        let (store, _dir) = setup_store().await;
        store
            .set_status("missing", TicketStatus::Escalated)
            .await
            .unwrap();
        assert!(store.conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_restores_seeded_state_and_is_idempotent() {
        let (store, _dir) = setup_store().await;

        // Dirty both collections.
        store.save_faqs(&[]).await.unwrap();
        store
            .save_conversation(&make_conversation("gone-after-reset"))
            .await
            .unwrap();

        store.reset().await.unwrap();
        assert_eq!(store.faqs().await.unwrap().len(), 3);
        assert!(store.conversations().await.unwrap().is_empty());

        // Resetting an already-reset store changes nothing.
        store.reset().await.unwrap();
        assert_eq!(store.faqs().await.unwrap().len(), 3);
        assert!(store.conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conversation_roundtrips_all_fields() {
        let (store, _dir) = setup_store().await;
        let mut original = make_conversation("full");
        original.sentiment = Sentiment::Negative;
        original.category = Category::TechnicalSupport;
        original.status = TicketStatus::Escalated;
        original.platform = Platform::WhatsApp;
        store.save_conversation(&original).await.unwrap();

        let stored = store.conversation("full").await.unwrap().unwrap();
        assert_eq!(stored, original);
    }
}
