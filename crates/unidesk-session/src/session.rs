// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation session state.
//!
//! A `ChatSession` is the mutable side of one conversation: the turn
//! sequence a view renders plus the identity fields that end up in the
//! persisted `Conversation` record. Returning conversations are
//! rehydrated from storage; new ones start empty.

use unidesk_core::{Conversation, Message, Platform};
use uuid::Uuid;

/// Mutable in-memory state for one conversation session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// Conversation id; simulated channels carry a platform prefix.
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub platform: Platform,
    /// Full turn sequence, oldest first.
    pub messages: Vec<Message>,
}

impl ChatSession {
    /// Creates a fresh web session with a random id and no history.
    pub fn new(student_id: impl Into<String>, student_name: impl Into<String>) -> Self {
        Self::for_platform(Platform::Web, student_id, student_name)
    }

    /// Creates a fresh session attributed to the given platform.
    ///
    /// Simulated channels get a prefixed id so their records are
    /// recognizable as webhook-originated in the history view.
    pub fn for_platform(
        platform: Platform,
        student_id: impl Into<String>,
        student_name: impl Into<String>,
    ) -> Self {
        let uuid = Uuid::new_v4();
        let id = match platform.id_prefix() {
            Some(prefix) => format!("{prefix}-{uuid}"),
            None => uuid.to_string(),
        };
        Self {
            id,
            student_id: student_id.into(),
            student_name: student_name.into(),
            platform,
            messages: Vec::new(),
        }
    }

    /// Rehydrates a session from a stored conversation record.
    pub fn from_conversation(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.clone(),
            student_id: conversation.student_id.clone(),
            student_name: conversation.student_name.clone(),
            platform: conversation.platform,
            messages: conversation.messages.clone(),
        }
    }
}
