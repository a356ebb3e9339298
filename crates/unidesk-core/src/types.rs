// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared data model for the Unidesk helpdesk agent.
//!
//! Conversation records are serialized with camelCase field names, the
//! shape the persistence gateway stores and the HTTP gateway serves.
//! Category and sentiment are closed enums: an unrecognized string coming
//! back from the classifier deserializes to the documented default
//! (`Other` / `Neutral`) instead of leaking through as raw text.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Per-process sequence suffix so message ids stay unique within one millisecond.
static MESSAGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Who produced a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Bot,
}

/// Query category assigned by the classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum Category {
    Admissions,
    Academics,
    #[serde(rename = "Fees & Finance")]
    #[strum(serialize = "Fees & Finance")]
    FeesFinance,
    Exams,
    Syllabus,
    #[serde(rename = "Technical Support")]
    #[strum(serialize = "Technical Support")]
    TechnicalSupport,
    /// Fallback for anything the classifier does not recognize.
    #[serde(other)]
    Other,
}

impl Default for Category {
    fn default() -> Self {
        Self::Other
    }
}

/// Sentiment assigned by the classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum Sentiment {
    Positive,
    Negative,
    #[serde(other)]
    Neutral,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self::Neutral
    }
}

/// Channel a conversation arrived on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Platform {
    Web,
    WhatsApp,
    Facebook,
}

impl Platform {
    /// Conversation-id prefix marking records fabricated by the webhook
    /// simulator. Web sessions carry no prefix.
    pub fn id_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Web => None,
            Self::WhatsApp => Some("wa"),
            Self::Facebook => Some("fb"),
        }
    }
}

/// Lifecycle status of a conversation record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum TicketStatus {
    Open,
    Resolved,
    Escalated,
}

impl Default for TicketStatus {
    fn default() -> Self {
        Self::Open
    }
}

/// One turn in a conversation.
///
/// Bot messages start empty while streaming and are rewritten in place as
/// deltas arrive; user messages are immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    /// Creation time, milliseconds since epoch.
    pub timestamp: i64,
}

impl Message {
    /// Creates a message stamped with the current time.
    ///
    /// Ids are timestamp-derived with a sequence suffix, so sorting by id
    /// matches creation order.
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        let timestamp = now_ms();
        let seq = MESSAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("{timestamp}-{seq:04}"),
            role,
            text: text.into(),
            timestamp,
        }
    }
}

/// One session's full conversation record, the unit the persistence
/// gateway stores and the dashboard surfaces browse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    /// Insertion order is chronological order.
    pub messages: Vec<Message>,
    pub category: Category,
    pub sentiment: Sentiment,
    pub platform: Platform,
    /// Timestamp of the most recent update, milliseconds since epoch.
    pub last_activity: i64,
    pub status: TicketStatus,
}

impl Conversation {
    /// Creates an empty conversation in its initial state: no messages,
    /// unclassified, status `Open`.
    pub fn new(
        id: impl Into<String>,
        student_id: impl Into<String>,
        student_name: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            student_name: student_name.into(),
            messages: Vec::new(),
            category: Category::Other,
            sentiment: Sentiment::Neutral,
            platform,
            last_activity: now_ms(),
            status: TicketStatus::Open,
        }
    }
}

/// A knowledge-base entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: Category,
}

/// Classification result for a single query.
///
/// Both fields fall back to their defaults when the classifier omits them
/// or returns something outside the closed enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QueryAnalysis {
    pub category: Category,
    pub sentiment: Sentiment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn category_display_strings_round_trip() {
        for category in Category::iter() {
            let s = category.to_string();
            let parsed = Category::from_str(&s).expect("display string should parse back");
            assert_eq!(category, parsed);
        }
        assert_eq!(Category::FeesFinance.to_string(), "Fees & Finance");
        assert_eq!(Category::TechnicalSupport.to_string(), "Technical Support");
    }

    #[test]
    fn unknown_category_deserializes_to_other() {
        let parsed: Category = serde_json::from_str("\"Parking Permits\"").unwrap();
        assert_eq!(parsed, Category::Other);
    }

    #[test]
    fn unknown_sentiment_deserializes_to_neutral() {
        let parsed: Sentiment = serde_json::from_str("\"Ambivalent\"").unwrap();
        assert_eq!(parsed, Sentiment::Neutral);
    }

    #[test]
    fn query_analysis_defaults_on_missing_fields() {
        let parsed: QueryAnalysis = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.category, Category::Other);
        assert_eq!(parsed.sentiment, Sentiment::Neutral);

        let parsed: QueryAnalysis =
            serde_json::from_str(r#"{"category": "Exams", "sentiment": "Negative"}"#).unwrap();
        assert_eq!(parsed.category, Category::Exams);
        assert_eq!(parsed.sentiment, Sentiment::Negative);
    }

    #[test]
    fn message_ids_sort_by_creation() {
        let first = Message::new(MessageRole::User, "hello");
        let second = Message::new(MessageRole::Bot, "hi");
        assert!(first.id < second.id, "{} !< {}", first.id, second.id);
        assert!(first.timestamp <= second.timestamp);
    }

    #[test]
    fn message_serializes_camel_case() {
        let msg = Message {
            id: "1".into(),
            role: MessageRole::Bot,
            text: "hello".into(),
            timestamp: 1700000000000,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "bot");
        assert_eq!(json["timestamp"], 1700000000000_i64);
    }

    #[test]
    fn conversation_round_trips_stored_shape() {
        let json = r#"{
            "id": "abc123",
            "studentId": "STUD-001",
            "studentName": "Demo Student",
            "messages": [
                {"id": "1", "role": "user", "text": "hi", "timestamp": 1}
            ],
            "category": "Fees & Finance",
            "sentiment": "Positive",
            "platform": "WhatsApp",
            "lastActivity": 2,
            "status": "Escalated"
        }"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conv.student_id, "STUD-001");
        assert_eq!(conv.category, Category::FeesFinance);
        assert_eq!(conv.platform, Platform::WhatsApp);
        assert_eq!(conv.status, TicketStatus::Escalated);

        let back = serde_json::to_value(&conv).unwrap();
        assert_eq!(back["studentName"], "Demo Student");
        assert_eq!(back["category"], "Fees & Finance");
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!(Platform::from_str("whatsapp").unwrap(), Platform::WhatsApp);
        assert_eq!(Platform::from_str("facebook").unwrap(), Platform::Facebook);
        assert_eq!(Platform::from_str("WEB").unwrap(), Platform::Web);
        assert!(Platform::from_str("telegram").is_err());
    }

    #[test]
    fn id_prefixes_mark_simulated_channels() {
        assert_eq!(Platform::Web.id_prefix(), None);
        assert_eq!(Platform::WhatsApp.id_prefix(), Some("wa"));
        assert_eq!(Platform::Facebook.id_prefix(), Some("fb"));
    }
}
