// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook simulator for messaging-platform demos.
//!
//! Fabricates an inbound WhatsApp or Facebook message and runs it
//! through the standard exchange pipeline in sync mode with no prior
//! history, so the record lands in the shared conversation history as
//! if a real webhook had delivered it. Alongside the persisted record
//! it produces two display-only log lines: the incoming event
//! immediately, the outgoing reply after a fixed delay that imitates
//! platform round-trip time. The delay never gates persistence.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use unidesk_core::{Conversation, Platform, UnideskError};
use unidesk_session::{AnswerMode, ChatSession, SessionManager, Submission};

/// Identity attributed to every simulated sender.
const SIMULATED_STUDENT_ID: &str = "WTS-001";

/// Pause before the outgoing log line, imitating platform latency.
const DEFAULT_LOG_DELAY: Duration = Duration::from_millis(1000);

/// Direction of a simulated webhook log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDirection {
    Incoming,
    Outgoing,
}

impl fmt::Display for LogDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "WEBHOOK_INCOMING"),
            Self::Outgoing => write!(f, "WEBHOOK_OUTGOING"),
        }
    }
}

/// One display-only log line from a simulated delivery.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Wall-clock time of the event, `HH:MM:SS`.
    pub time: String,
    pub direction: LogDirection,
    pub text: String,
}

impl LogEntry {
    fn now(direction: LogDirection, text: impl Into<String>) -> Self {
        Self {
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            direction,
            text: text.into(),
        }
    }
}

/// Everything one simulated webhook produced.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    /// The brand-new conversation record, as persisted.
    pub conversation: Conversation,
    /// The bot reply text sent "back" to the platform.
    pub reply: String,
    pub incoming: LogEntry,
    pub outgoing: LogEntry,
}

/// Fabricates inbound platform messages against the live pipeline.
#[derive(Clone)]
pub struct WebhookSimulator {
    manager: SessionManager,
    log_delay: Duration,
}

impl WebhookSimulator {
    pub fn new(manager: SessionManager) -> Self {
        Self {
            manager,
            log_delay: DEFAULT_LOG_DELAY,
        }
    }

    /// Overrides the outgoing-log delay.
    pub fn with_log_delay(mut self, delay: Duration) -> Self {
        self.log_delay = delay;
        self
    }

    /// Simulates one inbound message from the given platform.
    ///
    /// Each call creates a brand-new conversation with a platform-prefixed
    /// id and a synthetic sender identity; no prior history reaches the
    /// model. The record is persisted as soon as the exchange settles,
    /// before the delayed outgoing log line. Blank input is ignored and
    /// returns `None`.
    pub async fn simulate(
        &self,
        platform: Platform,
        text: &str,
    ) -> Result<Option<WebhookDelivery>, UnideskError> {
        let incoming = LogEntry::now(LogDirection::Incoming, text);
        info!(platform = %platform, "simulated webhook received");

        let mut session = ChatSession::for_platform(
            platform,
            SIMULATED_STUDENT_ID,
            format!("{platform} User"),
        );
        let submission = self
            .manager
            .submit_query(&mut session, text, AnswerMode::Complete, None)
            .await?;

        let report = match submission {
            Submission::Completed(report) => report,
            Submission::Ignored(reason) => {
                debug!(platform = %platform, reason = ?reason, "simulated webhook ignored");
                return Ok(None);
            }
        };

        // The conversation is already persisted at this point; the pause
        // only paces the display log.
        tokio::time::sleep(self.log_delay).await;
        let outgoing = LogEntry::now(LogDirection::Outgoing, &report.bot_message.text);
        info!(
            platform = %platform,
            conversation_id = %report.conversation.id,
            "simulated webhook reply logged"
        );

        Ok(Some(WebhookDelivery {
            conversation: report.conversation,
            reply: report.bot_message.text,
            incoming,
            outgoing,
        }))
    }
}
