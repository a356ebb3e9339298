// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete helpdesk pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite and a mock
//! model. Tests are independent and order-insensitive.

use unidesk_core::{Category, MessageRole, Platform, QueryAnalysis, Sentiment, TicketStatus};
use unidesk_session::{ExchangeEvent, Submission};
use unidesk_simulator::WebhookSimulator;
use unidesk_test_utils::{MockReply, TestHarness};

fn completed(submission: Submission) -> unidesk_session::ExchangeReport {
    match submission {
        Submission::Completed(report) => report,
        Submission::Ignored(reason) => panic!("exchange was ignored: {reason:?}"),
    }
}

// ---- Test 1: Query-to-answer pipeline ----

#[tokio::test]
async fn test_exchange_returns_mock_answer() {
    let harness = TestHarness::builder()
        .with_replies(vec!["Hello from the helpdesk!".to_string()])
        .build()
        .await
        .unwrap();

    let mut session = harness.session();
    let report = completed(harness.ask(&mut session, "Hi there").await.unwrap());
    assert_eq!(report.bot_message.text, "Hello from the helpdesk!");
}

#[tokio::test]
async fn test_exchange_persists_user_and_bot_turns() {
    let harness = TestHarness::builder()
        .with_replies(vec!["Persisted answer".to_string()])
        .build()
        .await
        .unwrap();

    let mut session = harness.session();
    harness.ask(&mut session, "Test persistence").await.unwrap();

    let conversations = harness.store.conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);

    let messages = &conversations[0].messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].text, "Test persistence");
    assert_eq!(messages[1].role, MessageRole::Bot);
    assert_eq!(messages[1].text, "Persisted answer");
}

// ---- Test 2: Knowledge-base grounding ----

#[tokio::test]
async fn test_seeded_faq_context_reaches_the_model() {
    let harness = TestHarness::builder()
        .with_replies(vec!["Apply online.".to_string()])
        .with_analyses(vec![QueryAnalysis {
            category: Category::Admissions,
            sentiment: Sentiment::Neutral,
        }])
        .build()
        .await
        .unwrap();

    let mut session = harness.session();
    harness
        .ask(&mut session, "What are the admission requirements?")
        .await
        .unwrap();

    let calls = harness.model.generate_calls().await;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].context.contains("admissions.university.edu"));

    let record = &harness.store.conversations().await.unwrap()[0];
    assert_eq!(record.category, Category::Admissions);
}

#[tokio::test]
async fn test_added_faq_grounds_the_next_exchange() {
    let harness = TestHarness::builder()
        .with_replies(vec!["The library closes at midnight.".to_string()])
        .build()
        .await
        .unwrap();

    harness
        .kb
        .add(
            "When does the library close?",
            "The library closes at midnight during term.",
            Category::Other,
        )
        .await
        .unwrap();

    let mut session = harness.session();
    harness
        .ask(&mut session, "library hours?")
        .await
        .unwrap();

    let calls = harness.model.generate_calls().await;
    assert!(calls[0].context.contains("closes at midnight during term"));
}

// ---- Test 3: Streaming pipeline ----

#[tokio::test]
async fn test_streamed_answer_is_persisted_whole() {
    let harness = TestHarness::builder()
        .with_scripted(vec![MockReply::Deltas(vec![
            "Exams ".to_string(),
            "start ".to_string(),
            "in May.".to_string(),
        ])])
        .build()
        .await
        .unwrap();

    let mut session = harness.session();
    let (submission, events) = harness
        .ask_streaming(&mut session, "When are exams?")
        .await
        .unwrap();

    let report = completed(submission);
    assert_eq!(report.bot_message.text, "Exams start in May.");

    let deltas: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ExchangeEvent::AnswerDelta { delta, .. } => Some(delta.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(deltas, ["Exams ", "start ", "in May."]);

    let record = &harness.store.conversations().await.unwrap()[0];
    assert_eq!(record.messages[1].text, "Exams start in May.");
}

// ---- Test 4: Degradation without retries ----

#[tokio::test]
async fn test_model_failures_degrade_to_defaults() {
    let harness = TestHarness::builder()
        .with_scripted(vec![MockReply::Failure("api down".to_string())])
        .build()
        .await
        .unwrap();
    harness.model.fail_next_analysis("api down").await;

    let mut session = harness.session();
    let report = completed(harness.ask(&mut session, "anyone there?").await.unwrap());

    assert!(report.generation_degraded);
    assert!(report.classification_degraded);
    assert_eq!(
        report.bot_message.text,
        "An error occurred while processing your request. Please try again later."
    );

    // The record is still persisted, with classification defaults.
    let record = &harness.store.conversations().await.unwrap()[0];
    assert_eq!(record.category, Category::Other);
    assert_eq!(record.sentiment, Sentiment::Neutral);
    assert_eq!(record.status, TicketStatus::Open);
}

// ---- Test 5: Escalation rules ----

#[tokio::test]
async fn test_negative_sentiment_escalates() {
    let harness = TestHarness::builder()
        .with_replies(vec!["So sorry to hear that.".to_string()])
        .with_analyses(vec![QueryAnalysis {
            category: Category::TechnicalSupport,
            sentiment: Sentiment::Negative,
        }])
        .build()
        .await
        .unwrap();

    let mut session = harness.session();
    harness
        .ask(&mut session, "The portal has been broken for a week!")
        .await
        .unwrap();

    let record = &harness.store.conversations().await.unwrap()[0];
    assert_eq!(record.status, TicketStatus::Escalated);
}

#[tokio::test]
async fn test_agent_resolution_survives_followups() {
    let harness = TestHarness::builder()
        .with_replies(vec!["First answer.".to_string(), "Second answer.".to_string()])
        .build()
        .await
        .unwrap();

    let mut session = harness.session();
    harness.ask(&mut session, "first question").await.unwrap();

    // An agent resolves the ticket from the dashboard.
    harness
        .store
        .set_status(&session.id, TicketStatus::Resolved)
        .await
        .unwrap();

    harness.ask(&mut session, "thanks, one more thing").await.unwrap();

    let record = harness
        .store
        .conversation(&session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, TicketStatus::Resolved);
    assert_eq!(record.messages.len(), 4);
}

// ---- Test 6: Webhook simulator ----

#[tokio::test]
async fn test_simulated_webhook_creates_prefixed_record() {
    let harness = TestHarness::builder()
        .with_replies(vec!["Pay through the portal.".to_string()])
        .build()
        .await
        .unwrap();
    let simulator = WebhookSimulator::new(harness.manager.clone())
        .with_log_delay(std::time::Duration::from_millis(1));

    let delivery = simulator
        .simulate(Platform::WhatsApp, "How do I pay?")
        .await
        .unwrap()
        .unwrap();

    assert!(delivery.conversation.id.starts_with("wa-"));
    assert_eq!(delivery.conversation.platform, Platform::WhatsApp);
    assert_eq!(delivery.reply, "Pay through the portal.");

    let record = harness
        .store
        .conversation(&delivery.conversation.id)
        .await
        .unwrap();
    assert!(record.is_some());
}

#[tokio::test]
async fn test_web_and_simulated_conversations_stay_separate() {
    let harness = TestHarness::builder()
        .with_replies(vec!["web answer".to_string(), "whatsapp answer".to_string()])
        .build()
        .await
        .unwrap();

    let mut session = harness.session();
    harness.ask(&mut session, "from the web").await.unwrap();

    let simulator = WebhookSimulator::new(harness.manager.clone())
        .with_log_delay(std::time::Duration::from_millis(1));
    simulator
        .simulate(Platform::Facebook, "from facebook")
        .await
        .unwrap();

    let conversations = harness.store.conversations().await.unwrap();
    assert_eq!(conversations.len(), 2);

    let platforms: Vec<Platform> = conversations.iter().map(|c| c.platform).collect();
    assert!(platforms.contains(&Platform::Web));
    assert!(platforms.contains(&Platform::Facebook));
}

// ---- Test 7: Default response when no queued replies ----

#[tokio::test]
async fn test_default_mock_reply() {
    let harness = TestHarness::builder().build().await.unwrap();

    let mut session = harness.session();
    let report = completed(harness.ask(&mut session, "anything").await.unwrap());
    assert_eq!(report.bot_message.text, "mock response");
}

// ---- Test 8: Harness isolation ----

#[tokio::test]
async fn test_harness_isolation() {
    let h1 = TestHarness::builder()
        .with_replies(vec!["h1-answer".to_string()])
        .build()
        .await
        .unwrap();
    let h2 = TestHarness::builder()
        .with_replies(vec!["h2-answer".to_string()])
        .build()
        .await
        .unwrap();

    let mut s1 = h1.session();
    let mut s2 = h2.session();
    let r1 = completed(h1.ask(&mut s1, "msg").await.unwrap());
    let r2 = completed(h2.ask(&mut s2, "msg").await.unwrap());

    assert_eq!(r1.bot_message.text, "h1-answer");
    assert_eq!(r2.bot_message.text, "h2-answer");

    assert_eq!(h1.store.conversations().await.unwrap().len(), 1);
    assert_eq!(h2.store.conversations().await.unwrap().len(), 1);
    assert_ne!(s1.id, s2.id);
}
