// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini adapter for the Unidesk helpdesk agent.
//!
//! This crate implements [`LanguageModel`] against the Generative Language
//! API, providing query classification, single-shot answers, and streaming
//! SSE responses. Every API call is a single attempt: callers own the
//! degradation story, so a failed call here is an honest error, not a retry
//! loop.

pub mod client;
pub mod sse;
pub mod types;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use unidesk_config::UnideskConfig;
use unidesk_core::types::{Message, MessageRole, QueryAnalysis};
use unidesk_core::{LanguageModel, TextStream, UnideskError};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig, Schema};

/// Answer returned when the model produces an empty candidate.
const EMPTY_RESPONSE_FALLBACK: &str =
    "I am having trouble understanding. Please contact support.";

/// Gemini-backed helpdesk model implementing [`LanguageModel`].
///
/// API key resolution order: config -> `GEMINI_API_KEY` env var -> error.
pub struct GeminiModel {
    client: GeminiClient,
    university: String,
    temperature: f64,
}

impl GeminiModel {
    /// Creates a new Gemini model gateway from the given configuration.
    pub fn new(config: &UnideskConfig) -> Result<Self, UnideskError> {
        let api_key = resolve_api_key(&config.gemini.api_key)?;
        let client = GeminiClient::new(
            &api_key,
            config.gemini.model.clone(),
            Duration::from_secs(config.gemini.request_timeout_secs),
        )?;

        info!(model = %client.model(), "Gemini model gateway initialized");

        Ok(Self {
            client,
            university: config.assistant.university.clone(),
            temperature: config.gemini.temperature,
        })
    }

    /// Creates a gateway with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: GeminiClient, university: impl Into<String>) -> Self {
        Self {
            client,
            university: university.into(),
            temperature: 0.7,
        }
    }

    /// Builds the chat request: prior turns plus the new query, with the
    /// helpdesk system instruction carrying the FAQ context.
    fn chat_request(&self, query: &str, history: &[Message], context: &str) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history.iter().map(to_api_content).collect();
        contents.push(Content::user(query));

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content::system(system_instruction(
                &self.university,
                context,
            ))),
            generation_config: Some(GenerationConfig {
                temperature: Some(self.temperature),
                response_mime_type: None,
                response_schema: None,
            }),
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn classify(&self, query: &str) -> Result<QueryAnalysis, UnideskError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(analysis_prompt(query))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: None,
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(classification_schema()),
            }),
        };

        let response = self.client.generate_content(&request).await?;
        let text = response.text();

        serde_json::from_str::<QueryAnalysis>(&text).map_err(|e| UnideskError::Model {
            message: format!("failed to parse classification response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn generate(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
    ) -> Result<String, UnideskError> {
        let request = self.chat_request(query, history, context);
        let response = self.client.generate_content(&request).await?;

        let text = response.text();
        if text.is_empty() {
            Ok(EMPTY_RESPONSE_FALLBACK.to_string())
        } else {
            Ok(text)
        }
    }

    async fn generate_stream(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
    ) -> Result<TextStream, UnideskError> {
        let request = self.chat_request(query, history, context);
        self.client.stream_generate_content(&request).await
    }
}

/// Maps a stored message to its API content entry.
fn to_api_content(message: &Message) -> Content {
    match message.role {
        MessageRole::User => Content::user(message.text.clone()),
        MessageRole::Bot => Content::model(message.text.clone()),
    }
}

/// The helpdesk system instruction with the FAQ context embedded.
fn system_instruction(university: &str, context: &str) -> String {
    format!(
        "You are an elite Student Helpdesk AI Bot for \"{university}\".\n\
         Your goals:\n\
         1. Provide helpful, accurate, and polite information to students.\n\
         2. If you are unsure, provide the contact for the specific department.\n\
         3. Use the following FAQ context if relevant:\n\
         {context}\n\n\
         4. Support both English and Urdu. If the student speaks Urdu, respond in Urdu.\n\
         5. Keep responses concise and structured."
    )
}

/// The classification prompt. Category and sentiment labels must match the
/// stored enum spellings exactly.
fn analysis_prompt(query: &str) -> String {
    format!(
        "Analyze the following student query and return JSON only.\n\
         Query: \"{query}\"\n\n\
         Categories: Admissions, Academics, Fees & Finance, Exams, Syllabus, Technical Support, Other.\n\
         Sentiments: Positive, Neutral, Negative."
    )
}

/// Structured-output schema forcing `{category, sentiment}` JSON.
fn classification_schema() -> Schema {
    let mut properties = BTreeMap::new();
    properties.insert(
        "category".to_string(),
        Schema::string("One of the provided categories"),
    );
    properties.insert(
        "sentiment".to_string(),
        Schema::string("One of the provided sentiments"),
    );
    Schema::object(
        properties,
        vec!["category".to_string(), "sentiment".to_string()],
    )
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, UnideskError> {
    match config_key {
        Some(key) if !key.is_empty() => Ok(key.clone()),
        _ => std::env::var("GEMINI_API_KEY").map_err(|_| {
            UnideskError::Config(
                "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
            )
        }),
    }
}
