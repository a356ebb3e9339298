// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Generative Language API.
//!
//! Thin wrapper over [`reqwest`]: builds the authenticated client once,
//! exposes one call per endpoint. Every call is a single attempt; callers
//! degrade on failure rather than retry.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;
use unidesk_core::UnideskError;

use crate::sse::parse_delta_stream;
use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};
use unidesk_core::TextStream;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Low-level Generative Language API client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Build a client for `model` authenticated with `api_key`.
    pub fn new(
        api_key: &str,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, UnideskError> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key)
            .map_err(|_| UnideskError::Config("gemini.api_key contains invalid characters".to_string()))?;
        key_value.set_sensitive(true);
        headers.insert("x-goog-api-key", key_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|e| UnideskError::model("failed to build HTTP client").with_source(e))?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    /// Point the client at a different endpoint. Test use only.
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Issue a blocking `generateContent` call and return the parsed response.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, UnideskError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UnideskError::model("model request failed").with_source(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| UnideskError::model("failed to decode model response").with_source(e))
    }

    /// Issue a `streamGenerateContent` call and return the delta stream.
    ///
    /// The returned stream yields text fragments in arrival order. Nothing is
    /// sent until the stream is first polled past the response headers; the
    /// stream ends after the final chunk and cannot be restarted.
    pub async fn stream_generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<TextStream, UnideskError> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        debug!(model = %self.model, "sending streamGenerateContent request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UnideskError::model("model request failed").with_source(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Ok(parse_delta_stream(response))
    }
}

/// Map a non-2xx response to a model error, preferring the API's own message.
fn api_error(status: reqwest::StatusCode, body: &str) -> UnideskError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => UnideskError::model(format!(
            "model API error ({}): {}",
            status.as_u16(),
            parsed.error.message
        )),
        Err(_) => UnideskError::model(format!("model API error ({})", status.as_u16())),
    }
}
