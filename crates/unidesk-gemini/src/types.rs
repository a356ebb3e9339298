// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generative Language API request/response types.
//!
//! Wire shapes for `generateContent` / `streamGenerateContent`. Field names
//! follow the API's camelCase convention.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single text fragment within a content entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One conversation entry: a role plus its parts.
///
/// Roles are "user" and "model"; the system instruction omits the role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Structured-output schema for constrained JSON responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl Schema {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            schema_type: "STRING".to_string(),
            description: Some(description.into()),
            properties: None,
            required: None,
        }
    }

    pub fn object(properties: BTreeMap<String, Schema>, required: Vec<String>) -> Self {
        Self {
            schema_type: "OBJECT".to_string(),
            description: None,
            properties: Some(properties),
            required: Some(required),
        }
    }
}

/// Generation parameters attached to a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Schema>,
}

/// A request to `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One candidate answer in a response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A response from `generateContent`, also the per-chunk shape when streaming.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts, empty when absent.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Error payload returned by the API on non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("hello")],
            system_instruction: Some(Content::system("be helpful")),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                response_mime_type: None,
                response_schema: None,
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be helpful");
        assert_eq!(json["generationConfig"]["temperature"], 0.7);
        // The system instruction carries no role.
        assert!(json["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn classification_schema_shape() {
        let mut properties = BTreeMap::new();
        properties.insert(
            "category".to_string(),
            Schema::string("One of the provided categories"),
        );
        properties.insert(
            "sentiment".to_string(),
            Schema::string("One of the provided sentiments"),
        );
        let schema = Schema::object(
            properties,
            vec!["category".to_string(), "sentiment".to_string()],
        );
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "OBJECT");
        assert_eq!(json["properties"]["category"]["type"], "STRING");
        assert_eq!(json["required"][1], "sentiment");
    }

    #[test]
    fn response_text_concatenates_parts() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello"}, {"text": " there"}]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text(), "Hello there");
    }

    #[test]
    fn empty_response_text_is_empty() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), "");
    }

    #[test]
    fn api_error_deserializes() {
        let body = r#"{
            "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
        }"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "API key not valid");
        assert_eq!(parsed.error.status.as_deref(), Some("INVALID_ARGUMENT"));
    }
}
