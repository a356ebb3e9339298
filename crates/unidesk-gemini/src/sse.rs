// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for `streamGenerateContent` responses.
//!
//! Converts a reqwest response byte stream into a stream of text deltas
//! using the `eventsource-stream` crate for SSE protocol compliance.

use eventsource_stream::Eventsource;
use futures::future;
use futures::stream::StreamExt;
use unidesk_core::{TextStream, UnideskError};

use crate::types::GenerateContentResponse;

/// Parses a reqwest streaming response into a stream of text deltas.
///
/// With `alt=sse` the API sends data-only SSE messages, each carrying one
/// `GenerateContentResponse` chunk. Chunks with no candidate text (safety
/// metadata, final usage summaries) are skipped. A malformed chunk or a
/// transport failure surfaces as an `Err` item and the stream ends there;
/// text already yielded stays with the caller.
pub fn parse_delta_stream(response: reqwest::Response) -> TextStream {
    let byte_stream = response.bytes_stream();
    let event_stream = byte_stream.eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::from_str::<GenerateContentResponse>(&event.data) {
                Ok(chunk) => {
                    let text = chunk.text();
                    if text.is_empty() {
                        None
                    } else {
                        Some(Ok(text))
                    }
                }
                Err(e) => Some(Err(UnideskError::Model {
                    message: format!("failed to parse stream chunk: {e}"),
                    source: Some(Box::new(e)),
                })),
            },
            Err(e) => Some(Err(UnideskError::Model {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    // The first error is also the last item; later chunks are dropped.
    let fused = mapped.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        *failed = item.is_err();
        future::ready(Some(item))
    });

    Box::pin(fused)
}
