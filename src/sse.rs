// ABOUTME: Server-Sent Events framing for streamed coach turns
// ABOUTME: Encodes stream events as `event:`/`data:` frames and pads the stream after `start`
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # SSE Framing
//!
//! Frames are written by hand rather than through `axum::response::Sse` so the
//! padding comment lands directly after `start` and no keep-alive frames are
//! interleaved.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::models::StreamEvent;

/// Content type of streamed turns
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

/// Disables response buffering in nginx-style proxies
pub const X_ACCEL_BUFFERING: &str = "x-accel-buffering";

/// Whether an `Accept` header asks for a stream
#[must_use]
pub fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(axum::http::header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.to_ascii_lowercase().contains("text/event-stream"))
}

/// Response headers for a streamed turn
#[must_use]
pub fn event_stream_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static(X_ACCEL_BUFFERING),
        HeaderValue::from_static("no"),
    );
    headers
}

/// Encodes stream events into SSE frames
#[derive(Debug, Clone, Copy)]
pub struct SseEncoder {
    padding_bytes: usize,
}

impl SseEncoder {
    /// Encoder writing `padding_bytes` of comment after `start`
    #[must_use]
    pub const fn new(padding_bytes: usize) -> Self {
        Self { padding_bytes }
    }

    /// One `event:`/`data:` frame, followed by the padding frame for `start`
    #[must_use]
    pub fn encode(&self, event: &StreamEvent) -> Bytes {
        let data = serde_json::to_string(event).unwrap_or_else(|e| {
            warn!("Failed to serialize stream event: {e}");
            serde_json::json!({"type": "error", "message": "Failed to serialize event"}).to_string()
        });
        let mut frame = format!("event: {}\ndata: {data}\n\n", event.event_name());
        if matches!(event, StreamEvent::Start { .. }) {
            frame.push_str(&padding_frame(self.padding_bytes));
        }
        Bytes::from(frame)
    }

    /// Response body draining `events` until every sender is gone
    #[must_use]
    pub fn body(self, events: mpsc::Receiver<StreamEvent>) -> Body {
        let frames = ReceiverStream::new(events)
            .map(move |event| Ok::<_, Infallible>(self.encode(&event)));
        Body::from_stream(frames)
    }
}

/// Comment frame of `bytes` spaces
#[must_use]
pub fn padding_frame(bytes: usize) -> String {
    if bytes == 0 {
        return String::new();
    }
    format!(":{}\n\n", " ".repeat(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_format() {
        let encoder = SseEncoder::new(0);
        let frame = encoder.encode(&StreamEvent::ToolStart {
            tool: "log_set".into(),
        });
        assert_eq!(
            std::str::from_utf8(&frame).unwrap(),
            "event: tool_start\ndata: {\"type\":\"tool_start\",\"tool\":\"log_set\"}\n\n"
        );
    }

    #[test]
    fn test_start_is_followed_by_padding() {
        let encoder = SseEncoder::new(2048);
        let frame = encoder.encode(&StreamEvent::Start {
            model: "fallback-deterministic".into(),
        });
        let text = std::str::from_utf8(&frame).unwrap();
        let (start, padding) = text.split_once("\n\n").unwrap();
        assert!(start.starts_with("event: start\n"));
        assert_eq!(padding, format!(":{}\n\n", " ".repeat(2048)));
    }

    #[test]
    fn test_accept_negotiation() {
        let mut headers = HeaderMap::new();
        assert!(!wants_event_stream(&headers));
        headers.insert(
            axum::http::header::ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        assert!(wants_event_stream(&headers));
    }
}
