// ABOUTME: Coach turn route: validation, auth, rate limiting and streamed or buffered dispatch
// ABOUTME: Streamed turns run on a spawned task feeding an SSE body through the event sink
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Coach turn routes
//!
//! `POST /api/coach/turn` answers with a JSON `TurnResponse`, or with an SSE
//! stream when `Accept` includes `text/event-stream`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::debug;

use crate::coach::TurnEventSink;
use crate::constants::endpoints::COACH_TURN;
use crate::constants::limits::EVENT_CHANNEL_CAPACITY;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::TurnRequest;
use crate::resources::CoachResources;
use crate::sse::{event_stream_headers, wants_event_stream, SseEncoder};

/// Coach routes implementation
pub struct CoachRoutes;

impl CoachRoutes {
    /// Create the coach turn route
    pub fn routes(resources: Arc<CoachResources>) -> Router {
        Router::new()
            .route(COACH_TURN, post(Self::handle_turn))
            .with_state(resources)
    }

    /// Parse and validate the request body
    fn parse_request(body: &Bytes) -> AppResult<TurnRequest> {
        let request: TurnRequest = serde_json::from_slice(body)
            .map_err(|e| AppError::invalid_input(format!("Invalid request body: {e}")))?;
        request.validate()?;
        Ok(request)
    }

    async fn handle_turn(
        State(resources): State<Arc<CoachResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let request = Self::parse_request(&body)?;

        let auth = match resources.auth()?.authenticate(&headers).await {
            Ok(auth) => {
                AppLogger::log_auth_event(Some(&auth.subject), true, "coach turn");
                auth
            }
            Err(e) => {
                AppLogger::log_auth_event(None, false, &e.message);
                return Err(e);
            }
        };

        let decision = resources.rate_limiter().check(&auth.subject).await;
        if !decision.ok {
            AppLogger::log_rate_limited(
                &auth.subject,
                decision.limit,
                decision.retry_after_secs().unwrap_or_default(),
            );
            return Ok((decision.headers(), decision.to_error()).into_response());
        }

        resources.ensure_configured()?;
        let controller = Arc::clone(resources.controller());

        if wants_event_stream(&headers) {
            debug!(user.id = %auth.subject, "Starting streamed coach turn");
            let (sink, events) = TurnEventSink::channel(EVENT_CHANNEL_CAPACITY);
            let encoder = SseEncoder::new(controller.config().sse_padding_bytes);
            let subject = auth.subject;
            tokio::spawn(async move {
                controller.run_streamed(&request, &subject, sink).await;
            });

            let mut response = Response::new(encoder.body(events));
            response.headers_mut().extend(event_stream_headers());
            response.headers_mut().extend(decision.headers());
            return Ok(response);
        }

        let turn = controller.run_buffered(&request, &auth.subject).await?;
        Ok((decision.headers(), Json(turn)).into_response())
    }
}
