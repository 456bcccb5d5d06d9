// ABOUTME: Turn controller choosing planner or fallback and applying the substitution rules
// ABOUTME: Owns the per-turn scope and emits exactly one final event or one buffered response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Turn Controller
//!
//! Dispatch rules:
//! - no model runtime: fallback, `fallbackUsed = true`
//! - planner ok: planner output
//! - planner failed before any tool: fallback output behind a planner error block
//! - planner failed after a tool: planner output behind a planner error block
//! - cancelled: no substitution at all

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::TurnConfig;
use crate::constants::messages::{APOLOGY_TEXT, PLANNER_FAILED_TITLE};
use crate::constants::models::{
    FALLBACK_MODEL_ID, PLANNER_FAILED_PARTIAL_SUFFIX, PLANNER_FAILED_SUFFIX,
};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::llm::LlmProvider;
use crate::logging::AppLogger;
use crate::models::{CoachBlock, PlannerRunResult, StreamEvent, TurnRequest, TurnResponse, TurnTrace};
use crate::tools::{ToolContext, ToolExecutor};

use super::fallback::{DeterministicFallback, FallbackOutcome};
use super::intent::IntentClassifier;
use super::planner::Planner;
use super::scope::{CancelReason, TurnScope};
use super::sink::TurnEventSink;

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A response was produced
    Completed(TurnResponse),
    /// The scope fired first
    Cancelled(CancelReason),
}

/// Orchestrates one turn end to end
pub struct TurnController {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Arc<dyn ToolExecutor>,
    fallback: DeterministicFallback,
    config: TurnConfig,
}

impl TurnController {
    /// Create a controller; `provider = None` routes every turn to the fallback
    ///
    /// # Errors
    ///
    /// Returns an error if the intent rules fail to compile
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        tools: Arc<dyn ToolExecutor>,
        config: TurnConfig,
    ) -> AppResult<Self> {
        let classifier = IntentClassifier::new()
            .map_err(|e| AppError::internal(format!("Failed to compile intent rules: {e}")))?;
        Ok(Self {
            fallback: DeterministicFallback::new(classifier, Arc::clone(&tools)),
            provider,
            tools,
            config,
        })
    }

    /// Model name announced in `start` and recorded in traces
    #[must_use]
    pub fn model_label(&self) -> String {
        self.provider
            .as_ref()
            .map_or_else(|| FALLBACK_MODEL_ID.to_owned(), |p| p.default_model().to_owned())
    }

    /// Whether a model runtime is configured
    #[must_use]
    pub fn has_model_runtime(&self) -> bool {
        self.provider.is_some()
    }

    /// Turn limits in effect
    #[must_use]
    pub const fn config(&self) -> &TurnConfig {
        &self.config
    }

    /// Run a buffered turn
    ///
    /// # Errors
    ///
    /// Returns `RequestTimeout` when the deadline elapses first
    pub async fn run_buffered(&self, request: &TurnRequest, subject: &str) -> AppResult<TurnResponse> {
        let turn_id = Uuid::new_v4().to_string();
        let span = info_span!("coach_turn", coach.turn_id = %turn_id, coach.mode = "buffered");
        async {
            let started = Instant::now();
            let scope = TurnScope::new(self.config.timeout());
            let context = ToolContext::new(subject, request.preferences, turn_id.as_str());

            let outcome = self.run(request, &context, None, &scope).await;
            scope.release();
            log_outcome(&turn_id, &outcome, started);

            match outcome {
                TurnOutcome::Completed(response) => Ok(response),
                TurnOutcome::Cancelled(reason @ CancelReason::Deadline) => {
                    Err(AppError::request_timeout(reason.message()))
                }
                TurnOutcome::Cancelled(reason @ CancelReason::Disconnect) => {
                    Err(AppError::new(ErrorCode::OperationCancelled, reason.message()))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run a streamed turn, writing every event to `sink`
    ///
    /// Emits `start` first, then at most one terminal event, then closes.
    pub async fn run_streamed(&self, request: &TurnRequest, subject: &str, sink: TurnEventSink) -> TurnOutcome {
        let turn_id = Uuid::new_v4().to_string();
        let span = info_span!("coach_turn", coach.turn_id = %turn_id, coach.mode = "streamed");
        async {
            let started = Instant::now();
            let scope = TurnScope::with_disconnect(self.config.timeout(), sink.disconnected());
            sink.bind_cancellation(scope.token().clone());
            sink.emit(StreamEvent::Start {
                model: self.model_label(),
            })
            .await;

            let context = ToolContext::new(subject, request.preferences, turn_id.as_str());
            let outcome = self.run(request, &context, Some(&sink), &scope).await;
            log_outcome(&turn_id, &outcome, started);

            match &outcome {
                TurnOutcome::Completed(response) => {
                    sink.emit(StreamEvent::Final {
                        response: response.clone(),
                    })
                    .await;
                }
                TurnOutcome::Cancelled(CancelReason::Deadline) => {
                    sink.emit(StreamEvent::Error {
                        message: CancelReason::Deadline.message().to_owned(),
                    })
                    .await;
                }
                // Nobody is listening
                TurnOutcome::Cancelled(CancelReason::Disconnect) => {}
            }

            sink.close();
            scope.release();
            outcome
        }
        .instrument(span)
        .await
    }

    /// Dispatch one turn inside `scope`
    pub async fn run(
        &self,
        request: &TurnRequest,
        context: &ToolContext,
        sink: Option<&TurnEventSink>,
        scope: &TurnScope,
    ) -> TurnOutcome {
        let utterance = request.latest_user_message().unwrap_or_default();

        let Some(provider) = &self.provider else {
            return match self.fallback.run(utterance, context, sink, scope.token()).await {
                FallbackOutcome::Completed {
                    assistant_text,
                    blocks,
                    tools_used,
                } => TurnOutcome::Completed(TurnResponse::new(
                    assistant_text,
                    blocks,
                    TurnTrace {
                        tools_used,
                        model: FALLBACK_MODEL_ID.to_owned(),
                        fallback_used: true,
                    },
                )),
                FallbackOutcome::Cancelled => TurnOutcome::Cancelled(cancel_reason(scope)),
            };
        };

        let model = provider.default_model().to_owned();
        let planner = Planner::new(provider.as_ref(), self.tools.as_ref(), &self.config);
        let result = planner.run(request, context, sink, scope.token()).await;
        if result.is_cancelled() {
            return TurnOutcome::Cancelled(cancel_reason(scope));
        }
        debug!(
            coach.turn_id = %context.turn_id,
            tools = result.tools_used().len(),
            "Planner run finished"
        );

        match result {
            PlannerRunResult::Ok {
                assistant_text,
                blocks,
                tools_used,
            } => TurnOutcome::Completed(TurnResponse::new(
                assistant_text,
                blocks,
                TurnTrace {
                    tools_used,
                    model,
                    fallback_used: false,
                },
            )),
            PlannerRunResult::Error {
                tools_used,
                message,
                ..
            } if tools_used.is_empty() => {
                warn!(
                    coach.turn_id = %context.turn_id,
                    coach.model = %model,
                    "Planner failed before running a tool, using fallback: {message}"
                );
                match self.fallback.run(utterance, context, sink, scope.token()).await {
                    FallbackOutcome::Completed {
                        assistant_text,
                        blocks,
                        tools_used,
                    } => {
                        let mut all_blocks = vec![CoachBlock::error_status(PLANNER_FAILED_TITLE, message)];
                        all_blocks.extend(blocks);
                        TurnOutcome::Completed(TurnResponse::new(
                            assistant_text,
                            all_blocks,
                            TurnTrace {
                                tools_used,
                                model: format!("{model}{PLANNER_FAILED_SUFFIX}"),
                                fallback_used: true,
                            },
                        ))
                    }
                    FallbackOutcome::Cancelled => TurnOutcome::Cancelled(cancel_reason(scope)),
                }
            }
            PlannerRunResult::Error {
                blocks,
                tools_used,
                message,
                ..
            } => {
                warn!(
                    coach.turn_id = %context.turn_id,
                    coach.model = %model,
                    tools = tools_used.len(),
                    "Planner failed after running tools: {message}"
                );
                let mut all_blocks = vec![CoachBlock::error_status(PLANNER_FAILED_TITLE, message)];
                all_blocks.extend(blocks);
                TurnOutcome::Completed(TurnResponse::new(
                    APOLOGY_TEXT,
                    all_blocks,
                    TurnTrace {
                        tools_used,
                        model: format!("{model}{PLANNER_FAILED_PARTIAL_SUFFIX}"),
                        fallback_used: false,
                    },
                ))
            }
        }
    }
}

impl std::fmt::Debug for TurnController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnController")
            .field("model", &self.model_label())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A token cancelled without a recorded source can only come from the deadline path
fn cancel_reason(scope: &TurnScope) -> CancelReason {
    scope.reason().unwrap_or(CancelReason::Deadline)
}

fn log_outcome(turn_id: &str, outcome: &TurnOutcome, started: Instant) {
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match outcome {
        TurnOutcome::Completed(response) => AppLogger::log_turn_completed(
            turn_id,
            &response.trace.model,
            response.trace.fallback_used,
            &response.trace.tools_used,
            duration_ms,
        ),
        TurnOutcome::Cancelled(reason) => {
            AppLogger::log_turn_cancelled(turn_id, reason.as_str(), duration_ms);
        }
    }
}
