// ABOUTME: Deterministic fallback answering a turn with one classified intent and one tool call
// ABOUTME: Used when no model runtime is configured or the planner fails before running a tool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Deterministic Fallback
//!
//! Classifies the latest user utterance and invokes at most one tool. Tool
//! failures become an error block plus default suggestions; only
//! cancellation stops it early.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::constants::messages::{
    APOLOGY_TEXT, HELP_TEXT, TOOL_FAILED_TITLE, TRY_WORKOUT_COMMAND_DESCRIPTION,
    TRY_WORKOUT_COMMAND_TITLE,
};
use crate::models::{CoachBlock, StatusTone, StreamEvent};
use crate::tools::{ProgressSink, ToolContext, ToolExecutor};

use super::intent::{Intent, IntentClassifier};
use super::sink::TurnEventSink;

/// Result of one fallback run
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackOutcome {
    /// The fallback produced an answer
    Completed {
        /// Reply text
        assistant_text: String,
        /// Response blocks
        blocks: Vec<CoachBlock>,
        /// Tools invoked (at most one)
        tools_used: Vec<String>,
    },
    /// The turn scope fired before the answer was ready
    Cancelled,
}

/// Intent parser plus single tool dispatch
#[derive(Clone)]
pub struct DeterministicFallback {
    classifier: IntentClassifier,
    tools: Arc<dyn ToolExecutor>,
}

impl DeterministicFallback {
    /// Create a fallback over `tools`
    #[must_use]
    pub const fn new(classifier: IntentClassifier, tools: Arc<dyn ToolExecutor>) -> Self {
        Self { classifier, tools }
    }

    /// Classify an utterance without running anything
    #[must_use]
    pub fn classify(&self, utterance: &str) -> Intent {
        self.classifier.classify(utterance)
    }

    /// Answer `utterance`
    pub async fn run(
        &self,
        utterance: &str,
        context: &ToolContext,
        sink: Option<&TurnEventSink>,
        cancel: &CancellationToken,
    ) -> FallbackOutcome {
        if cancel.is_cancelled() {
            return FallbackOutcome::Cancelled;
        }

        let intent = self.classify(utterance);
        info!(
            coach.turn_id = %context.turn_id,
            coach.intent = intent.name(),
            "Fallback classified utterance"
        );

        let Some((tool, args)) = intent.tool_call() else {
            return FallbackOutcome::Completed {
                assistant_text: HELP_TEXT.to_owned(),
                blocks: vec![
                    CoachBlock::status(
                        StatusTone::Info,
                        TRY_WORKOUT_COMMAND_TITLE,
                        TRY_WORKOUT_COMMAND_DESCRIPTION,
                    ),
                    CoachBlock::default_suggestions(),
                ],
                tools_used: Vec::new(),
            };
        };

        if let Some(sink) = sink {
            sink.emit(StreamEvent::ToolStart {
                tool: tool.to_owned(),
            })
            .await;
        }

        let forwarder = sink.map(|sink| sink.progress_for(tool));
        let progress = forwarder.as_ref().map(|f| f as &dyn ProgressSink);
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(coach.turn_id = %context.turn_id, coach.tool = tool, "Fallback cancelled mid-tool");
                return FallbackOutcome::Cancelled;
            }
            result = self.tools.execute(tool, args, context, progress) => result,
        };

        let (assistant_text, blocks) = match result {
            Ok(output) => (output.summary, output.blocks),
            Err(e) => (
                APOLOGY_TEXT.to_owned(),
                vec![
                    CoachBlock::error_status(TOOL_FAILED_TITLE, e.to_string()),
                    CoachBlock::default_suggestions(),
                ],
            ),
        };

        if let Some(sink) = sink {
            sink.emit(StreamEvent::ToolResult {
                tool: tool.to_owned(),
                blocks: blocks.clone(),
            })
            .await;
        }

        FallbackOutcome::Completed {
            assistant_text,
            blocks,
            tools_used: vec![tool.to_owned()],
        }
    }
}

impl std::fmt::Debug for DeterministicFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeterministicFallback").finish_non_exhaustive()
    }
}
