// ABOUTME: Bounded multi-round tool-calling planner driving the model through a state machine
// ABOUTME: Runs tool calls sequentially, turns tool failures into error blocks, and stops on cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Planner
//!
//! One run moves through `AwaitingModel -> ExecutingTools -> AwaitingModel ...`
//! until the model answers without tool calls (`Done`) or the run fails
//! (`Failed`): round limit, model error, or cancellation. Model errors are
//! caught here and nowhere else; nothing is retried.

use std::sync::OnceLock;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TurnConfig;
use crate::constants::messages::{ROUND_LIMIT_MESSAGE, TOOL_FAILED_TITLE};
use crate::errors::ToolError;
use crate::llm::prompts::build_coach_preamble;
use crate::llm::{ChatMessage, ChatRequest, FunctionCall, LlmProvider, Tool};
use crate::models::{CoachBlock, PlannerRunResult, StreamEvent, TurnRequest};
use crate::tools::{ProgressSink, ToolContext, ToolExecutor};

use super::sink::TurnEventSink;

/// Message carried by a run stopped through its cancellation token
pub const PLANNER_CANCELLED_MESSAGE: &str = "Planner cancelled";

/// Planner state
#[derive(Debug, Clone, PartialEq)]
enum PlannerState {
    /// Waiting for the model's reply in `round` (1-based)
    AwaitingModel { round: usize },
    /// Running the calls requested in `round`
    ExecutingTools {
        round: usize,
        calls: Vec<FunctionCall>,
    },
    /// The model answered
    Done { text: String },
    /// The run stopped without an answer
    Failed { message: String, cancelled: bool },
}

impl PlannerState {
    fn cancelled() -> Self {
        Self::Failed {
            message: PLANNER_CANCELLED_MESSAGE.to_owned(),
            cancelled: true,
        }
    }
}

/// Accumulated output of a run
#[derive(Debug, Default)]
struct RunState {
    messages: Vec<ChatMessage>,
    blocks: Vec<CoachBlock>,
    tools_used: Vec<String>,
    assistant_text: String,
}

/// Model-driven planner for one turn
pub struct Planner<'a> {
    provider: &'a dyn LlmProvider,
    tools: &'a dyn ToolExecutor,
    max_rounds: usize,
    max_history: usize,
}

impl<'a> Planner<'a> {
    /// Create a planner bound to one provider and tool executor
    #[must_use]
    pub fn new(provider: &'a dyn LlmProvider, tools: &'a dyn ToolExecutor, config: &TurnConfig) -> Self {
        Self {
            provider,
            tools,
            max_rounds: config.max_planner_rounds,
            max_history: config.max_history_messages,
        }
    }

    /// Drive the model until it answers or the run fails
    pub async fn run(
        &self,
        request: &TurnRequest,
        context: &ToolContext,
        sink: Option<&TurnEventSink>,
        cancel: &CancellationToken,
    ) -> PlannerRunResult {
        let mut run = RunState {
            messages: std::iter::once(ChatMessage::system(build_coach_preamble(
                &request.preferences,
            )))
            .chain(request.recent_history(self.max_history).iter().map(ChatMessage::from))
            .collect(),
            ..RunState::default()
        };
        let catalogue = [Tool {
            function_declarations: self.tools.describe(),
        }];

        let mut state = PlannerState::AwaitingModel { round: 1 };
        loop {
            state = match state {
                PlannerState::AwaitingModel { round } => {
                    self.await_model(round, &mut run, &catalogue, context, cancel)
                        .await
                }
                PlannerState::ExecutingTools { round, calls } => {
                    self.execute_tools(round, calls, &mut run, context, sink, cancel)
                        .await
                }
                PlannerState::Done { text } => {
                    return PlannerRunResult::Ok {
                        assistant_text: text,
                        blocks: run.blocks,
                        tools_used: run.tools_used,
                    };
                }
                PlannerState::Failed { message, cancelled } => {
                    return PlannerRunResult::Error {
                        assistant_text: run.assistant_text,
                        blocks: run.blocks,
                        tools_used: run.tools_used,
                        message,
                        cancelled,
                    };
                }
            };
        }
    }

    async fn await_model(
        &self,
        round: usize,
        run: &mut RunState,
        catalogue: &[Tool],
        context: &ToolContext,
        cancel: &CancellationToken,
    ) -> PlannerState {
        if round > self.max_rounds {
            warn!(
                coach.turn_id = %context.turn_id,
                coach.round = round - 1,
                "Planner exhausted its round limit"
            );
            return PlannerState::Failed {
                message: ROUND_LIMIT_MESSAGE.to_owned(),
                cancelled: false,
            };
        }
        if cancel.is_cancelled() {
            return PlannerState::cancelled();
        }

        debug!(
            coach.turn_id = %context.turn_id,
            coach.round = round,
            messages = run.messages.len(),
            "Requesting model completion"
        );
        let request = ChatRequest::new(run.messages.clone());
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return PlannerState::cancelled(),
            response = self.provider.complete_with_tools(&request, catalogue) => response,
        };

        match response {
            Err(e) => {
                warn!(coach.turn_id = %context.turn_id, coach.round = round, "Model call failed: {e}");
                PlannerState::Failed {
                    message: format!("Model request failed: {}", e.message),
                    cancelled: false,
                }
            }
            Ok(response) if response.has_function_calls() => {
                let text = response.content.unwrap_or_default();
                if !text.trim().is_empty() {
                    run.assistant_text = strip_function_markup(&text);
                }
                info!(
                    coach.turn_id = %context.turn_id,
                    coach.round = round,
                    calls = response.function_calls.len(),
                    "Model requested tool calls"
                );
                run.messages.push(ChatMessage::assistant_tool_calls(
                    text,
                    response.function_calls.clone(),
                ));
                PlannerState::ExecutingTools {
                    round,
                    calls: response.function_calls,
                }
            }
            Ok(response) => PlannerState::Done {
                text: strip_function_markup(&response.content.unwrap_or_default()),
            },
        }
    }

    async fn execute_tools(
        &self,
        round: usize,
        calls: Vec<FunctionCall>,
        run: &mut RunState,
        context: &ToolContext,
        sink: Option<&TurnEventSink>,
        cancel: &CancellationToken,
    ) -> PlannerState {
        for call in calls {
            if cancel.is_cancelled() {
                return PlannerState::cancelled();
            }

            if let Some(sink) = sink {
                sink.emit(StreamEvent::ToolStart {
                    tool: call.name.clone(),
                })
                .await;
            }
            run.tools_used.push(call.name.clone());

            let result = match call.parse_args() {
                Err(details) => Err(ToolError::malformed_arguments(&call.name, details)),
                Ok(args) => {
                    let forwarder = sink.map(|sink| sink.progress_for(&call.name));
                    let progress = forwarder.as_ref().map(|f| f as &dyn ProgressSink);
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return PlannerState::cancelled(),
                        result = self.tools.execute(&call.name, args, context, progress) => result,
                    }
                }
            };

            let result_blocks = match result {
                Ok(output) => {
                    run.messages.push(ChatMessage::tool_result(
                        call.id.clone(),
                        output.output_for_model.to_string(),
                    ));
                    output.blocks
                }
                Err(e) => {
                    let message = e.to_string();
                    run.messages
                        .push(ChatMessage::tool_error(call.id.clone(), &message));
                    vec![CoachBlock::error_status(TOOL_FAILED_TITLE, message)]
                }
            };
            run.blocks.extend(result_blocks.iter().cloned());

            if let Some(sink) = sink {
                sink.emit(StreamEvent::ToolResult {
                    tool: call.name.clone(),
                    blocks: result_blocks,
                })
                .await;
            }
        }

        PlannerState::AwaitingModel { round: round + 1 }
    }
}

/// Remove `<function ...>...</function>` markup some models echo into text
#[must_use]
pub fn strip_function_markup(text: &str) -> String {
    static MARKUP: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = MARKUP.get_or_init(|| {
        Regex::new(r"(?s)<function[^>]*>.*?</function>|</?function[^>]*/?>").ok()
    });
    pattern
        .as_ref()
        .map_or_else(|| text.to_owned(), |re| re.replace_all(text, "").into_owned())
        .trim()
        .to_owned()
}
