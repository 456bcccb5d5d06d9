// ABOUTME: Stream events emitted to streaming clients during a coach turn
// ABOUTME: Each variant's wire name doubles as the SSE `event:` field
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use super::blocks::CoachBlock;
use super::turn::TurnResponse;

/// Progress notification emitted while a turn runs
///
/// A stream carries exactly one `Start` first and at most one terminal event
/// (`Final` or `Error`). `ToolProgress` only appears between a `ToolStart`
/// and the matching `ToolResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Turn accepted; names the model answering it
    Start {
        /// Model identifier or `fallback-deterministic`
        model: String,
    },
    /// A tool is about to run
    ToolStart {
        /// Tool name
        tool: String,
    },
    /// Partial output reported by a running tool
    ToolProgress {
        /// Tool name
        tool: String,
        /// Partial blocks
        blocks: Vec<CoachBlock>,
    },
    /// A tool finished, successfully or not
    ToolResult {
        /// Tool name
        tool: String,
        /// Result blocks (an error-status block on failure)
        blocks: Vec<CoachBlock>,
    },
    /// Terminal failure
    Error {
        /// Human-readable message
        message: String,
    },
    /// Terminal success carrying the whole response
    Final {
        /// The turn response
        response: TurnResponse,
    },
}

impl StreamEvent {
    /// SSE event name
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolProgress { .. } => "tool_progress",
            Self::ToolResult { .. } => "tool_result",
            Self::Error { .. } => "error",
            Self::Final { .. } => "final",
        }
    }

    /// Whether the stream must close after this event
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Final { .. })
    }
}
