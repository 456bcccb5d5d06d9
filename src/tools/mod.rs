// ABOUTME: Tool execution adapter used by the planner and the deterministic fallback
// ABOUTME: Defines ToolExecutor, ToolContext, ToolOutput and the progress sink contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Coach Tools
//!
//! Both orchestration paths reach domain functionality through one seam,
//! [`ToolExecutor`]. The executor resolves a tool by name, runs it once and
//! returns a [`ToolOutput`] or a [`ToolError`]; it never retries.
//!
//! - `traits`: the `CoachTool` trait implemented by individual tools
//! - `registry`: `ToolRegistry`, a name-indexed `ToolExecutor`
//! - `workout`: in-memory reference tools for logging sets and preferences

pub mod registry;
pub mod traits;
pub mod workout;

pub use registry::ToolRegistry;
pub use traits::{CoachTool, ToolCapabilities};
pub use workout::InMemoryWorkoutTools;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::llm::FunctionDeclaration;
use crate::models::{CoachBlock, Preferences};

/// Per-call context handed to tools
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Authenticated subject the call acts for
    pub subject: String,
    /// Preferences sent with the turn
    pub preferences: Preferences,
    /// Turn identifier for log correlation
    pub turn_id: String,
}

impl ToolContext {
    /// Create a tool context
    #[must_use]
    pub fn new(subject: impl Into<String>, preferences: Preferences, turn_id: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            preferences,
            turn_id: turn_id.into(),
        }
    }
}

/// Result of one successful tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Blocks rendered to the user
    pub blocks: Vec<CoachBlock>,
    /// Structured payload fed back to the model
    pub output_for_model: Value,
    /// One-line human summary, used as assistant text by the fallback
    pub summary: String,
}

impl ToolOutput {
    /// Create a tool output
    #[must_use]
    pub fn new(blocks: Vec<CoachBlock>, output_for_model: Value, summary: impl Into<String>) -> Self {
        Self {
            blocks,
            output_for_model,
            summary: summary.into(),
        }
    }
}

/// Receiver of partial tool output
///
/// Progress is advisory; the value returned by the tool is authoritative.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Report partial blocks for the running tool
    async fn report(&self, blocks: Vec<CoachBlock>);
}

/// Adapter executing named tools on behalf of a turn
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute `tool_name` once with `args`
    ///
    /// # Errors
    ///
    /// Returns `ToolError` when the tool is unknown, the arguments are
    /// invalid, or the tool fails.
    async fn execute(
        &self,
        tool_name: &str,
        args: Value,
        context: &ToolContext,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError>;

    /// The tool catalogue advertised to the model
    fn describe(&self) -> Vec<FunctionDeclaration>;
}
