// ABOUTME: Defines the CoachTool trait and ToolCapabilities for pluggable coach tools
// ABOUTME: Tools implement this trait to be registered and executed via the ToolRegistry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Coach Tool Trait and Capabilities
//!
//! All tools implement [`CoachTool`], which provides:
//! - Tool metadata (name, description, input schema)
//! - Capability flags for logging and filtering
//! - Async execution with context and optional progress reporting

use async_trait::async_trait;
use bitflags::bitflags;
use serde_json::Value;

use crate::errors::ToolError;

use super::{ProgressSink, ToolContext, ToolOutput};

bitflags! {
    /// Capabilities that tools declare for filtering and discovery
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToolCapabilities: u8 {
        /// Tool reads workout data
        const READS_DATA = 0b0000_0001;
        /// Tool writes workout data
        const WRITES_DATA = 0b0000_0010;
        /// Tool performs analytics/calculations
        const ANALYTICS = 0b0000_0100;
        /// Tool changes user preferences
        const CONFIGURATION = 0b0000_1000;
        /// Tool emits partial output while running
        const REPORTS_PROGRESS = 0b0001_0000;
    }
}

impl ToolCapabilities {
    /// Check if tool writes data
    #[must_use]
    pub const fn writes_data(self) -> bool {
        self.contains(Self::WRITES_DATA)
    }

    /// Check if tool reports progress
    #[must_use]
    pub const fn reports_progress(self) -> bool {
        self.contains(Self::REPORTS_PROGRESS)
    }

    /// Get a description of all enabled capabilities for logging
    #[must_use]
    pub fn describe(&self) -> String {
        let parts: Vec<&str> = [
            (Self::READS_DATA, "reads_data"),
            (Self::WRITES_DATA, "writes_data"),
            (Self::ANALYTICS, "analytics"),
            (Self::CONFIGURATION, "configuration"),
            (Self::REPORTS_PROGRESS, "reports_progress"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();

        if parts.is_empty() {
            "none".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// The trait every coach tool implements
///
/// Tools are `Send + Sync` so a single instance serves all turns.
#[async_trait]
pub trait CoachTool: Send + Sync {
    /// Unique identifier for the tool (e.g., `log_set`)
    fn name(&self) -> &'static str;

    /// Description for LLM consumption
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Capability flags
    fn capabilities(&self) -> ToolCapabilities;

    /// Execute the tool once
    ///
    /// # Errors
    ///
    /// Returns `ToolError` for invalid arguments or execution failures
    async fn execute(
        &self,
        args: Value,
        context: &ToolContext,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_capabilities() {
        let caps = ToolCapabilities::READS_DATA | ToolCapabilities::ANALYTICS;
        assert_eq!(caps.describe(), "reads_data, analytics");
        assert_eq!(ToolCapabilities::empty().describe(), "none");
        assert!(!caps.writes_data());
    }
}
