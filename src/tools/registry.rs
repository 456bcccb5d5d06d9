// ABOUTME: Central registry for coach tools implementing the ToolExecutor adapter
// ABOUTME: Provides registration, lookup, catalogue generation and logged execution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Registry
//!
//! Central registry for coach tools, providing:
//! - Tool registration and lookup
//! - Capability-based filtering
//! - The function catalogue advertised to the model
//!
//! The registry is built once at startup and then used immutably. The
//! catalogue is emitted in registration order so identical turns send
//! identical requests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ToolError;
use crate::llm::FunctionDeclaration;
use crate::logging::AppLogger;

use super::traits::CoachTool;
use super::{ProgressSink, ToolContext, ToolExecutor, ToolOutput};

/// Central registry for coach tools
pub struct ToolRegistry {
    /// Registered tools by name
    tools: HashMap<String, Arc<dyn CoachTool>>,
    /// Registration order
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool in the registry
    ///
    /// # Errors
    ///
    /// Returns `ToolError::AlreadyRegistered` if a tool with the same name exists
    pub fn register(&mut self, tool: Arc<dyn CoachTool>) -> Result<(), ToolError> {
        let name = tool.name().to_owned();

        if self.tools.contains_key(&name) {
            warn!("Tool '{}' is already registered, skipping", name);
            return Err(ToolError::already_registered(name));
        }

        debug!(
            "Registering tool '{}' with capabilities: {}",
            name,
            tool.capabilities().describe()
        );
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CoachTool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in registration order
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .field("tools", &self.tool_names())
            .finish()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(
        &self,
        tool_name: &str,
        args: Value,
        context: &ToolContext,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(tool_name)
            .ok_or_else(|| ToolError::not_found(tool_name))?;

        let started = Instant::now();
        let result = tool.execute(args, context, progress).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        AppLogger::log_tool_call(&context.subject, tool_name, result.is_ok(), duration_ms);
        if let Err(ref e) = result {
            warn!(coach.turn_id = %context.turn_id, coach.tool = %tool_name, "Tool failed: {e}");
        }
        result
    }

    fn describe(&self) -> Vec<FunctionDeclaration> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| FunctionDeclaration {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: Some(tool.input_schema()),
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Preferences;
    use crate::tools::traits::ToolCapabilities;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl CoachTool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the arguments back"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        fn capabilities(&self) -> ToolCapabilities {
            ToolCapabilities::READS_DATA
        }

        async fn execute(
            &self,
            args: Value,
            _context: &ToolContext,
            _progress: Option<&dyn ProgressSink>,
        ) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new(vec![], args, "echoed"))
        }
    }

    fn context() -> ToolContext {
        ToolContext::new("user-1", Preferences::default(), "turn-1")
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let err = registry.register(Arc::new(EchoTool)).unwrap_err();
        assert_eq!(err, ToolError::already_registered("echo"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("missing", json!({}), &context(), None)
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::not_found("missing"));
    }

    #[tokio::test]
    async fn test_execute_and_describe() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();

        let output = registry
            .execute("echo", json!({"x": 1}), &context(), None)
            .await
            .unwrap();
        assert_eq!(output.output_for_model, json!({"x": 1}));

        let catalogue = registry.describe();
        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue[0].name, "echo");
    }
}
