// ABOUTME: LLM provider abstraction layer for the coach planner
// ABOUTME: Defines the tool-calling contract, message types, and capability flags
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Service Provider Interface
//!
//! The planner talks to a model exclusively through [`LlmProvider`]. A
//! provider receives the full conversation (system preamble first) plus the
//! tool catalogue and returns either final text or a list of tool calls.
//!
//! ## Key Concepts
//!
//! - **`LlmCapabilities`**: Bitflags describing provider features
//! - **`LlmProvider`**: Async trait for tool-calling chat completion
//! - **`ChatMessage`**: Role-based message, including tool calls and tool results
//! - **`FunctionCall`**: A tool invocation requested by the model, arguments kept raw
//!
//! ## Example: Using a Provider
//!
//! ```rust,no_run
//! use pierre_coach::llm::{ChatMessage, ChatRequest, LlmProvider, Tool};
//!
//! async fn example(provider: &dyn LlmProvider, tools: &[Tool]) {
//!     let request = ChatRequest::new(vec![
//!         ChatMessage::system("You are a concise strength coach."),
//!         ChatMessage::user("Log bench press 5 reps at 80"),
//!     ]);
//!     let response = provider.complete_with_tools(&request, tools).await;
//! }
//! ```

mod openai_compatible;
pub mod prompts;

pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

// ============================================================================
// Capability Flags
// ============================================================================

bitflags::bitflags! {
    /// LLM provider capability flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Provider supports function/tool calling
        const FUNCTION_CALLING = 0b0000_0001;
        /// Provider supports system messages
        const SYSTEM_MESSAGES = 0b0000_0010;
    }
}

impl LlmCapabilities {
    /// Capabilities every planner-capable provider must have
    #[must_use]
    pub const fn tool_calling() -> Self {
        Self::FUNCTION_CALLING.union(Self::SYSTEM_MESSAGES)
    }

    /// Whether a provider with these capabilities can drive the planner
    #[must_use]
    pub const fn can_plan(&self) -> bool {
        self.contains(Self::tool_calling())
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
    /// Tool result message
    Tool,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Provider-assigned call identifier, echoed back in the tool result
    pub id: String,
    /// Name of the function to call
    pub name: String,
    /// Raw JSON arguments as produced by the model
    pub arguments: String,
}

impl FunctionCall {
    /// Create a function call
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the arguments; blank arguments are an empty object
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the arguments are not a JSON object
    pub fn parse_args(&self) -> Result<Value, String> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(value @ Value::Object(_)) => Ok(value),
            Ok(other) => Err(format!("expected a JSON object, got {other}")),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
    /// Tool calls issued by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<FunctionCall>,
    /// Call identifier a tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Whether a tool message reports a failure
    #[serde(default)]
    pub is_error: bool,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            is_error: false,
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create an assistant message carrying the raw tool calls it requested
    #[must_use]
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<FunctionCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(MessageRole::Assistant, content)
        }
    }

    /// Create a successful tool result message
    #[must_use]
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new(MessageRole::Tool, content)
        }
    }

    /// Create a failed tool result message, content `{"error": message}`
    #[must_use]
    pub fn tool_error(call_id: impl Into<String>, message: &str) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            is_error: true,
            ..Self::new(
                MessageRole::Tool,
                serde_json::json!({ "error": message }).to_string(),
            )
        }
    }
}

impl From<&pierre_coach_core::models::Message> for ChatMessage {
    fn from(message: &pierre_coach_core::models::Message) -> Self {
        use pierre_coach_core::models::MessageRole as WireRole;
        // Client-side tool transcripts lack call ids; replay them as assistant context
        let role = match message.role {
            WireRole::User => MessageRole::User,
            WireRole::Assistant | WireRole::Tool => MessageRole::Assistant,
        };
        Self::new(role, message.content.clone())
    }
}

// ============================================================================
// Tool Catalogue Types
// ============================================================================

/// Function declaration advertised to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// Parameters schema (JSON Schema format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Group of function declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    /// Function declarations for this tool
    pub function_declarations: Vec<FunctionDeclaration>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages, system preamble first
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

/// Response from a chat completion that may contain function calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponseWithTools {
    /// Generated message content
    pub content: Option<String>,
    /// Function calls requested by the model
    pub function_calls: Vec<FunctionCall>,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (stop, `tool_calls`, length, etc.)
    pub finish_reason: Option<String>,
}

impl ChatResponseWithTools {
    /// A plain text answer with no tool calls
    #[must_use]
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            function_calls: Vec::new(),
            model: model.into(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        }
    }

    /// A response requesting tool calls
    #[must_use]
    pub fn tool_calls(calls: Vec<FunctionCall>, model: impl Into<String>) -> Self {
        Self {
            content: None,
            function_calls: calls,
            model: model.into(),
            usage: None,
            finish_reason: Some("tool_calls".to_owned()),
        }
    }

    /// Check if this response contains function calls
    #[must_use]
    pub fn has_function_calls(&self) -> bool {
        !self.function_calls.is_empty()
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// LLM provider trait for tool-calling chat completion
///
/// Implementations perform exactly one network exchange per call and never
/// retry; the planner owns the round structure.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider identifier (e.g., "groq", "openai", "local")
    fn name(&self) -> &'static str;

    /// Human-readable display name for the provider
    fn display_name(&self) -> &str;

    /// Provider capabilities
    fn capabilities(&self) -> LlmCapabilities;

    /// Model used when the request does not name one; reported in traces
    fn default_model(&self) -> &str;

    /// Perform one chat completion with the given tool catalogue
    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
    ) -> Result<ChatResponseWithTools, AppError>;
}
