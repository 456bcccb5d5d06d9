// ABOUTME: Generic OpenAI-compatible LLM provider for Groq, OpenAI and local endpoints
// ABOUTME: Implements tool-calling chat completion over the chat/completions API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Provider
//!
//! One implementation serves every supported backend because Groq, `OpenAI`
//! and local servers (Ollama, vLLM, `LocalAI`) all speak the same
//! chat completions dialect.
//!
//! ## Supported Backends
//!
//! - **Groq**: <https://api.groq.com/openai/v1>
//! - **`OpenAI`**: <https://api.openai.com/v1>
//! - **Ollama**: <http://localhost:11434/v1>
//! - **Any `OpenAI`-compatible endpoint**

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::{
    ChatMessage, ChatRequest, ChatResponseWithTools, FunctionCall, LlmCapabilities, LlmProvider,
    MessageRole, TokenUsage, Tool,
};
use crate::errors::{AppError, ErrorCode};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Groq API base URL
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default Groq model
const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// `OpenAI` API base URL
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default `OpenAI` model
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default local base URL (Ollama)
const LOCAL_BASE_URL: &str = "http://localhost:11434/v1";
/// Default model for local inference
const LOCAL_DEFAULT_MODEL: &str = "qwen2.5:14b-instruct";
/// Connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Upper bound on a single exchange; the turn deadline is normally shorter
const REQUEST_TIMEOUT_SECS: u64 = 120;
/// Low temperature keeps tool selection stable
const DEFAULT_TEMPERATURE: f32 = 0.2;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        let tool_calls = (!msg.tool_calls.is_empty()).then(|| {
            msg.tool_calls
                .iter()
                .map(|call| OpenAiToolCall {
                    id: call.id.clone(),
                    call_type: "function".to_owned(),
                    function: OpenAiFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect()
        });
        // Assistant turns that only carry tool calls send a null content
        let content = if tool_calls.is_some() && msg.content.is_empty() {
            None
        } else {
            Some(msg.content.clone())
        };
        Self {
            role: msg.role.as_str().to_owned(),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

fn function_type() -> String {
    "function".to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
    /// Provider name for logging
    pub provider_name: &'static str,
    /// Provider display name
    pub display_name: String,
    /// Capabilities of this provider
    pub capabilities: LlmCapabilities,
}

impl OpenAiCompatibleConfig {
    /// Groq cloud inference
    #[must_use]
    pub fn groq(api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            base_url: GROQ_BASE_URL.to_owned(),
            api_key: Some(api_key.into()),
            default_model: model.unwrap_or_else(|| GROQ_DEFAULT_MODEL.to_owned()),
            provider_name: "groq",
            display_name: "Groq".to_owned(),
            capabilities: LlmCapabilities::tool_calling(),
        }
    }

    /// `OpenAI` cloud inference
    #[must_use]
    pub fn openai(api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_owned(),
            api_key: Some(api_key.into()),
            default_model: model.unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_owned()),
            provider_name: "openai",
            display_name: "OpenAI".to_owned(),
            capabilities: LlmCapabilities::tool_calling(),
        }
    }

    /// Local OpenAI-compatible server
    #[must_use]
    pub fn local(base_url: Option<String>, api_key: Option<String>, model: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| LOCAL_BASE_URL.to_owned());
        // Detect the backend from the port for friendlier logs
        let display_name = if base_url.contains(":11434") {
            "Ollama (Local)"
        } else if base_url.contains(":8000") {
            "vLLM (Local)"
        } else if base_url.contains(":8080") {
            "LocalAI"
        } else {
            "Local LLM"
        };
        Self {
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            default_model: model.unwrap_or_else(|| LOCAL_DEFAULT_MODEL.to_owned()),
            provider_name: "local",
            display_name: display_name.to_owned(),
            capabilities: LlmCapabilities::tool_calling(),
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "Initializing {} provider: base_url={}, model={}",
            config.display_name, config.base_url, config.default_model
        );
        Ok(Self { client, config })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn service_name(&self) -> &str {
        &self.config.display_name
    }

    fn convert_tools(tools: &[Tool]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .flat_map(|tool| {
                tool.function_declarations.iter().map(|func| OpenAiTool {
                    tool_type: "function".to_owned(),
                    function: OpenAiFunction {
                        name: func.name.clone(),
                        description: func.description.clone(),
                        parameters: func.parameters.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_tool_calls(tool_calls: Vec<OpenAiToolCall>) -> Vec<FunctionCall> {
        tool_calls
            .into_iter()
            .map(|call| {
                debug!(
                    tool_call_id = %call.id,
                    tool_call_type = %call.call_type,
                    function_name = %call.function.name,
                    "Converting tool call to FunctionCall"
                );
                // Some local servers omit ids; later rounds must not reuse them
                let id = if call.id.is_empty() {
                    format!("call_{}", Uuid::new_v4().simple())
                } else {
                    call.id
                };
                FunctionCall::new(id, call.function.name, call.function.arguments)
            })
            .collect()
    }

    fn parse_error_response(&self, status: reqwest::StatusCode, body: &str) -> AppError {
        let service = self.service_name();
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let error_type = error_response
                .error
                .error_type
                .unwrap_or_else(|| "unknown".to_owned());
            match status.as_u16() {
                401 | 403 => AppError::external_service(
                    service,
                    format!("API authentication failed: {}", error_response.error.message),
                ),
                429 => AppError::new(
                    ErrorCode::ExternalRateLimited,
                    format!("{service} rate limit reached: {}", error_response.error.message),
                ),
                503 => AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    format!("{service} unavailable: {}", error_response.error.message),
                ),
                _ => AppError::external_service(
                    service,
                    format!("{} - {}", error_type, error_response.error.message),
                ),
            }
        } else {
            AppError::external_service(
                service,
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }

    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.bearer_auth(api_key)
        } else {
            request
        }
    }

    fn build_request(&self, request: &ChatRequest, tools: &[Tool]) -> OpenAiRequest {
        let openai_tools = Self::convert_tools(tools);
        let has_tools = !openai_tools.is_empty();
        OpenAiRequest {
            model: self.config.default_model.clone(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: DEFAULT_TEMPERATURE,
            stream: false,
            tools: has_tools.then_some(openai_tools),
            tool_choice: has_tools.then(|| "auto".to_owned()),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        self.config.provider_name
    }

    fn display_name(&self) -> &str {
        &self.config.display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request, tools), fields(provider = %self.config.provider_name, messages = request.messages.len()))]
    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        tools: &[Tool],
    ) -> Result<ChatResponseWithTools, AppError> {
        let openai_request = self.build_request(request, tools);
        debug!(
            "Sending chat completion request to {} with {} messages, tools={}",
            self.config.provider_name,
            openai_request.messages.len(),
            openai_request.tools.as_ref().map_or(0, Vec::len)
        );

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .json(&openai_request);

        let response = self
            .add_auth_header(http_request)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "Failed to send request to {}: {}",
                    self.config.provider_name, e
                );
                if e.is_connect() {
                    AppError::new(
                        ErrorCode::ExternalServiceUnavailable,
                        format!(
                            "Cannot connect to {} at {}",
                            self.config.display_name, self.config.base_url
                        ),
                    )
                } else {
                    AppError::external_service(self.service_name(), format!("Failed to connect: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read API response: {}", e);
            AppError::external_service(self.service_name(), format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(self.parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to parse API response: {} - body: {}",
                e,
                body.chars().take(500).collect::<String>()
            );
            AppError::external_service(self.service_name(), format!("Failed to parse response: {e}"))
        })?;

        let choice = openai_response.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service(self.service_name(), "API returned no choices")
        })?;

        let function_calls = choice
            .message
            .tool_calls
            .map(Self::convert_tool_calls)
            .unwrap_or_default();
        if !function_calls.is_empty() {
            info!(
                "{} returned {} tool calls",
                self.config.provider_name,
                function_calls.len()
            );
        }

        Ok(ChatResponseWithTools {
            content: choice.message.content,
            function_calls,
            model: openai_response
                .model
                .unwrap_or_else(|| self.config.default_model.clone()),
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}
