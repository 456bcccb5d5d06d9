// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides scripted model providers, recording tool executors and resource builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `pierre_coach`
//!
//! Integration tests drive the controller and routes with a scripted model
//! and the real in-memory workout tools wrapped in a recorder.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use pierre_coach::{
    auth::{AuthProvider, JwtAuth},
    coach::TurnController,
    config::TurnConfig,
    errors::{AppError, ToolError},
    llm::{
        ChatMessage, ChatRequest, ChatResponseWithTools, FunctionCall, FunctionDeclaration,
        LlmCapabilities, LlmProvider, Tool,
    },
    models::{Message, Preferences, TurnRequest},
    rate_limiting::{InMemoryRateLimiter, RateLimiter},
    resources::CoachResources,
    tools::{InMemoryWorkoutTools, ProgressSink, ToolContext, ToolExecutor, ToolOutput},
};
use serde_json::Value;

static INIT_LOGGER: Once = Once::new();

/// Secret shared by test tokens and the test verifier
pub const TEST_JWT_SECRET: &str = "coach-test-secret-at-least-32-bytes-long";

/// Model name reported by [`ScriptedProvider`]
pub const SCRIPTED_MODEL: &str = "scripted-model";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Scripted Model
// ============================================================================

/// One scripted model reply
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Answer with this response
    Respond(ChatResponseWithTools),
    /// Fail with an external service error carrying this message
    Fail(String),
    /// Never answer
    Hang,
}

/// Model provider replaying a fixed script, one step per completion
///
/// An exhausted script fails every further call.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptStep>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Messages sent with each completion, in order
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &str {
        "Scripted Test Model"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::tool_calling()
    }

    fn default_model(&self) -> &str {
        SCRIPTED_MODEL
    }

    async fn complete_with_tools(
        &self,
        request: &ChatRequest,
        _tools: &[Tool],
    ) -> Result<ChatResponseWithTools, AppError> {
        self.requests.lock().unwrap().push(request.messages.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(ScriptStep::Respond(response)) => Ok(response),
            Some(ScriptStep::Fail(message)) => Err(AppError::external_service("scripted", message)),
            Some(ScriptStep::Hang) => std::future::pending().await,
            None => Err(AppError::external_service("scripted", "script exhausted")),
        }
    }
}

/// Text answer step
pub fn answer(text: &str) -> ScriptStep {
    ScriptStep::Respond(ChatResponseWithTools::text(text, SCRIPTED_MODEL))
}

/// Tool call step with a single call
pub fn call(id: &str, tool: &str, arguments: &str) -> ScriptStep {
    ScriptStep::Respond(ChatResponseWithTools::tool_calls(
        vec![FunctionCall::new(id, tool, arguments)],
        SCRIPTED_MODEL,
    ))
}

/// Tool call step with several calls in one round
pub fn calls(calls: &[(&str, &str, &str)]) -> ScriptStep {
    ScriptStep::Respond(ChatResponseWithTools::tool_calls(
        calls
            .iter()
            .map(|(id, tool, arguments)| FunctionCall::new(*id, *tool, *arguments))
            .collect(),
        SCRIPTED_MODEL,
    ))
}

// ============================================================================
// Recording Tools
// ============================================================================

/// Tool executor recording every call before delegating to the workout tools
pub struct RecordingTools {
    inner: Arc<dyn ToolExecutor>,
    store: Arc<InMemoryWorkoutTools>,
    calls: Mutex<Vec<(String, Value)>>,
    failing: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
}

impl RecordingTools {
    pub fn new() -> Arc<Self> {
        let store = Arc::new(InMemoryWorkoutTools::new());
        let registry = store.registry().unwrap();
        Arc::new(Self {
            inner: Arc::new(registry),
            store,
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            hanging: Mutex::new(HashSet::new()),
        })
    }

    /// Make every call to `tool` fail
    pub fn fail(&self, tool: &str) {
        self.failing.lock().unwrap().insert(tool.to_owned());
    }

    /// Make every call to `tool` wait forever
    pub fn hang(&self, tool: &str) {
        self.hanging.lock().unwrap().insert(tool.to_owned());
    }

    /// Names of the tools called, in order
    pub fn called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Arguments of every call, in order
    pub fn arguments(&self) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, args)| args.clone())
            .collect()
    }

    /// Backing workout store
    pub fn store(&self) -> &Arc<InMemoryWorkoutTools> {
        &self.store
    }
}

#[async_trait]
impl ToolExecutor for RecordingTools {
    async fn execute(
        &self,
        tool_name: &str,
        args: Value,
        context: &ToolContext,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((tool_name.to_owned(), args.clone()));

        let hangs = self.hanging.lock().unwrap().contains(tool_name);
        let fails = self.failing.lock().unwrap().contains(tool_name);
        if hangs {
            return std::future::pending().await;
        }
        if fails {
            return Err(ToolError::execution_failed(tool_name, "store unavailable"));
        }
        self.inner.execute(tool_name, args, context, progress).await
    }

    fn describe(&self) -> Vec<FunctionDeclaration> {
        self.inner.describe()
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Turn request with one user message and default preferences
pub fn turn_request(text: &str) -> TurnRequest {
    TurnRequest {
        messages: vec![Message::user(text)],
        preferences: Preferences::default(),
    }
}

/// Tool context for direct planner and fallback runs
pub fn tool_context(subject: &str) -> ToolContext {
    ToolContext::new(subject, Preferences::default(), "test-turn")
}

/// Turn limits with a short deadline
pub fn test_turn_config() -> TurnConfig {
    TurnConfig {
        timeout_secs: 5,
        max_planner_rounds: 3,
        sse_padding_bytes: 64,
        ..TurnConfig::default()
    }
}

/// Controller over `tools`, using `provider` when given
pub fn test_controller(
    provider: Option<Arc<ScriptedProvider>>,
    tools: Arc<RecordingTools>,
    config: TurnConfig,
) -> Arc<TurnController> {
    init_test_logging();
    let provider = provider.map(|p| p as Arc<dyn LlmProvider>);
    Arc::new(TurnController::new(provider, tools, config).unwrap())
}

/// Resources with JWT auth and a generous rate limit
pub fn test_resources(controller: Arc<TurnController>) -> Arc<CoachResources> {
    test_resources_with_limit(controller, 100)
}

/// Resources with JWT auth and `limit` requests per minute
pub fn test_resources_with_limit(controller: Arc<TurnController>, limit: u32) -> Arc<CoachResources> {
    let auth: Arc<dyn AuthProvider> = Arc::new(JwtAuth::new(TEST_JWT_SECRET));
    let rate_limiter: Arc<dyn RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(limit, Duration::from_secs(60)));
    Arc::new(CoachResources::new(Some(auth), rate_limiter, controller))
}

/// `Authorization` header value for `subject`
pub fn bearer(subject: &str) -> String {
    let token = JwtAuth::new(TEST_JWT_SECRET)
        .issue_token(subject, chrono::Duration::hours(1))
        .unwrap();
    format!("Bearer {token}")
}
