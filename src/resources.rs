// ABOUTME: Shared server resources handed to every coach route
// ABOUTME: Wires auth, rate limiting, the tool registry and the model runtime from configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Built once at startup and shared through `Arc`. Missing secrets do not
//! prevent startup; they are reported per request as configuration errors.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::auth::{AuthProvider, JwtAuth};
use crate::coach::TurnController;
use crate::config::{LlmConfig, LlmProviderType, ServerConfig};
use crate::constants::env_config;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use crate::rate_limiting::{InMemoryRateLimiter, RateLimiter};
use crate::tools::ToolExecutor;

/// Everything a coach request needs
pub struct CoachResources {
    auth: Option<Arc<dyn AuthProvider>>,
    rate_limiter: Arc<dyn RateLimiter>,
    controller: Arc<TurnController>,
    misconfiguration: Option<String>,
}

impl CoachResources {
    /// Assemble resources from parts
    #[must_use]
    pub fn new(
        auth: Option<Arc<dyn AuthProvider>>,
        rate_limiter: Arc<dyn RateLimiter>,
        controller: Arc<TurnController>,
    ) -> Self {
        Self {
            auth,
            rate_limiter,
            controller,
            misconfiguration: None,
        }
    }

    /// Mark the server as misconfigured; turns answer 500 with `message`
    #[must_use]
    pub fn with_misconfiguration(mut self, message: impl Into<String>) -> Self {
        self.misconfiguration = Some(message.into());
        self
    }

    /// Build resources from environment configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or intent rules cannot be created
    pub fn from_config(config: &ServerConfig, tools: Arc<dyn ToolExecutor>) -> AppResult<Self> {
        let (provider, misconfiguration) = match build_llm_provider(&config.llm) {
            Ok(provider) => (provider, None),
            Err(e) if e.code == ErrorCode::ConfigMissing => {
                warn!("Model runtime unavailable: {}", e.message);
                (None, Some(e.message))
            }
            Err(e) => return Err(e),
        };

        let controller = Arc::new(TurnController::new(provider, tools, config.turn.clone())?);
        let auth = config
            .auth
            .jwt_secret
            .as_deref()
            .map(|secret| Arc::new(JwtAuth::new(secret)) as Arc<dyn AuthProvider>);
        let rate_limiter = Arc::new(InMemoryRateLimiter::new(
            config.rate_limit.requests,
            Duration::from_secs(config.rate_limit.window_secs),
        ));

        info!(
            "Coach resources ready: model={}, auth={}",
            controller.model_label(),
            if auth.is_some() { "jwt" } else { "missing" }
        );

        let resources = Self::new(auth, rate_limiter, controller);
        Ok(match misconfiguration {
            Some(message) => resources.with_misconfiguration(message),
            None => resources,
        })
    }

    /// The authentication provider
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` when no JWT secret is configured
    pub fn auth(&self) -> AppResult<&dyn AuthProvider> {
        self.auth.as_deref().ok_or_else(|| {
            AppError::config_missing(format!(
                "{} is not configured",
                env_config::PIERRE_JWT_SECRET
            ))
        })
    }

    /// The rate limiter
    #[must_use]
    pub fn rate_limiter(&self) -> &dyn RateLimiter {
        self.rate_limiter.as_ref()
    }

    /// The turn controller
    #[must_use]
    pub const fn controller(&self) -> &Arc<TurnController> {
        &self.controller
    }

    /// Fail when the selected model runtime could not be built
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` with the recorded reason
    pub fn ensure_configured(&self) -> AppResult<()> {
        self.misconfiguration
            .as_ref()
            .map_or(Ok(()), |message| Err(AppError::config_missing(message.clone())))
    }
}

/// Build the model runtime selected by `config`
///
/// Returns `Ok(None)` when no runtime is selected.
///
/// # Errors
///
/// Returns `ConfigMissing` when the selected cloud provider has no API key
/// or the runtime cannot call tools
pub fn build_llm_provider(config: &LlmConfig) -> AppResult<Option<Arc<dyn LlmProvider>>> {
    let provider_config = match config.provider {
        LlmProviderType::None => return Ok(None),
        LlmProviderType::Groq => OpenAiCompatibleConfig::groq(
            require_key(config, env_config::GROQ_API_KEY)?,
            config.model.clone(),
        ),
        LlmProviderType::OpenAi => OpenAiCompatibleConfig::openai(
            require_key(config, env_config::OPENAI_API_KEY)?,
            config.model.clone(),
        ),
        LlmProviderType::Local => OpenAiCompatibleConfig::local(
            config.base_url.clone(),
            config.api_key.clone(),
            config.model.clone(),
        ),
    };
    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatibleProvider::new(provider_config)?);
    require_tool_calling(provider).map(Some)
}

/// Accept only runtimes able to drive the planner
///
/// # Errors
///
/// Returns `ConfigMissing` when the provider lacks tool calling or system messages
pub fn require_tool_calling(provider: Arc<dyn LlmProvider>) -> AppResult<Arc<dyn LlmProvider>> {
    if !provider.capabilities().can_plan() {
        return Err(AppError::config_missing(format!(
            "LLM provider '{}' ({}) does not support tool calling",
            provider.name(),
            provider.display_name()
        )));
    }
    info!(
        provider = provider.name(),
        model = provider.default_model(),
        "Model runtime ready: {}",
        provider.display_name()
    );
    Ok(provider)
}

fn require_key(config: &LlmConfig, env_var: &str) -> AppResult<String> {
    config.api_key.clone().ok_or_else(|| {
        AppError::config_missing(format!(
            "LLM provider '{}' selected but {env_var} is not set",
            config.provider
        ))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::llm::{ChatRequest, ChatResponseWithTools, LlmCapabilities, Tool};

    struct TextOnlyProvider;

    #[async_trait]
    impl LlmProvider for TextOnlyProvider {
        fn name(&self) -> &'static str {
            "text-only"
        }

        fn display_name(&self) -> &str {
            "Text Only"
        }

        fn capabilities(&self) -> LlmCapabilities {
            LlmCapabilities::SYSTEM_MESSAGES
        }

        fn default_model(&self) -> &str {
            "text-model"
        }

        async fn complete_with_tools(
            &self,
            _request: &ChatRequest,
            _tools: &[Tool],
        ) -> Result<ChatResponseWithTools, AppError> {
            Ok(ChatResponseWithTools::text("hi", "text-model"))
        }
    }

    #[test]
    fn test_provider_without_tool_calling_is_refused() {
        let err = require_tool_calling(Arc::new(TextOnlyProvider)).err().unwrap();
        assert_eq!(err.code, ErrorCode::ConfigMissing);
        assert!(err.message.contains("text-only"));
    }

    #[test]
    fn test_local_provider_is_accepted() {
        let config = LlmConfig {
            provider: LlmProviderType::Local,
            ..LlmConfig::default()
        };
        let provider = build_llm_provider(&config).unwrap().unwrap();
        assert!(provider.capabilities().can_plan());
    }

    #[test]
    fn test_no_provider_selected() {
        assert!(build_llm_provider(&LlmConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = LlmConfig {
            provider: LlmProviderType::Groq,
            ..LlmConfig::default()
        };
        let err = build_llm_provider(&config).err().unwrap();
        assert_eq!(err.code, ErrorCode::ConfigMissing);
        assert!(err.message.contains("GROQ_API_KEY"));
    }
}
