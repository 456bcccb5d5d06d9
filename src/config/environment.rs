// ABOUTME: Environment configuration for the coach server
// ABOUTME: Parses ports, turn limits, rate-limit quota, auth secret and model runtime settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration
//!
//! Every setting has a default except secrets. A missing secret does not
//! abort startup: the affected requests answer 500 until it is provided.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::constants::{env_config, limits, ports};

use super::types::LlmProviderType;

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Turn orchestration limits
    pub turn: TurnConfig,
    /// Per-subject quota
    pub rate_limit: RateLimitConfig,
    /// Bearer token verification
    pub auth: AuthConfig,
    /// Model runtime selection
    pub llm: LlmConfig,
}

/// Turn orchestration limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnConfig {
    /// Wall-clock deadline per turn
    pub timeout_secs: u64,
    /// Planner round limit
    pub max_planner_rounds: usize,
    /// Size of the comment frame sent after `start`
    pub sse_padding_bytes: usize,
    /// History messages forwarded to the model
    pub max_history_messages: usize,
}

impl TurnConfig {
    /// Turn deadline as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject limits that would leave a turn unable to run
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable whose value is below 1
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            (env_config::COACH_TURN_TIMEOUT_SECS, self.timeout_secs),
            (env_config::COACH_MAX_PLANNER_ROUNDS, self.max_planner_rounds as u64),
            (env_config::COACH_MAX_HISTORY_MESSAGES, self.max_history_messages as u64),
        ] {
            if value == 0 {
                bail!("Invalid {name} value: must be at least 1");
            }
        }
        Ok(())
    }
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            timeout_secs: limits::TURN_DEADLINE_SECS,
            max_planner_rounds: limits::MAX_PLANNER_ROUNDS,
            sse_padding_bytes: limits::SSE_PADDING_BYTES,
            max_history_messages: limits::MAX_HISTORY_MESSAGES,
        }
    }
}

/// Fixed-window rate limit settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: limits::DEFAULT_RATE_LIMIT_REQUESTS,
            window_secs: limits::DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

/// Bearer token settings
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// HS256 secret; `None` means authentication is misconfigured
    pub jwt_secret: Option<String>,
}

/// Model runtime settings
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// Selected provider
    pub provider: LlmProviderType,
    /// Model override
    pub model: Option<String>,
    /// Base URL override (local provider only)
    pub base_url: Option<String>,
    /// API key for the selected provider
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed or a turn
    /// limit is zero
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let provider = LlmProviderType::from_str_or_default(&env_var_or(
            env_config::PIERRE_LLM_PROVIDER,
            "none",
        ));
        let api_key = match provider {
            LlmProviderType::Groq => optional_env(env_config::GROQ_API_KEY),
            LlmProviderType::OpenAi => optional_env(env_config::OPENAI_API_KEY),
            LlmProviderType::Local => optional_env(env_config::LOCAL_LLM_API_KEY),
            LlmProviderType::None => None,
        };

        let config = Self {
            http_port: env_var_or(env_config::HTTP_PORT, &ports::DEFAULT_HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            turn: TurnConfig {
                timeout_secs: env_var_or(
                    env_config::COACH_TURN_TIMEOUT_SECS,
                    &limits::TURN_DEADLINE_SECS.to_string(),
                )
                .parse()
                .context("Invalid COACH_TURN_TIMEOUT_SECS value")?,
                max_planner_rounds: env_var_or(
                    env_config::COACH_MAX_PLANNER_ROUNDS,
                    &limits::MAX_PLANNER_ROUNDS.to_string(),
                )
                .parse()
                .context("Invalid COACH_MAX_PLANNER_ROUNDS value")?,
                sse_padding_bytes: env_var_or(
                    env_config::COACH_SSE_PADDING_BYTES,
                    &limits::SSE_PADDING_BYTES.to_string(),
                )
                .parse()
                .context("Invalid COACH_SSE_PADDING_BYTES value")?,
                max_history_messages: env_var_or(
                    env_config::COACH_MAX_HISTORY_MESSAGES,
                    &limits::MAX_HISTORY_MESSAGES.to_string(),
                )
                .parse()
                .context("Invalid COACH_MAX_HISTORY_MESSAGES value")?,
            },
            rate_limit: RateLimitConfig {
                requests: env_var_or(
                    env_config::COACH_RATE_LIMIT_REQUESTS,
                    &limits::DEFAULT_RATE_LIMIT_REQUESTS.to_string(),
                )
                .parse()
                .context("Invalid COACH_RATE_LIMIT_REQUESTS value")?,
                window_secs: env_var_or(
                    env_config::COACH_RATE_LIMIT_WINDOW_SECS,
                    &limits::DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string(),
                )
                .parse()
                .context("Invalid COACH_RATE_LIMIT_WINDOW_SECS value")?,
            },
            auth: AuthConfig {
                jwt_secret: optional_env(env_config::PIERRE_JWT_SECRET),
            },
            llm: LlmConfig {
                provider,
                model: optional_env(env_config::PIERRE_LLM_MODEL),
                base_url: optional_env(env_config::LOCAL_LLM_BASE_URL),
                api_key,
            },
        };

        config
            .turn
            .validate()
            .context("Invalid turn configuration")?;
        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        info!(
            "Coach config: port={}, turn_timeout={}s, max_rounds={}, llm_provider={}",
            self.http_port, self.turn.timeout_secs, self.turn.max_planner_rounds, self.llm.provider
        );
        if self.auth.jwt_secret.is_none() {
            warn!(
                "{} is not set; coach turns will fail with a configuration error",
                env_config::PIERRE_JWT_SECRET
            );
        }
        if self.llm.provider.is_enabled()
            && self.llm.provider != LlmProviderType::Local
            && self.llm.api_key.is_none()
        {
            warn!(
                "LLM provider {} selected without an API key; coach turns will fail",
                self.llm.provider
            );
        }
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a non-empty environment variable
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            env_config::HTTP_PORT,
            env_config::COACH_TURN_TIMEOUT_SECS,
            env_config::COACH_MAX_PLANNER_ROUNDS,
            env_config::COACH_MAX_HISTORY_MESSAGES,
            env_config::COACH_RATE_LIMIT_REQUESTS,
            env_config::PIERRE_JWT_SECRET,
            env_config::PIERRE_LLM_PROVIDER,
            env_config::GROQ_API_KEY,
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, ports::DEFAULT_HTTP_PORT);
        assert_eq!(config.turn, TurnConfig::default());
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert!(config.auth.jwt_secret.is_none());
        assert_eq!(config.llm.provider, LlmProviderType::None);
    }

    #[test]
    #[serial]
    fn test_overrides_and_provider_key() {
        clear_env();
        env::set_var(env_config::COACH_MAX_PLANNER_ROUNDS, "3");
        env::set_var(env_config::PIERRE_LLM_PROVIDER, "groq");
        env::set_var(env_config::GROQ_API_KEY, "gsk_test");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.turn.max_planner_rounds, 3);
        assert_eq!(config.llm.provider, LlmProviderType::Groq);
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk_test"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_rejected() {
        clear_env();
        env::set_var(env_config::COACH_TURN_TIMEOUT_SECS, "soon");
        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("COACH_TURN_TIMEOUT_SECS"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_turn_limits_are_rejected() {
        for key in [
            env_config::COACH_TURN_TIMEOUT_SECS,
            env_config::COACH_MAX_PLANNER_ROUNDS,
            env_config::COACH_MAX_HISTORY_MESSAGES,
        ] {
            clear_env();
            env::set_var(key, "0");
            let err = ServerConfig::from_env().unwrap_err();
            assert!(format!("{err:#}").contains(key), "{key} accepted zero");
        }
        clear_env();
    }
}
