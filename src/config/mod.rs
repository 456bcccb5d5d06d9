// ABOUTME: Configuration module for the coach server
// ABOUTME: Environment-driven settings for HTTP, turn limits, rate limiting, auth and the model runtime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment-based server configuration
pub mod environment;
/// Configuration enums
pub mod types;

pub use environment::{AuthConfig, LlmConfig, RateLimitConfig, ServerConfig, TurnConfig};
pub use types::LlmProviderType;
