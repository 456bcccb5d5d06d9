// ABOUTME: Core configuration type definitions for the coach server
// ABOUTME: Contains the LlmProviderType selector parsed from PIERRE_LLM_PROVIDER
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Model runtime selection
///
/// `None` runs every turn through the deterministic fallback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// No model runtime (default)
    #[default]
    None,
    /// Groq cloud inference
    Groq,
    /// `OpenAI` cloud inference
    OpenAi,
    /// Local `OpenAI`-compatible endpoint (Ollama, vLLM, `LocalAI`)
    Local,
}

impl LlmProviderType {
    /// Parse from string with fallback to default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "groq" => Self::Groq,
            "openai" => Self::OpenAi,
            "local" | "ollama" | "vllm" | "localai" => Self::Local,
            _ => Self::None, // Default fallback (including "none")
        }
    }

    /// Whether a model runtime was requested
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Display for LlmProviderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::None => write!(f, "none"),
            Self::Groq => write!(f, "groq"),
            Self::OpenAi => write!(f, "openai"),
            Self::Local => write!(f, "local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!(LlmProviderType::from_str_or_default("GROQ"), LlmProviderType::Groq);
        assert_eq!(LlmProviderType::from_str_or_default("ollama"), LlmProviderType::Local);
        assert_eq!(LlmProviderType::from_str_or_default("openai"), LlmProviderType::OpenAi);
        assert_eq!(LlmProviderType::from_str_or_default("bogus"), LlmProviderType::None);
        assert!(!LlmProviderType::None.is_enabled());
        assert_eq!(LlmProviderType::OpenAi.to_string(), "openai");
    }
}
