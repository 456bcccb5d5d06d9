// ABOUTME: Turn request/response DTOs and the planner run result
// ABOUTME: Validation of incoming turns and the non-empty invariants of outgoing responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use super::blocks::{CoachBlock, WeightUnit};
use crate::constants::limits::{MAX_MESSAGE_CHARS, MAX_TIMEZONE_OFFSET_MINUTES};
use crate::constants::messages::DEFAULT_ASSISTANT_TEXT;
use crate::errors::{AppError, AppResult, ErrorCode};

/// Role of a conversation message supplied by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End user
    User,
    /// Coach reply from an earlier turn
    Assistant,
    /// Tool output from an earlier turn
    Tool,
}

/// One conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Client preferences sent with every turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Weight unit
    pub unit: WeightUnit,
    /// Whether sound feedback is on
    pub sound_enabled: bool,
    /// Client timezone offset from UTC in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone_offset_minutes: Option<i32>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            unit: WeightUnit::Kg,
            sound_enabled: true,
            timezone_offset_minutes: None,
        }
    }
}

/// Inbound turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Conversation history, oldest first
    pub messages: Vec<Message>,
    /// Client preferences
    #[serde(default)]
    pub preferences: Preferences,
}

impl TurnRequest {
    /// Validate the request before any orchestration starts
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` / `MISSING_REQUIRED_FIELD` when there is no
    /// non-blank user message, a message is too long, or the timezone offset is
    /// out of range.
    pub fn validate(&self) -> AppResult<()> {
        if self.latest_user_message().is_none() {
            return Err(AppError::new(
                ErrorCode::MissingRequiredField,
                "messages must contain a non-empty user message",
            ));
        }

        if let Some(index) = self
            .messages
            .iter()
            .position(|m| m.content.chars().count() > MAX_MESSAGE_CHARS)
        {
            return Err(AppError::invalid_input(format!(
                "messages[{index}].content exceeds {MAX_MESSAGE_CHARS} characters"
            )));
        }

        if let Some(offset) = self.preferences.timezone_offset_minutes {
            if offset.abs() > MAX_TIMEZONE_OFFSET_MINUTES {
                return Err(AppError::invalid_input(format!(
                    "preferences.timezoneOffsetMinutes must be within +/-{MAX_TIMEZONE_OFFSET_MINUTES}"
                )));
            }
        }

        Ok(())
    }

    /// Trimmed content of the most recent user message, if it is non-blank
    #[must_use]
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.trim())
            .filter(|content| !content.is_empty())
    }

    /// The most recent `limit` messages
    #[must_use]
    pub fn recent_history(&self, limit: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }
}

/// Diagnostic record of how a turn was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnTrace {
    /// Tools invoked, in order
    pub tools_used: Vec<String>,
    /// Model identifier, possibly suffixed with a failure tag
    pub model: String,
    /// Whether the deterministic path produced the answer
    pub fallback_used: bool,
}

/// Outbound turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    /// Reply text, never empty
    pub assistant_text: String,
    /// Blocks, never empty
    pub blocks: Vec<CoachBlock>,
    /// Trace record
    pub trace: TurnTrace,
}

impl TurnResponse {
    /// Assemble a response, substituting canned content for empty text or blocks
    #[must_use]
    pub fn new(assistant_text: impl Into<String>, blocks: Vec<CoachBlock>, trace: TurnTrace) -> Self {
        let assistant_text = assistant_text.into();
        let assistant_text = if assistant_text.trim().is_empty() {
            DEFAULT_ASSISTANT_TEXT.to_owned()
        } else {
            assistant_text
        };
        let blocks = if blocks.is_empty() {
            vec![CoachBlock::default_suggestions()]
        } else {
            blocks
        };
        Self {
            assistant_text,
            blocks,
            trace,
        }
    }
}

/// Outcome of one planner invocation
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerRunResult {
    /// The model produced a final answer
    Ok {
        /// Final answer text
        assistant_text: String,
        /// Blocks accumulated from tool calls
        blocks: Vec<CoachBlock>,
        /// Tools invoked, in order
        tools_used: Vec<String>,
    },
    /// The planner stopped without a final answer
    Error {
        /// Text accumulated so far
        assistant_text: String,
        /// Blocks accumulated so far
        blocks: Vec<CoachBlock>,
        /// Tools invoked before the failure
        tools_used: Vec<String>,
        /// Human-readable failure description
        message: String,
        /// Whether the failure was a cancellation
        cancelled: bool,
    },
}

impl PlannerRunResult {
    /// Tools invoked during the run
    #[must_use]
    pub fn tools_used(&self) -> &[String] {
        match self {
            Self::Ok { tools_used, .. } | Self::Error { tools_used, .. } => tools_used,
        }
    }

    /// Whether the run ended because its scope was cancelled
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Error { cancelled: true, .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(messages: Vec<Message>) -> TurnRequest {
        TurnRequest {
            messages,
            preferences: Preferences::default(),
        }
    }

    #[test]
    fn test_request_deserializes_camel_case_preferences() {
        let json = serde_json::json!({
            "messages": [{"role": "user", "content": "show today's summary"}],
            "preferences": {"unit": "lb", "soundEnabled": false, "timezoneOffsetMinutes": -300}
        });
        let parsed: TurnRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.preferences.unit, WeightUnit::Lb);
        assert!(!parsed.preferences.sound_enabled);
        assert_eq!(parsed.preferences.timezone_offset_minutes, Some(-300));
    }

    #[test]
    fn test_validate_requires_user_message() {
        let req = request(vec![Message::assistant("hi")]);
        let err = req.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);

        let blank = request(vec![Message::user("   ")]);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_latest_user_message_wins() {
        let req = request(vec![
            Message::user("first"),
            Message::assistant("ok"),
            Message::user("  second  "),
        ]);
        assert_eq!(req.latest_user_message(), Some("second"));
    }

    #[test]
    fn test_validate_rejects_long_content_and_bad_offset() {
        let long = request(vec![Message::user("x".repeat(MAX_MESSAGE_CHARS + 1))]);
        assert_eq!(long.validate().unwrap_err().code, ErrorCode::InvalidInput);

        let mut offset = request(vec![Message::user("hi")]);
        offset.preferences.timezone_offset_minutes = Some(900);
        assert_eq!(offset.validate().unwrap_err().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_recent_history_caps_length() {
        let req = request((0..5).map(|i| Message::user(format!("m{i}"))).collect());
        let recent = req.recent_history(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "m3");
    }

    #[test]
    fn test_response_substitutes_empty_fields() {
        let trace = TurnTrace {
            tools_used: vec![],
            model: "m".into(),
            fallback_used: false,
        };
        let response = TurnResponse::new("  ", vec![], trace);
        assert_eq!(response.assistant_text, DEFAULT_ASSISTANT_TEXT);
        assert_eq!(response.blocks, vec![CoachBlock::default_suggestions()]);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("assistantText").is_some());
        assert!(json["trace"].get("fallbackUsed").is_some());
        assert!(json["trace"].get("toolsUsed").is_some());
    }
}
