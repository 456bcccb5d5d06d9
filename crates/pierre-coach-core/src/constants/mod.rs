// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Turn limits, canned coach copy, tool identifiers and configuration defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Application constants grouped by domain. Values that operators may tune
//! have an environment override in the server configuration; the constants
//! here are the defaults.

/// API endpoints
pub mod endpoints {
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// Coach turn endpoint
    pub const COACH_TURN: &str = "/api/coach/turn";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// Turn orchestration limits
pub mod limits {
    /// Maximum planner rounds before the turn gives up
    pub const MAX_PLANNER_ROUNDS: usize = 6;
    /// Wall-clock deadline for a whole turn
    pub const TURN_DEADLINE_SECS: u64 = 60;
    /// Size of the comment frame sent after `start` to flush proxy buffers
    pub const SSE_PADDING_BYTES: usize = 2048;
    /// Most recent history messages forwarded to the model
    pub const MAX_HISTORY_MESSAGES: usize = 30;
    /// Longest accepted message content, in characters
    pub const MAX_MESSAGE_CHARS: usize = 4000;
    /// Timezone offsets outside +/- 14h are rejected
    pub const MAX_TIMEZONE_OFFSET_MINUTES: i32 = 840;
    /// Bounded capacity of the per-turn event channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
    /// Default requests allowed per rate-limit window
    pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 30;
    /// Default rate-limit window length
    pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
}

/// Model identifiers
pub mod models {
    /// Trace model name when the deterministic path produced the answer
    pub const FALLBACK_MODEL_ID: &str = "fallback-deterministic";
    /// Suffix when the planner failed before running any tool
    pub const PLANNER_FAILED_SUFFIX: &str = " (planner_failed)";
    /// Suffix when the planner failed after running at least one tool
    pub const PLANNER_FAILED_PARTIAL_SUFFIX: &str = " (planner_failed_partial)";
}

/// Tool identifiers
pub mod tools {
    /// Record a performed set
    pub const LOG_SET: &str = "log_set";
    /// Summarize today's sets
    pub const GET_TODAY_SUMMARY: &str = "get_today_summary";
    /// Report history for one exercise
    pub const GET_EXERCISE_REPORT: &str = "get_exercise_report";
    /// Change the weight unit preference
    pub const SET_UNIT: &str = "set_unit";
    /// Toggle sound feedback
    pub const SET_SOUND: &str = "set_sound";
    /// Suggest what to train next
    pub const SUGGEST_WORKOUT: &str = "suggest_workout";
}

/// User-facing coach copy
pub mod messages {
    /// Substituted when a turn produced no assistant text
    pub const DEFAULT_ASSISTANT_TEXT: &str = "Here is what I found for you.";
    /// Assistant text when a turn failed after doing partial work
    pub const APOLOGY_TEXT: &str =
        "Sorry, something went wrong while I was working on that. Here is what I managed so far.";
    /// Assistant text for input the fallback cannot classify
    pub const HELP_TEXT: &str = "I can log sets, summarize today's training, report on an exercise, \
         switch between kg and lb, toggle sounds, or suggest a workout. Try something like \
         \"bench press 5 reps at 80\".";
    /// Status title for unrecognized input
    pub const TRY_WORKOUT_COMMAND_TITLE: &str = "Try a workout command";
    /// Status description for unrecognized input
    pub const TRY_WORKOUT_COMMAND_DESCRIPTION: &str =
        "I did not recognize that request. Pick one of the suggestions below.";
    /// Status title for a failed tool
    pub const TOOL_FAILED_TITLE: &str = "Tool failed";
    /// Status title for a failed planner
    pub const PLANNER_FAILED_TITLE: &str = "Coach model unavailable";
    /// Message when the planner ran out of rounds
    pub const ROUND_LIMIT_MESSAGE: &str =
        "The coach could not finish within the allowed number of steps.";
    /// Message when the turn deadline elapsed
    pub const DEADLINE_MESSAGE: &str = "The coach took too long to respond. Please try again.";
    /// Message when the caller went away
    pub const DISCONNECT_MESSAGE: &str = "The request was cancelled by the client.";
    /// Prompts of the default suggestions block
    pub const DEFAULT_SUGGESTIONS: [&str; 4] = [
        "Log bench press 5 reps at 80",
        "Show today's summary",
        "How is my squat going?",
        "What should I train next?",
    ];
}

/// Environment variable names
pub mod env_config {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Turn deadline override
    pub const COACH_TURN_TIMEOUT_SECS: &str = "COACH_TURN_TIMEOUT_SECS";
    /// Planner round limit override
    pub const COACH_MAX_PLANNER_ROUNDS: &str = "COACH_MAX_PLANNER_ROUNDS";
    /// SSE padding override
    pub const COACH_SSE_PADDING_BYTES: &str = "COACH_SSE_PADDING_BYTES";
    /// History cap override
    pub const COACH_MAX_HISTORY_MESSAGES: &str = "COACH_MAX_HISTORY_MESSAGES";
    /// Rate-limit quota override
    pub const COACH_RATE_LIMIT_REQUESTS: &str = "COACH_RATE_LIMIT_REQUESTS";
    /// Rate-limit window override
    pub const COACH_RATE_LIMIT_WINDOW_SECS: &str = "COACH_RATE_LIMIT_WINDOW_SECS";
    /// HS256 secret for bearer tokens
    pub const PIERRE_JWT_SECRET: &str = "PIERRE_JWT_SECRET";
    /// Model provider selector
    pub const PIERRE_LLM_PROVIDER: &str = "PIERRE_LLM_PROVIDER";
    /// Model name override
    pub const PIERRE_LLM_MODEL: &str = "PIERRE_LLM_MODEL";
    /// Groq API key
    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
    /// `OpenAI` API key
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// Base URL of a local OpenAI-compatible server
    pub const LOCAL_LLM_BASE_URL: &str = "LOCAL_LLM_BASE_URL";
    /// Optional key for the local server
    pub const LOCAL_LLM_API_KEY: &str = "LOCAL_LLM_API_KEY";
}
