// ABOUTME: Main library entry point for the Pierre conversational workout coach
// ABOUTME: Turn orchestration with bounded LLM tool calling, deterministic fallback, and SSE delivery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Coach
//!
//! Answers one user utterance per turn, either by driving a model through a
//! bounded number of tool-calling rounds or, when no model runtime is
//! available, by a deterministic intent parser. Responses are delivered as a
//! single JSON body or as a Server-Sent Events stream.
//!
//! ## Architecture
//!
//! - **Models**: coach blocks, stream events, turn request and response (core crate)
//! - **Tools**: the execution adapter and in-memory workout tools
//! - **LLM**: `OpenAI`-compatible tool-calling provider
//! - **Coach**: controller, planner, fallback, cancellation scope, event sink
//! - **Routes**: `POST /api/coach/turn` and `GET /health`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pierre_coach::config::TurnConfig;
//! use pierre_coach::coach::TurnController;
//! use pierre_coach::models::{Message, Preferences, TurnRequest};
//! use pierre_coach::tools::{InMemoryWorkoutTools, ToolExecutor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryWorkoutTools::new());
//! let tools: Arc<dyn ToolExecutor> = Arc::new(store.registry()?);
//! let controller = TurnController::new(None, tools, TurnConfig::default())?;
//!
//! let request = TurnRequest {
//!     messages: vec![Message::user("Show today's summary")],
//!     preferences: Preferences::default(),
//! };
//! let response = controller.run_buffered(&request, "athlete-1").await?;
//! println!("{}", response.assistant_text);
//! # Ok(())
//! # }
//! ```

pub use pierre_coach_core::{constants, errors, models};

/// Bearer token authentication
pub mod auth;

/// Turn orchestration: controller, planner, fallback
pub mod coach;

/// Environment configuration
pub mod config;

/// Tool-calling model providers and prompts
pub mod llm;

/// Structured logging
pub mod logging;

/// Per-subject rate limiting
pub mod rate_limiting;

/// Shared server resources
pub mod resources;

/// HTTP routes
pub mod routes;

/// Server-Sent Events framing
pub mod sse;

/// Tool execution adapter and workout tools
pub mod tools;
