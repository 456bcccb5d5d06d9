// ABOUTME: Core data models for coach turns
// ABOUTME: Re-exports blocks, stream events, turn request/response and planner result types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Wire types shared by the orchestrator, the HTTP layer and tests.
//!
//! - `TurnRequest` / `TurnResponse`: the JSON contract of `POST /api/coach/turn`
//! - `CoachBlock`: structured UI units, append-only within a turn
//! - `StreamEvent`: progress notifications for streaming clients
//! - `PlannerRunResult`: what one planner invocation hands back to the controller

mod blocks;
mod events;
mod turn;

pub use blocks::{CoachBlock, MetricItem, StatusTone, WeightUnit};
pub use events::StreamEvent;
pub use turn::{
    Message, MessageRole, PlannerRunResult, Preferences, TurnRequest, TurnResponse, TurnTrace,
};
