// ABOUTME: Coach turn orchestration: controller, planner, deterministic fallback
// ABOUTME: Also hosts the per-turn cancellation scope and the streamed event sink
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Coach Turn Orchestration
//!
//! A turn is answered either by the [`Planner`] (bounded tool-calling rounds
//! against a model) or by the [`DeterministicFallback`] (one regex-classified
//! intent, one tool). The [`TurnController`] picks between them and assembles
//! the final [`TurnResponse`](crate::models::TurnResponse).

/// Turn controller and substitution rules
pub mod controller;
/// Deterministic fallback
pub mod fallback;
/// Intent classification rules
pub mod intent;
/// Multi-round model planner
pub mod planner;
/// Per-turn cancellation scope
pub mod scope;
/// Streamed event sink
pub mod sink;

pub use controller::{TurnController, TurnOutcome};
pub use fallback::{DeterministicFallback, FallbackOutcome};
pub use intent::{Intent, IntentClassifier};
pub use planner::Planner;
pub use scope::{CancelReason, TurnScope};
pub use sink::TurnEventSink;
