// ABOUTME: Core types and constants for the Pierre coach turn orchestrator
// ABOUTME: Foundation crate with error handling, wire models, and turn constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Coach Core
//!
//! Foundation crate providing the shared types of the coach turn orchestrator.
//! It changes infrequently so the server crate benefits from incremental
//! compilation.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode` and the tool-level `ToolError`
//! - **constants**: turn limits, canned copy, and wire identifiers
//! - **models**: coach blocks, stream events, and turn request/response shapes

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Turn limits, canned copy, and wire identifiers
pub mod constants;

/// Wire models exchanged with the coach UI
pub mod models;
