// ABOUTME: Route module organization for the coach HTTP server
// ABOUTME: Merges domain routers and applies the request tracing layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the coach server
//!
//! Each domain module contains route definitions and thin handlers that
//! delegate to the coach controller.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::resources::CoachResources;

/// Coach turn routes
pub mod coach;
/// Health check routes
pub mod health;

pub use coach::CoachRoutes;
pub use health::HealthRoutes;

/// Build the complete application router
pub fn router(resources: Arc<CoachResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(CoachRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
}
