// ABOUTME: Health check route for liveness probes
// ABOUTME: Reports service status and whether a model runtime is configured
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Health check routes for service monitoring

use std::sync::Arc;

use crate::constants::endpoints::HEALTH_CHECK;
use crate::resources::CoachResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes(resources: Arc<CoachResources>) -> axum::Router {
        use axum::{extract::State, routing::get, Json, Router};

        async fn health_handler(
            State(resources): State<Arc<CoachResources>>,
        ) -> Json<serde_json::Value> {
            let controller = resources.controller();
            Json(serde_json::json!({
                "status": "healthy",
                "service": crate::logging::SERVICE_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "model_runtime": controller.has_model_runtime(),
                "model": controller.model_label(),
                "configured": resources.ensure_configured().is_ok(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        Router::new()
            .route(HEALTH_CHECK, get(health_handler))
            .with_state(resources)
    }
}
