// ABOUTME: Health check route handlers for service monitoring
// ABOUTME: Liveness endpoint plus a readiness probe that touches the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! Health check routes for service monitoring

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::logging::SERVICE_NAME;
use crate::resources::ServerResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .route("/ready", get(Self::ready))
            .with_state(resources)
    }

    async fn health() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }

    async fn ready(State(resources): State<Arc<ServerResources>>) -> Response {
        match sqlx::query("SELECT 1").execute(resources.database.pool()).await {
            Ok(_) => Json(json!({
                "status": "ready",
                "timestamp": Utc::now().to_rfc3339(),
            }))
            .into_response(),
            Err(e) => {
                warn!(error = %e, "Readiness probe failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "status": "unavailable" })),
                )
                    .into_response()
            }
        }
    }
}
