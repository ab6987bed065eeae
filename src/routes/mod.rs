// ABOUTME: Route module organization for the assistant HTTP endpoints
// ABOUTME: Assembles the assistant and health routers with the tracing and limit layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! HTTP routes
//!
//! Each domain module holds only route definitions and thin handlers that
//! delegate to the service layer.

/// Assistant conversation and message routes
pub mod assistant;
/// Health check routes
pub mod health;

pub use assistant::AssistantRoutes;
pub use health::HealthRoutes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::resources::ServerResources;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Extra time allowed on top of the model timeout for a whole turn
const TURN_TIMEOUT_SLACK: Duration = Duration::from_secs(30);

/// Complete application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    // Two model calls per turn, plus tool execution
    let timeout = resources
        .config
        .assistant
        .request_timeout
        .saturating_mul(2)
        .saturating_add(TURN_TIMEOUT_SLACK);

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AssistantRoutes::routes(resources))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
}
