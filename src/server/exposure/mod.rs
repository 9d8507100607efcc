//! API exposure modules
//!
//! Each exposure consumes a `ServerHost` and produces a Router for its
//! protocol. Health routes are protocol-independent and always served.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

#[cfg(feature = "graphql")]
pub mod graphql;

#[cfg(feature = "graphql")]
pub use graphql::GraphQLExposure;

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "blog-graph"
    }))
}
