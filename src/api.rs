//! Unified API router for LexGuard
//!
//! Merges the compliance router with the health probe and applies CORS and
//! request tracing.
//!
//! ## Endpoint Map
//!
//! | Prefix                   | Module     | Description                                   |
//! |--------------------------|------------|-----------------------------------------------|
//! | `/health`                | api        | Load balancer health probe                    |
//! | `/api/v1/compliance/*`   | compliance | Check, sanitize, validate, status             |
//! | `/api/v1/audit/records`  | compliance | Recent audit records                          |

use crate::compliance::{compliance_router, ComplianceEngine};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete LexGuard HTTP application
pub fn build_app(engine: Arc<ComplianceEngine>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(compliance_router(engine))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors(cors_origins)),
        )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(parsed)
    }
}
