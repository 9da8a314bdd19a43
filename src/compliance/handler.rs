//! HTTP handlers for the Compliance API
//!
//! - POST /api/v1/compliance/check               full compliance decision
//! - POST /api/v1/compliance/sanitize            standalone sanitization
//! - POST /api/v1/compliance/sanitize/contract   contract-template sanitization
//! - POST /api/v1/compliance/validate            re-check sanitized text
//! - GET  /api/v1/compliance/status              flags and window statistics
//! - GET  /api/v1/audit/records?limit=N          recent audit records

use super::engine::ComplianceEngine;
use super::types::ContentType;
use crate::error::to_json;
use crate::sanitizer::SanitizationLevel;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 1_000;

/// Create the compliance router
pub fn compliance_router(engine: Arc<ComplianceEngine>) -> Router {
    Router::new()
        .route("/api/v1/compliance/check", post(check))
        .route("/api/v1/compliance/sanitize", post(sanitize))
        .route("/api/v1/compliance/sanitize/contract", post(sanitize_contract))
        .route("/api/v1/compliance/validate", post(validate))
        .route("/api/v1/compliance/status", get(status))
        .route("/api/v1/audit/records", get(audit_records))
        .with_state(engine)
}

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub text: String,
    /// Unknown or missing values fall back to `general`
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizeRequest {
    pub text: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub level: Option<SanitizationLevel>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

fn content_type(raw: Option<&str>) -> ContentType {
    raw.map(ContentType::parse_lossy).unwrap_or_default()
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/v1/compliance/check
async fn check(
    State(engine): State<Arc<ComplianceEngine>>,
    Json(request): Json<CheckRequest>,
) -> impl IntoResponse {
    let content_type = content_type(request.content_type.as_deref());
    let result = engine.check(&request.text, content_type).await;
    Json(to_json(result))
}

/// POST /api/v1/compliance/sanitize
async fn sanitize(
    State(engine): State<Arc<ComplianceEngine>>,
    Json(request): Json<SanitizeRequest>,
) -> impl IntoResponse {
    let content_type = content_type(request.content_type.as_deref());
    let result = engine
        .sanitize(&request.text, content_type, request.level)
        .await;
    Json(to_json(result))
}

/// POST /api/v1/compliance/sanitize/contract
async fn sanitize_contract(
    State(engine): State<Arc<ComplianceEngine>>,
    Json(request): Json<SanitizeRequest>,
) -> impl IntoResponse {
    let result = engine.sanitize_contract(&request.text, request.level).await;
    Json(to_json(result))
}

/// POST /api/v1/compliance/validate
async fn validate(
    State(engine): State<Arc<ComplianceEngine>>,
    Json(request): Json<ValidateRequest>,
) -> impl IntoResponse {
    Json(to_json(engine.validate(&request.text)))
}

/// GET /api/v1/compliance/status
async fn status(State(engine): State<Arc<ComplianceEngine>>) -> impl IntoResponse {
    Json(to_json(engine.status().await))
}

/// GET /api/v1/audit/records?limit=50
async fn audit_records(
    State(engine): State<Arc<ComplianceEngine>>,
    Query(params): Query<AuditQuery>,
) -> impl IntoResponse {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .min(MAX_AUDIT_LIMIT);
    let records = engine.recent_audit(limit).await;
    Json(serde_json::json!({
        "records": to_json(&records),
        "count": records.len(),
    }))
}
