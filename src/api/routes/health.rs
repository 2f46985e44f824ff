use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;
use crate::domain::{DomainError, StoreStats};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: StoreStats,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ServiceInfoResponse {
    pub message: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub endpoints: serde_json::Value,
}

pub async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        message: "PDF Chat API Server".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: Utc::now(),
        endpoints: serde_json::json!({
            "pdf": "/api/upload",
            "chat": "/api/chat",
            "health": "/api/health",
            "models": "/api/models",
        }),
    })
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, DomainError> {
    Ok(Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        storage: state.document_service.stats()?,
        timestamp: Utc::now(),
    }))
}
