use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::application::services::ProviderStatus;
use crate::domain::{AnswerOptions, DomainError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: Option<String>,
    pub file_id: Option<String>,
    #[serde(default)]
    pub options: AnswerOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub citations: Vec<u64>,
    pub model: String,
    pub usage: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<serde_json::Value>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AiStatusResponse {
    pub status: ProviderStatus,
    pub timestamp: DateTime<Utc>,
}

pub async fn process_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, DomainError> {
    let Json(request) = payload.map_err(|e| DomainError::validation(e.body_text()))?;

    let answer = state
        .chat_service
        .ask(
            request.file_id.as_deref().unwrap_or_default(),
            request.question.as_deref().unwrap_or_default(),
            &request.options,
        )
        .await?;

    Ok(Json(ChatResponse {
        answer: answer.answer,
        citations: answer.citations,
        model: answer.model_id,
        usage: answer.usage,
        timestamp: Utc::now(),
    }))
}

/// Never fails: an unreachable provider yields an empty list and a message.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    match state.gateway.list_models().await {
        Ok(models) => Json(ModelsResponse {
            count: models.len(),
            models,
            message: None,
            timestamp: Utc::now(),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch models");
            Json(ModelsResponse {
                models: Vec::new(),
                count: 0,
                message: Some("Unable to fetch models at this time".to_string()),
                timestamp: Utc::now(),
            })
        }
    }
}

pub async fn ai_status(State(state): State<AppState>) -> Json<AiStatusResponse> {
    Json(AiStatusResponse {
        status: state.gateway.status().await,
        timestamp: Utc::now(),
    })
}
