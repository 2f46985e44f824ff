use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::DomainError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Upstream(_) => StatusCode::BAD_GATEWAY,
        DomainError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
        DomainError::Configuration(_) | DomainError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let message = match &self {
            DomainError::Timeout(_) => "AI service timeout. Please try again.".to_string(),
            DomainError::Configuration(_) => "AI service configuration error".to_string(),
            DomainError::Internal(_) => "Internal server error".to_string(),
            other => other.message().to_string(),
        };

        let body = ErrorResponse {
            error: message,
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}
