use crate::domain::{errors::DomainError, Completion, CompletionRequest};
use async_trait::async_trait;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, DomainError>;
    async fn list_models(&self) -> Result<Vec<serde_json::Value>, DomainError>;
}
