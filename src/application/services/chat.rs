use std::sync::Arc;
use tracing::instrument;

use crate::application::services::AnswerGateway;
use crate::domain::{ports::DocumentStore, Answer, AnswerOptions, DomainError};

/// Answers questions about a previously uploaded document.
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    gateway: Arc<AnswerGateway>,
}

impl ChatService {
    pub fn new(store: Arc<dyn DocumentStore>, gateway: Arc<AnswerGateway>) -> Self {
        Self { store, gateway }
    }

    #[instrument(skip(self, question, options))]
    pub async fn ask(
        &self,
        file_id: &str,
        question: &str,
        options: &AnswerOptions,
    ) -> Result<Answer, DomainError> {
        if question.is_empty() || file_id.is_empty() {
            return Err(DomainError::validation("Question and fileId are required"));
        }
        if question.trim().is_empty() {
            return Err(DomainError::validation("Question must be a non-empty string"));
        }

        let context = self.store.get(file_id)?.ok_or_else(|| {
            DomainError::not_found("PDF not found. Please upload the document first.")
        })?;

        self.gateway.answer(question, &context, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{store::EphemeralDocumentStore, AppConfig};

    fn service() -> (ChatService, Arc<EphemeralDocumentStore>) {
        let store = Arc::new(EphemeralDocumentStore::default());
        let gateway = Arc::new(AnswerGateway::new(None, &AppConfig::default()));
        (ChatService::new(store.clone(), gateway), store)
    }

    #[tokio::test]
    async fn test_ask_answers_from_stored_text() {
        let (chat, store) = service();
        store
            .put("doc", "The budget is on page 12.".into(), serde_json::json!({}))
            .unwrap();

        let answer = chat
            .ask("doc", "Where is the budget?", &AnswerOptions::default())
            .await
            .unwrap();

        assert_eq!(answer.model_id, "mock/local");
        assert!(answer.answer.contains("Where is the budget?"));
        assert_eq!(answer.citations, vec![12]);
    }

    #[tokio::test]
    async fn test_ask_touches_document() {
        let (chat, store) = service();
        store.put("doc", "text".into(), serde_json::json!({})).unwrap();
        let before = store.get_metadata("doc").unwrap().unwrap().last_accessed_at;

        chat.ask("doc", "q", &AnswerOptions::default()).await.unwrap();

        let after = store.get_metadata("doc").unwrap().unwrap().last_accessed_at;
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_ask_missing_document() {
        let (chat, _) = service();
        let err = chat
            .ask("gone", "q", &AnswerOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ask_validates_question() {
        let (chat, store) = service();
        store.put("doc", "text".into(), serde_json::json!({})).unwrap();

        let err = chat.ask("doc", "   ", &AnswerOptions::default()).await.unwrap_err();
        assert_eq!(err.message(), "Question must be a non-empty string");

        let err = chat.ask("", "q", &AnswerOptions::default()).await.unwrap_err();
        assert_eq!(err.message(), "Question and fileId are required");
    }
}
