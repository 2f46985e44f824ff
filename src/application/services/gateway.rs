use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::domain::{
    extract_citations, ports::CompletionProvider, take_chars, Answer, AnswerOptions,
    CompletionRequest, DomainError, Message, ModelLimits, TokenBudget,
};
use crate::infrastructure::AppConfig;

pub const MOCK_MODEL_ID: &str = "mock/local";
const MOCK_PREVIEW_CHARS: usize = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    NotConfigured,
    Connected,
    Disconnected,
}

/// Answers questions about a document's text with an upstream model, or with
/// a local mock answer when no provider is configured.
pub struct AnswerGateway {
    provider: Option<Arc<dyn CompletionProvider>>,
    default_model: String,
    default_temperature: f32,
    system_prompt: String,
    limits: ModelLimits,
    reserve_tokens: usize,
    max_context_chars: usize,
}

impl AnswerGateway {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>, config: &AppConfig) -> Self {
        let llm = &config.config.llm;
        Self {
            provider,
            default_model: llm.model.clone(),
            default_temperature: llm.temperature,
            system_prompt: config.prompts.answer.system.clone(),
            limits: llm.model_limits(),
            reserve_tokens: llm.reserve_tokens,
            max_context_chars: llm.max_context_chars,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn budget_for(
        &self,
        model: &str,
        system_prompt: &str,
        context: &str,
        question: &str,
    ) -> TokenBudget {
        TokenBudget::for_prompt(
            self.limits.context_limit(model),
            self.reserve_tokens,
            &[system_prompt, take_chars(context, self.max_context_chars), question],
        )
    }

    #[instrument(skip(self, context, options), fields(context_len = context.len()))]
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        options: &AnswerOptions,
    ) -> Result<Answer, DomainError> {
        let Some(provider) = &self.provider else {
            tracing::debug!("no upstream credential, answering locally");
            return Ok(mock_answer(question, context));
        };

        let model = options.model.as_deref().unwrap_or(&self.default_model);
        let temperature = options.temperature.unwrap_or(self.default_temperature);
        let system_prompt = options
            .system_prompt
            .as_deref()
            .unwrap_or(&self.system_prompt);

        let budget = self.budget_for(model, system_prompt, context, question);
        let request = CompletionRequest {
            model: model.to_string(),
            messages: vec![
                Message::system(system_prompt),
                Message::user(format!(
                    "Use this context to answer the question:\n\n{}\n\nQuestion: {}",
                    take_chars(context, self.max_context_chars),
                    question
                )),
            ],
            max_tokens: budget.max_response_tokens(),
            temperature,
        };

        tracing::info!(
            model,
            estimated_input = budget.estimated_input,
            max_tokens = request.max_tokens,
            "requesting completion"
        );

        let completion = provider.complete(&request).await.inspect_err(|e| {
            tracing::error!(error = %e, model, "completion failed");
        })?;

        Ok(Answer {
            citations: extract_citations(&completion.content),
            answer: completion.content,
            model_id: request.model,
            usage: completion.usage,
        })
    }

    pub async fn list_models(&self) -> Result<Vec<serde_json::Value>, DomainError> {
        match &self.provider {
            Some(provider) => provider.list_models().await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn status(&self) -> ProviderStatus {
        match &self.provider {
            None => ProviderStatus::NotConfigured,
            Some(provider) => match provider.list_models().await {
                Ok(_) => ProviderStatus::Connected,
                Err(e) => {
                    tracing::warn!(error = %e, "provider check failed");
                    ProviderStatus::Disconnected
                }
            },
        }
    }
}

fn mock_answer(question: &str, context: &str) -> Answer {
    let preview = take_chars(context, MOCK_PREVIEW_CHARS).trim();
    let answer = format!(
        "OPENROUTER_API_KEY is not configured on the server. Returning a mock response for development.\n\nQuestion: {question}\n\nContext preview (first {MOCK_PREVIEW_CHARS} chars):\n{preview}"
    );

    Answer {
        citations: extract_citations(&answer),
        answer,
        model_id: MOCK_MODEL_ID.to_string(),
        usage: None,
    }
}
