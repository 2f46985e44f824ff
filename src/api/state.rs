use std::sync::Arc;
use std::time::Instant;

use crate::application::{AnswerGateway, ChatService, DocumentService};
use crate::domain::ports::{CompletionProvider, DocumentStore};
use crate::domain::DomainError;
use crate::infrastructure::{AppConfig, OpenRouterProvider, PdfExtractor};

#[derive(Clone)]
pub struct AppState {
    pub document_service: Arc<DocumentService>,
    pub chat_service: Arc<ChatService>,
    pub gateway: Arc<AnswerGateway>,
    pub config: Arc<AppConfig>,
    pub started_at: Instant,
}

impl AppState {
    /// Wires the services around an injected store. The upstream provider is
    /// only created when a credential is configured.
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Result<Self, DomainError> {
        let provider = OpenRouterProvider::from_config(&config.config.llm)?
            .map(|p| Arc::new(p) as Arc<dyn CompletionProvider>);
        let gateway = AnswerGateway::new(provider, &config);
        Ok(Self::from_parts(store, config, gateway))
    }

    pub fn from_parts(
        store: Arc<dyn DocumentStore>,
        config: AppConfig,
        gateway: AnswerGateway,
    ) -> Self {
        let gateway = Arc::new(gateway);
        let document_service = DocumentService::new(store.clone(), Arc::new(PdfExtractor::new()))
            .with_max_upload_bytes(config.config.upload.max_bytes);

        Self {
            document_service: Arc::new(document_service),
            chat_service: Arc::new(ChatService::new(store, gateway.clone())),
            gateway,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}
