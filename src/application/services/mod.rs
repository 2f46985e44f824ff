mod chat;
mod document;
mod gateway;

pub use chat::ChatService;
pub use document::{
    DocumentService, IngestedDocument, PendingUpload, DEFAULT_MAX_UPLOAD_BYTES, PDF_MIME_TYPE,
};
pub use gateway::{AnswerGateway, ProviderStatus, MOCK_MODEL_ID};
