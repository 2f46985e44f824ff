mod answer;
mod budget;
mod document;
mod message;

pub use answer::{
    extract_citations, take_chars, Answer, AnswerOptions, Completion, CompletionRequest,
};
pub use budget::{estimate_tokens, ModelLimits, TokenBudget, DEFAULT_CONTEXT_LIMIT, RESERVE_TOKENS};
pub use document::{
    DocumentInfo, DocumentSummary, ExtractedDocument, StoreStats, UploadMetadata,
};
pub use message::{Message, MessageRole};
