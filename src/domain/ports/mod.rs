mod document_store;
mod extractor;
mod llm;

pub use document_store::DocumentStore;
pub use extractor::TextExtractor;
pub use llm::CompletionProvider;
