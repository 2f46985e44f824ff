pub mod config;
pub mod extractor;
pub mod llm;
pub mod store;

pub use config::{AppConfig, Config, PromptsConfig};
pub use extractor::PdfExtractor;
pub use llm::OpenRouterProvider;
pub use store::{EphemeralDocumentStore, Sweeper};
