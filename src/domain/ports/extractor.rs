use crate::domain::{errors::DomainError, ExtractedDocument};

pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, DomainError>;
}
