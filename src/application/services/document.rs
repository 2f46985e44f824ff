use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    ports::{DocumentStore, TextExtractor},
    DocumentInfo, DocumentSummary, DomainError, StoreStats, UploadMetadata,
};

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// An upload already spooled to disk, waiting to be ingested.
#[derive(Debug, Clone, Copy)]
pub struct PendingUpload<'a> {
    pub original_name: &'a str,
    pub mime: &'a str,
    pub path: &'a Path,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub id: String,
    pub original_name: String,
    pub pages: usize,
    pub text_length: usize,
    pub uploaded_at: DateTime<Utc>,
}

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn TextExtractor>,
    max_upload_bytes: u64,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            store,
            extractor,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn validate_upload(&self, mime: &str, size: u64) -> Result<(), DomainError> {
        if mime != PDF_MIME_TYPE {
            return Err(DomainError::validation("Only PDF files are supported"));
        }
        if size == 0 {
            return Err(DomainError::validation("No file provided"));
        }
        if size > self.max_upload_bytes {
            return Err(DomainError::validation("File size exceeds 10MB limit"));
        }
        Ok(())
    }

    /// Extracts the upload and stores its text. Nothing is stored unless
    /// extraction succeeds.
    #[instrument(skip(self, upload), fields(name = %upload.original_name, size = upload.size))]
    pub async fn ingest(&self, upload: PendingUpload<'_>) -> Result<IngestedDocument, DomainError> {
        self.validate_upload(upload.mime, upload.size)?;

        let bytes = tokio::fs::read(upload.path)
            .await
            .map_err(|e| DomainError::internal(format!("failed to read upload: {e}")))?;

        let extractor = self.extractor.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| DomainError::extraction(format!("Failed to parse PDF: {e}")))??;

        let id = Uuid::new_v4().to_string();
        let metadata = UploadMetadata::new(
            &id,
            upload.original_name,
            upload.mime,
            upload.size,
            &extracted,
        );
        self.store.put(&id, extracted.text, metadata.to_value())?;

        tracing::info!(
            file_id = %id,
            pages = metadata.pages,
            text_length = metadata.text_length,
            "document ingested"
        );

        Ok(IngestedDocument {
            id,
            original_name: metadata.original_name,
            pages: metadata.pages,
            text_length: metadata.text_length,
            uploaded_at: metadata.uploaded_at,
        })
    }

    #[instrument(skip(self))]
    pub fn info(&self, id: &str) -> Result<DocumentInfo, DomainError> {
        self.store
            .get_metadata(id)?
            .ok_or_else(|| DomainError::not_found("PDF not found"))
    }

    pub fn list(&self) -> Result<Vec<DocumentSummary>, DomainError> {
        self.store.list_all()
    }

    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<(), DomainError> {
        if self.store.remove(id)? {
            tracing::info!(file_id = %id, "document deleted");
            Ok(())
        } else {
            Err(DomainError::not_found("PDF not found"))
        }
    }

    pub fn stats(&self) -> Result<StoreStats, DomainError> {
        self.store.stats()
    }
}
