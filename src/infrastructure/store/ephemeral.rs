use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    ports::DocumentStore, DocumentInfo, DocumentSummary, DomainError, StoreStats,
};

struct StoredDocument {
    text: Arc<str>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
}

impl StoredDocument {
    fn info(&self, id: &str) -> DocumentInfo {
        DocumentInfo {
            id: id.to_string(),
            metadata: self.metadata.clone(),
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        // Two reads within one clock tick must still move the timestamp forward.
        self.last_accessed_at = if now > self.last_accessed_at {
            now
        } else {
            self.last_accessed_at + Duration::microseconds(1)
        };
    }
}

/// In-memory document store that forgets records a fixed time after they
/// were created, regardless of how recently they were read.
pub struct EphemeralDocumentStore {
    documents: RwLock<HashMap<String, StoredDocument>>,
    retention: Duration,
}

impl EphemeralDocumentStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }
}

impl Default for EphemeralDocumentStore {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

impl DocumentStore for EphemeralDocumentStore {
    fn put(&self, id: &str, text: String, metadata: serde_json::Value) -> Result<(), DomainError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let now = Utc::now();
        documents.insert(
            id.to_string(),
            StoredDocument {
                text: Arc::from(text),
                metadata,
                created_at: now,
                last_accessed_at: now,
            },
        );
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Arc<str>>, DomainError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(documents.get_mut(id).map(|doc| {
            doc.touch(Utc::now());
            doc.text.clone()
        }))
    }

    fn get_metadata(&self, id: &str) -> Result<Option<DocumentInfo>, DomainError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(documents.get(id).map(|doc| doc.info(id)))
    }

    fn has(&self, id: &str) -> Result<bool, DomainError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(documents.contains_key(id))
    }

    fn remove(&self, id: &str) -> Result<bool, DomainError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(documents.remove(id).is_some())
    }

    fn list_all(&self) -> Result<Vec<DocumentSummary>, DomainError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut summaries: Vec<DocumentSummary> = documents
            .iter()
            .map(|(id, doc)| DocumentSummary {
                info: doc.info(id),
                has_content: true,
            })
            .collect();
        summaries.sort_by(|a, b| a.info.created_at.cmp(&b.info.created_at));
        Ok(summaries)
    }

    fn stats(&self) -> Result<StoreStats, DomainError> {
        let documents = self
            .documents
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(StoreStats {
            count: documents.len(),
        })
    }

    fn sweep(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let cutoff = now - self.retention;
        let before = documents.len();
        documents.retain(|_, doc| doc.created_at >= cutoff);
        Ok(before - documents.len())
    }
}
