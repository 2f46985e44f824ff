use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{errors::DomainError, DocumentInfo, DocumentSummary, StoreStats};

/// Keyed storage for extracted document text.
///
/// Methods never await, so each call is atomic with respect to the others.
pub trait DocumentStore: Send + Sync {
    fn put(&self, id: &str, text: String, metadata: serde_json::Value) -> Result<(), DomainError>;
    /// Returns the text and refreshes the record's last-access time.
    fn get(&self, id: &str) -> Result<Option<Arc<str>>, DomainError>;
    fn get_metadata(&self, id: &str) -> Result<Option<DocumentInfo>, DomainError>;
    fn has(&self, id: &str) -> Result<bool, DomainError>;
    fn remove(&self, id: &str) -> Result<bool, DomainError>;
    fn list_all(&self) -> Result<Vec<DocumentSummary>, DomainError>;
    fn stats(&self) -> Result<StoreStats, DomainError>;
    /// Evicts records created before `now` minus the retention period.
    fn sweep(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;
}
