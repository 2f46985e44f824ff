use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a stored document without its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub id: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    #[serde(flatten)]
    pub info: DocumentInfo,
    pub has_content: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub count: usize,
}

/// Output of a text extractor.
#[derive(Debug, Clone, Default)]
pub struct ExtractedDocument {
    pub text: String,
    pub page_count: usize,
    pub info: BTreeMap<String, String>,
}

impl ExtractedDocument {
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }
}

/// Descriptive fields recorded for an uploaded PDF.
///
/// The store keeps this as an opaque JSON object; only the ingestion side
/// knows its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub original_name: String,
    pub filename: String,
    pub size: u64,
    pub mimetype: String,
    pub pages: usize,
    pub text_length: usize,
    pub uploaded_at: DateTime<Utc>,
    pub info: BTreeMap<String, String>,
}

impl UploadMetadata {
    pub fn new(
        id: impl Into<String>,
        original_name: impl Into<String>,
        mimetype: impl Into<String>,
        size: u64,
        extracted: &ExtractedDocument,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            filename: id.into(),
            size,
            mimetype: mimetype.into(),
            pages: extracted.page_count,
            text_length: extracted.text_length(),
            uploaded_at: Utc::now(),
            info: extracted.info.clone(),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}
