use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::{Document, Object};

use crate::domain::{ports::TextExtractor, DomainError, ExtractedDocument};

/// Extracts text with pdf-extract, falling back to lopdf's own text
/// extraction when pdf-extract fails. Page count and the info dictionary
/// always come from lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_text(data: &[u8], doc: &Document) -> Result<String, DomainError> {
        // pdf-extract panics on some malformed fonts instead of returning an error.
        let primary = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data)));

        match primary {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "pdf-extract failed, trying lopdf");
                Self::extract_text_fallback(doc)
            }
            Err(_) => {
                tracing::warn!("pdf-extract panicked, trying lopdf");
                Self::extract_text_fallback(doc)
            }
        }
    }

    fn extract_text_fallback(doc: &Document) -> Result<String, DomainError> {
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        doc.extract_text(&pages)
            .map_err(|e| DomainError::extraction(format!("Failed to parse PDF: {e}")))
    }

    fn read_info(doc: &Document) -> BTreeMap<String, String> {
        let mut info = BTreeMap::new();
        info.insert("PDFFormatVersion".to_string(), doc.version.clone());
        info.insert(
            "IsEncrypted".to_string(),
            doc.trailer.get(b"Encrypt").is_ok().to_string(),
        );

        let dict = doc
            .trailer
            .get(b"Info")
            .and_then(|obj| doc.dereference(obj))
            .and_then(|(_, obj)| obj.as_dict());

        if let Ok(dict) = dict {
            for (key, value) in dict.iter() {
                if let Some(value) = object_to_string(value) {
                    info.insert(String::from_utf8_lossy(key).into_owned(), value);
                }
            }
        }

        info
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, DomainError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| DomainError::extraction(format!("Failed to parse PDF: {e}")))?;

        let page_count = doc.get_pages().len();
        let info = Self::read_info(&doc);
        let text = Self::extract_text(bytes, &doc)?;

        tracing::debug!(page_count, text_len = text.len(), "pdf extracted");

        Ok(ExtractedDocument {
            text,
            page_count,
            info,
        })
    }
}

fn object_to_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Integer(i) => Some(i.to_string()),
        Object::Real(r) => Some(r.to_string()),
        Object::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE when they start with a byte order mark.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = PdfExtractor::new().extract(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, DomainError::Extraction(_)));
        assert!(err.message().starts_with("Failed to parse PDF"));
    }

    #[test]
    fn test_decode_utf16_text_string() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_text_string(&bytes), "Hi");
        assert_eq!(decode_text_string(b"plain"), "plain");
    }

    #[test]
    fn test_object_to_string() {
        assert_eq!(object_to_string(&Object::Integer(3)).as_deref(), Some("3"));
        assert_eq!(
            object_to_string(&Object::Name(b"Catalog".to_vec())).as_deref(),
            Some("Catalog")
        );
        assert!(object_to_string(&Object::Null).is_none());
    }
}
