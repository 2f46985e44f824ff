use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::api::state::AppState;
use crate::application::services::{PendingUpload, PDF_MIME_TYPE};
use crate::domain::{DocumentInfo, DocumentSummary, DomainError, StoreStats};

/// Multipart field that carries the PDF.
pub const UPLOAD_FIELD: &str = "pdf";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    pub file_name: String,
    pub file_url: String,
    pub pages: usize,
    pub text_length: usize,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfoResponse {
    #[serde(flatten)]
    pub info: DocumentInfo,
    pub text_length: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted: bool,
    pub file_id: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub files: Vec<DocumentSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StoreStats,
    pub timestamp: DateTime<Utc>,
}

/// An upload streamed to a temporary file. The file is deleted when this
/// value is dropped, whichever way the request ends.
struct SpooledUpload {
    file: NamedTempFile,
    original_name: String,
    mime: String,
    size: u64,
}

impl SpooledUpload {
    fn pending(&self) -> PendingUpload<'_> {
        PendingUpload {
            original_name: &self.original_name,
            mime: &self.mime,
            path: self.file.path(),
            size: self.size,
        }
    }
}

fn multipart_error(e: MultipartError) -> DomainError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DomainError::validation("File too large. Maximum size is 10MB.")
    } else {
        DomainError::validation(format!("File upload error: {}", e.body_text()))
    }
}

fn io_error(e: std::io::Error) -> DomainError {
    DomainError::internal(format!("failed to spool upload: {e}"))
}

async fn spool_upload(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<SpooledUpload, DomainError> {
    let max_bytes = state.document_service.max_upload_bytes();
    let mut spooled: Option<SpooledUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        // Plain form fields are ignored; only file parts count.
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if field.name() != Some(UPLOAD_FIELD) {
            return Err(DomainError::validation("Unexpected file field."));
        }
        if spooled.is_some() {
            return Err(DomainError::validation("Too many files. Only one file allowed."));
        }

        let mime = field.content_type().unwrap_or_default().to_string();
        if mime != PDF_MIME_TYPE {
            return Err(DomainError::validation("Only PDF files are supported"));
        }

        let file = tempfile::Builder::new()
            .prefix("pdf-")
            .suffix(".pdf")
            .tempfile_in(&state.config.config.upload.temp_dir)
            .map_err(io_error)?;
        let mut out = tokio::fs::File::from_std(file.reopen().map_err(io_error)?);

        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            size += chunk.len() as u64;
            if size > max_bytes {
                return Err(DomainError::validation("File too large. Maximum size is 10MB."));
            }
            out.write_all(&chunk).await.map_err(io_error)?;
        }
        out.flush().await.map_err(io_error)?;

        spooled = Some(SpooledUpload {
            file,
            original_name,
            mime,
            size,
        });
    }

    spooled.ok_or_else(|| DomainError::validation("No file uploaded."))
}

fn file_url(headers: &HeaderMap, file_id: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}/api/pdf/{file_id}")
}

pub async fn upload_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), DomainError> {
    let upload = spool_upload(&state, &mut multipart).await?;
    let doc = state.document_service.ingest(upload.pending()).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file_url: file_url(&headers, &doc.id),
            file_id: doc.id,
            file_name: doc.original_name,
            pages: doc.pages,
            text_length: doc.text_length,
            uploaded_at: doc.uploaded_at,
        }),
    ))
}

pub async fn get_pdf_info(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<PdfInfoResponse>, DomainError> {
    let info = state.document_service.info(&file_id)?;
    let text_length = info
        .metadata
        .get("textLength")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);

    Ok(Json(PdfInfoResponse { info, text_length }))
}

pub async fn delete_pdf(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<DeleteResponse>, DomainError> {
    state.document_service.delete(&file_id)?;
    Ok(Json(DeleteResponse {
        deleted: true,
        file_id,
    }))
}

pub async fn list_pdfs(State(state): State<AppState>) -> Result<Json<ListResponse>, DomainError> {
    let files = state.document_service.list()?;
    Ok(Json(ListResponse {
        count: files.len(),
        files,
    }))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, DomainError> {
    Ok(Json(StatsResponse {
        stats: state.document_service.stats()?,
        timestamp: Utc::now(),
    }))
}
