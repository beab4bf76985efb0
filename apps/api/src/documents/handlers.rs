//! Axum route handlers for document parsing and export.

use axum::{
    extract::Multipart,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::documents::export::{export, ExportFormat};
use crate::documents::extract::{extract_text, local_path, DocumentKind};
use crate::documents::DocumentError;
use crate::errors::AppError;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseLocalRequest {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub text: String,
    /// e.g. "microsoft" → resume_microsoft.docx
    pub label: Option<String>,
    #[serde(default = "default_format")]
    pub fmt: String,
}

fn default_format() -> String {
    "docx".to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /parse
///
/// Multipart upload with a `file` field. Format is chosen by file name.
pub async fn handle_parse(mut multipart: Multipart) -> Result<Json<TextResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        info!(file = %name, size = bytes.len(), "parse upload");
        let text = extract_off_thread(DocumentKind::from_name(&name), bytes.to_vec()).await?;
        return Ok(Json(TextResponse { text }));
    }

    Err(AppError::Validation("file is required".to_string()))
}

/// POST /parse-local
///
/// Reads a file from the server's filesystem. Accepts an optional `file://` prefix.
pub async fn handle_parse_local(
    Json(request): Json<ParseLocalRequest>,
) -> Result<Json<TextResponse>, AppError> {
    let path = local_path(&request.path).to_string();
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| DocumentError::Read(format!("{path}: {e}")))?;

    info!(file = %path, size = bytes.len(), "parse local file");
    let text = extract_off_thread(DocumentKind::from_name(&path), bytes).await?;
    Ok(Json(TextResponse { text }))
}

/// POST /export
///
/// Renders text as a DOCX or PDF attachment.
pub async fn handle_export(Json(request): Json<ExportRequest>) -> Result<Response, AppError> {
    let format: ExportFormat = request.fmt.parse()?;
    let file = export(&request.text, request.label.as_deref(), format)?;

    info!(file = %file.file_name, size = file.bytes.len(), "export");
    Ok((
        [
            (header::CONTENT_TYPE, file.media_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    )
        .into_response())
}

/// PDF extraction is CPU-bound; keep it off the async workers.
async fn extract_off_thread(kind: DocumentKind, bytes: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(text)
}
