use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::documents::DocumentError;
use crate::llm_client::InferenceError;
use crate::tailoring::normalizer::NormalizeError;
use crate::tailoring::prompts::PromptError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller input was missing or blank. Raised before any upstream call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Prompt template error: {0}")]
    Template(String),

    /// The model never produced a usable answer.
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// The model answered, but not in a shape we can use.
    #[error("Unparsable model output: {0}")]
    Unparsable(#[from] NormalizeError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Request-body field that feeds a prompt slot.
fn request_field(slot: &str) -> &str {
    match slot {
        "resume" => "resume_text",
        "jd" => "jd_text",
        other => other,
    }
}

impl From<PromptError> for AppError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::MissingField(slot) => {
                AppError::Validation(format!("{} is missing", request_field(slot)))
            }
            PromptError::EmptyField(slot) => {
                AppError::Validation(format!("{} is empty", request_field(slot)))
            }
            PromptError::Template(msg) => AppError::Template(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, detail): (StatusCode, &str, String, Option<Value>) =
            match &self {
                AppError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
                }
                AppError::Template(msg) => {
                    tracing::error!("Prompt template error: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "TEMPLATE_ERROR",
                        format!("Prompt template error: {msg}"),
                        None,
                    )
                }
                AppError::Inference(e) => {
                    tracing::error!("Inference error: {e}");
                    let message = match e.diagnosis() {
                        Some(hint) => format!("{e}. {hint}"),
                        None => e.to_string(),
                    };
                    (
                        StatusCode::BAD_GATEWAY,
                        "INFERENCE_ERROR",
                        message,
                        Some(e.detail()),
                    )
                }
                AppError::Unparsable(e) => {
                    tracing::error!("Unparsable model output: {e}");
                    let NormalizeError::UnparsableStructure { reason, body_head } = e;
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "UNPARSABLE_STRUCTURE",
                        "The model answered, but its output could not be parsed".to_string(),
                        Some(json!({ "reason": reason, "body_head": body_head })),
                    )
                }
                AppError::Document(e) if e.is_client_error() => (
                    StatusCode::BAD_REQUEST,
                    "DOCUMENT_ERROR",
                    e.to_string(),
                    None,
                ),
                AppError::Document(e) => {
                    tracing::error!("Document error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DOCUMENT_ERROR",
                        e.to_string(),
                        None,
                    )
                }
                AppError::Internal(e) => {
                    tracing::error!("Internal error: {e:?}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                        None,
                    )
                }
            };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(detail) = detail {
            error["detail"] = detail;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
