pub mod debug;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::documents::handlers as documents;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

/// Uploaded resumes larger than this are rejected.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route("/parse", post(documents::handle_parse))
        .route("/parse-local", post(documents::handle_parse_local))
        .route("/export", post(documents::handle_export))
        // Tailoring
        .route("/tailor", post(tailoring::handle_tailor))
        .route("/keywords", post(tailoring::handle_keywords))
        .route("/keywords/missing", post(tailoring::handle_missing_keywords))
        .route("/ats-check", post(tailoring::handle_ats_check))
        .route(
            "/parse-structured-resume",
            post(tailoring::handle_parse_structured_resume),
        )
        .route("/infer-company", post(tailoring::handle_infer_company))
        // Troubleshooting
        .route("/debug/generate", post(debug::handle_debug_generate))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
