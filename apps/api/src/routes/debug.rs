use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::head;
use crate::state::AppState;

/// Characters of the upstream body echoed back to the caller.
const DEBUG_HEAD_LIMIT: usize = 800;

#[derive(Debug, Deserialize)]
pub struct DebugGenerateRequest {
    #[serde(default)]
    pub prompt: String,
    pub model: Option<String>,
}

/// POST /debug/generate
///
/// Forwards a raw prompt and returns the upstream reply unclassified, for
/// troubleshooting gateway errors.
pub async fn handle_debug_generate(
    State(state): State<AppState>,
    Json(request): Json<DebugGenerateRequest>,
) -> Result<Response, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt required".to_string()));
    }
    let model = request
        .model
        .unwrap_or_else(|| state.llm.model().to_string());

    match state.llm.probe_generate(&model, &request.prompt).await {
        Ok(reply) => {
            let parsed = serde_json::from_str::<Value>(&reply.body).ok();
            Ok(Json(json!({
                "status": reply.status,
                "head": head(&reply.body, DEBUG_HEAD_LIMIT),
                "json": parsed,
                "model": model,
                "prompt_len": request.prompt.len(),
            }))
            .into_response())
        }
        Err(e) => {
            warn!("debug generate failed: {e}");
            Ok((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "stage": "network", "error": e.to_string() })),
            )
                .into_response())
        }
    }
}
