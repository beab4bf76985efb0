use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports service version and whether the inference server and configured model are reachable.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let model = state.llm.model().to_string();
    let mut info = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "tailor-api",
        "model": model,
        "ollama_url": state.config.inference.base_url,
        "ollama_ok": false,
        "model_present": false,
    });

    match state.llm.check_model_available(&model).await {
        Ok(present) => {
            info["ollama_ok"] = json!(true);
            info["model_present"] = json!(present);
        }
        Err(e) => info["error"] = json!(e.to_string()),
    }

    Json(info)
}
