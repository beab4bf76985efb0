use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::InferenceBackend;

/// Shared application state injected into all route handlers via Axum extractors.
/// Nothing in here is mutable; requests never share state beyond configuration.
#[derive(Clone)]
pub struct AppState {
    /// Inference backend. Production: `OllamaClient`. Tests swap in a fake.
    pub llm: Arc<dyn InferenceBackend>,
    pub config: Config,
}
