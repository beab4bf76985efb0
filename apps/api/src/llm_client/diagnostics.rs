//! Enrichment for generation failures: after a network failure or a
//! "model not found" status, one model listing tells "server down" apart from
//! "model missing". The listing's own failure becomes part of the hint.

use super::NetworkError;

/// Turns the outcome of a model listing into a human-readable hint.
pub fn describe_availability(
    model: &str,
    outcome: Result<Vec<String>, NetworkError>,
) -> String {
    match outcome {
        Ok(models) if models.iter().any(|name| name == model) => format!(
            "Model '{model}' is installed and the inference server answered /api/tags; \
             the generation call itself failed."
        ),
        Ok(models) => {
            let available = if models.is_empty() {
                "NONE".to_string()
            } else {
                models.join(", ")
            };
            let base = model.split(':').next().unwrap_or(model);
            format!(
                "Model '{model}' not found in Ollama. Available: {available}. \
                 Pull it with: ollama pull {base}"
            )
        }
        Err(e) => format!("Inference server unreachable at {}: {}", e.url, e.cause),
    }
}
