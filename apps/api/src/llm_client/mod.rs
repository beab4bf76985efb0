//! LLM Client — the single point of entry for all inference-server calls.
//!
//! ARCHITECTURAL RULE: No other module may talk to the Ollama HTTP API directly.
//! Handlers and pipelines depend on the `InferenceBackend` trait; `OllamaClient`
//! is the production implementation.
//!
//! No retries. The only extra request is the diagnostic model listing made after a
//! network failure or a "model not found" status (see `diagnostics`).

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::InferenceConfig;

pub mod diagnostics;
#[cfg(test)]
pub(crate) mod fake;

/// Upstream bodies and error texts are cut to this many characters in error payloads.
pub const SNIPPET_LIMIT: usize = 300;

/// Failure of the lightweight `/api/tags` call.
#[derive(Debug, Clone, Error)]
#[error("cannot reach inference server at {url}: {cause}")]
pub struct NetworkError {
    pub url: String,
    pub cause: String,
}

/// Classified failure of a generation call. Each variant is one terminal state of
/// `generate`; enrichment only ever fills `diagnosis`, never changes the variant.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("inference request to {url} failed: {cause}")]
    NetworkUnreachable {
        url: String,
        cause: String,
        diagnosis: Option<String>,
    },

    #[error("inference server returned status {status}: {snippet}")]
    UpstreamStatus {
        status: u16,
        snippet: String,
        diagnosis: Option<String>,
    },

    #[error("inference server returned invalid JSON: {error}")]
    UpstreamParse { error: String, body_head: String },

    #[error("inference server reported an error: {error}")]
    UpstreamErrorField { error: String },

    #[error("inference server returned an empty response (keys: {keys:?})")]
    EmptyResponse { keys: Vec<String>, raw: Option<Value> },
}

impl InferenceError {
    /// Stable tag for the failing stage, used by clients to branch on error kind.
    pub fn stage(&self) -> &'static str {
        match self {
            InferenceError::NetworkUnreachable { .. } => "network",
            InferenceError::UpstreamStatus { .. } => "upstream-status",
            InferenceError::UpstreamParse { .. } => "json-parse",
            InferenceError::UpstreamErrorField { .. } => "error-field",
            InferenceError::EmptyResponse { .. } => "empty-response",
        }
    }

    pub fn diagnosis(&self) -> Option<&str> {
        match self {
            InferenceError::NetworkUnreachable { diagnosis, .. }
            | InferenceError::UpstreamStatus { diagnosis, .. } => diagnosis.as_deref(),
            _ => None,
        }
    }

    /// Structured payload returned to callers alongside the gateway status.
    pub fn detail(&self) -> Value {
        match self {
            InferenceError::NetworkUnreachable {
                url,
                cause,
                diagnosis,
            } => json!({
                "stage": self.stage(),
                "url": url,
                "error": cause,
                "diagnosis": diagnosis,
            }),
            InferenceError::UpstreamStatus {
                status,
                snippet,
                diagnosis,
            } => json!({
                "stage": self.stage(),
                "status": status,
                "snippet": snippet,
                "diagnosis": diagnosis,
            }),
            InferenceError::UpstreamParse { error, body_head } => json!({
                "stage": self.stage(),
                "error": error,
                "body_head": body_head,
            }),
            InferenceError::UpstreamErrorField { error } => json!({
                "stage": self.stage(),
                "error": error,
            }),
            InferenceError::EmptyResponse { keys, raw } => json!({
                "stage": self.stage(),
                "keys": keys,
                "raw": raw,
            }),
        }
    }
}

/// Raw, unclassified reply from `/api/generate`. Backs the debug endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

/// The inference-server protocol as seen by the rest of the service.
///
/// Carried in `AppState` as `Arc<dyn InferenceBackend>` so tests can inject fakes.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Model used when the caller does not name one.
    fn model(&self) -> &str;

    /// Names of all models the server reports via `/api/tags`.
    async fn list_models(&self) -> Result<Vec<String>, NetworkError>;

    /// True iff `model` exactly matches one listed model name.
    async fn check_model_available(&self, model: &str) -> Result<bool, NetworkError> {
        Ok(self.list_models().await?.iter().any(|name| name == model))
    }

    /// Sends one non-streaming generation request and returns the trimmed text.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InferenceError>;

    /// Sends a generation request and returns the upstream reply as-is.
    async fn probe_generate(&self, model: &str, prompt: &str)
        -> Result<UpstreamReply, NetworkError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Ollama HTTP client. Connections are not kept idle between calls, so every
/// call's connection is released when the call finishes, fails or times out.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    config: InferenceConfig,
}

impl OllamaClient {
    pub fn new(config: InferenceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().pool_max_idle_per_host(0).build()?;
        Ok(Self { client, config })
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.config.base_url)
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url)
    }

    /// Post-failure hook: lists models once and turns the outcome into a hint.
    /// Its own failure becomes part of the hint and is never propagated.
    pub async fn enrich(&self, model: &str) -> String {
        let outcome = self.list_models().await;
        diagnostics::describe_availability(model, outcome)
    }

    async fn post_generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<(reqwest::StatusCode, String), reqwest::Error> {
        let response = self
            .client
            .post(self.generate_url())
            .timeout(self.config.generate_timeout)
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
            })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn list_models(&self) -> Result<Vec<String>, NetworkError> {
        let url = self.tags_url();
        let fail = |cause: String| NetworkError {
            url: url.clone(),
            cause,
        };

        let response = self
            .client
            .get(&url)
            .timeout(self.config.probe_timeout)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| fail(e.to_string()))?;

        if !status.is_success() {
            return Err(fail(format!(
                "/api/tags returned {}: {}",
                status.as_u16(),
                head(&body, SNIPPET_LIMIT)
            )));
        }

        let data: Value = serde_json::from_str(&body)
            .map_err(|e| fail(format!("invalid JSON from /api/tags: {e}")))?;

        Ok(data
            .get("models")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InferenceError> {
        info!(model, prompt_len = prompt.len(), "Ollama generate");

        let (status, body) = match self.post_generate(model, prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Ollama network failure: {e}");
                let diagnosis = self.enrich(model).await;
                return Err(InferenceError::NetworkUnreachable {
                    url: self.generate_url(),
                    cause: e.to_string(),
                    diagnosis: Some(diagnosis),
                });
            }
        };

        if !status.is_success() {
            let snippet = head(&body, SNIPPET_LIMIT);
            warn!("Ollama non-success ({}): {snippet}", status.as_u16());
            let diagnosis = if mentions_missing_model(&body) {
                Some(self.enrich(model).await)
            } else {
                None
            };
            return Err(InferenceError::UpstreamStatus {
                status: status.as_u16(),
                snippet,
                diagnosis,
            });
        }

        interpret_generate_body(&body, self.config.debug)
    }

    async fn probe_generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<UpstreamReply, NetworkError> {
        self.post_generate(model, prompt)
            .await
            .map(|(status, body)| UpstreamReply {
                status: status.as_u16(),
                body,
            })
            .map_err(|e| NetworkError {
                url: self.generate_url(),
                cause: e.to_string(),
            })
    }
}

fn mentions_missing_model(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("model") && lower.contains("not found")
}

/// Classifies a 2xx `/api/generate` body.
fn interpret_generate_body(body: &str, debug: bool) -> Result<String, InferenceError> {
    let data: Value = serde_json::from_str(body).map_err(|e| {
        error!("Ollama JSON parse error: {e}; body={}", head(body, SNIPPET_LIMIT));
        InferenceError::UpstreamParse {
            error: e.to_string(),
            body_head: head(body, SNIPPET_LIMIT),
        }
    })?;

    if let Some(err) = data.get("error").and_then(error_text) {
        error!("Ollama error field: {err}");
        return Err(InferenceError::UpstreamErrorField {
            error: head(&err, SNIPPET_LIMIT),
        });
    }

    let text = data
        .get("response")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();

    if text.is_empty() {
        let keys: Vec<String> = data
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        error!("Empty response from Ollama; raw keys={keys:?}");
        return Err(InferenceError::EmptyResponse {
            keys,
            raw: debug.then(|| data.clone()),
        });
    }

    Ok(text.to_string())
}

/// Text of a non-empty `error` field; null, false and empty values count as absent.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// First `limit` characters of `text`, never splitting a UTF-8 sequence.
pub fn head(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use axum::{http::StatusCode, routing::get, routing::post, Json, Router};

    use super::*;

    /// Binds `router` on an ephemeral local port and returns its base URL.
    pub(crate) async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// A base URL nothing is listening on.
    async fn closed_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    #[derive(Clone, Default)]
    struct Hits {
        tags: Arc<AtomicUsize>,
        generate: Arc<AtomicUsize>,
        last_body: Arc<Mutex<Option<Value>>>,
    }

    /// Fake Ollama: `/api/tags` lists `models`, `/api/generate` answers with
    /// `status` and `body` after `delay`.
    fn fake_ollama(
        hits: Hits,
        models: &'static [&'static str],
        status: StatusCode,
        body: &'static str,
        delay: Duration,
    ) -> Router {
        let tag_hits = hits.clone();
        let gen_hits = hits;
        Router::new()
            .route(
                "/api/tags",
                get(move || {
                    let hits = tag_hits.clone();
                    async move {
                        hits.tags.fetch_add(1, Ordering::SeqCst);
                        let listed: Vec<Value> =
                            models.iter().map(|m| json!({ "name": m })).collect();
                        Json(json!({ "models": listed }))
                    }
                }),
            )
            .route(
                "/api/generate",
                post(move |Json(payload): Json<Value>| {
                    let hits = gen_hits.clone();
                    async move {
                        hits.generate.fetch_add(1, Ordering::SeqCst);
                        *hits.last_body.lock().unwrap() = Some(payload);
                        tokio::time::sleep(delay).await;
                        (status, body.to_string())
                    }
                }),
            )
    }

    async fn client_for(
        hits: &Hits,
        status: StatusCode,
        body: &'static str,
    ) -> OllamaClient {
        let base = spawn_server(fake_ollama(
            hits.clone(),
            &["gemma3:1b"],
            status,
            body,
            Duration::ZERO,
        ))
        .await;
        OllamaClient::new(InferenceConfig::new(base, "gemma3:1b")).unwrap()
    }

    #[tokio::test]
    async fn test_generate_success_returns_trimmed_text() {
        let hits = Hits::default();
        let client = client_for(&hits, StatusCode::OK, r#"{"response":"  hello \n","done":true}"#).await;

        let text = client.generate("gemma3:1b", "say hi").await.unwrap();

        assert_eq!(text, "hello");
        assert_eq!(hits.generate.load(Ordering::SeqCst), 1);
        assert_eq!(hits.tags.load(Ordering::SeqCst), 0);
        let sent = hits.last_body.lock().unwrap().clone().unwrap();
        assert_eq!(
            sent,
            json!({ "model": "gemma3:1b", "prompt": "say hi", "stream": false })
        );
    }

    #[tokio::test]
    async fn test_generate_status_error_without_model_hint_skips_enrichment() {
        let hits = Hits::default();
        let client = client_for(&hits, StatusCode::INTERNAL_SERVER_ERROR, "boom").await;

        let err = client.generate("gemma3:1b", "p").await.unwrap_err();

        match err {
            InferenceError::UpstreamStatus {
                status,
                snippet,
                diagnosis,
            } => {
                assert_eq!(status, 500);
                assert_eq!(snippet, "boom");
                assert!(diagnosis.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(hits.tags.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_status_error_body_is_truncated() {
        let hits = Hits::default();
        let long: &'static str = Box::leak("y".repeat(1000).into_boxed_str());
        let client = client_for(&hits, StatusCode::INTERNAL_SERVER_ERROR, long).await;

        match client.generate("gemma3:1b", "p").await.unwrap_err() {
            InferenceError::UpstreamStatus { snippet, .. } => {
                assert_eq!(snippet.chars().count(), SNIPPET_LIMIT)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_models_rejects_non_json_listing() {
        let base = spawn_server(Router::new().route("/api/tags", get(|| async { "<html>" }))).await;
        let client = OllamaClient::new(InferenceConfig::new(base, "gemma3:1b")).unwrap();

        let err = client.check_model_available("gemma3:1b").await.unwrap_err();
        assert!(err.cause.contains("invalid JSON"));
        assert!(err.url.ends_with("/api/tags"));
    }

    #[tokio::test]
    async fn test_generate_model_not_found_runs_one_enrichment() {
        let hits = Hits::default();
        let base = spawn_server(fake_ollama(
            hits.clone(),
            &["llama3:8b"],
            StatusCode::NOT_FOUND,
            r#"{"error":"model 'gemma3:1b' not found, try pulling it first"}"#,
            Duration::ZERO,
        ))
        .await;
        let client = OllamaClient::new(InferenceConfig::new(base, "gemma3:1b")).unwrap();

        let err = client.generate("gemma3:1b", "p").await.unwrap_err();

        assert_eq!(err.stage(), "upstream-status");
        let diagnosis = err.diagnosis().unwrap();
        assert!(diagnosis.contains("llama3:8b"));
        assert!(diagnosis.contains("ollama pull gemma3"));
        assert_eq!(hits.tags.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_unreachable_is_network_failure() {
        let base = closed_url().await;
        let client = OllamaClient::new(InferenceConfig::new(base.clone(), "gemma3:1b")).unwrap();

        let err = client.generate("gemma3:1b", "p").await.unwrap_err();

        match &err {
            InferenceError::NetworkUnreachable { url, diagnosis, .. } => {
                assert_eq!(url, &format!("{base}/api/generate"));
                assert!(diagnosis.as_deref().unwrap().contains("unreachable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.stage(), "network");
    }

    #[tokio::test]
    async fn test_generate_timeout_does_not_hang() {
        let hits = Hits::default();
        let base = spawn_server(fake_ollama(
            hits.clone(),
            &["gemma3:1b"],
            StatusCode::OK,
            r#"{"response":"late"}"#,
            Duration::from_secs(5),
        ))
        .await;
        let mut config = InferenceConfig::new(base, "gemma3:1b");
        config.generate_timeout = Duration::from_millis(200);
        let client = OllamaClient::new(config).unwrap();

        let started = Instant::now();
        let err = client.generate("gemma3:1b", "p").await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(err.stage(), "network");
        // Enrichment saw the model installed, so the hint says so.
        assert!(err.diagnosis().unwrap().contains("is installed"));
        assert_eq!(hits.tags.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generate_invalid_json_is_parse_failure() {
        let hits = Hits::default();
        let client = client_for(&hits, StatusCode::OK, "not json").await;

        let err = client.generate("gemma3:1b", "p").await.unwrap_err();

        match err {
            InferenceError::UpstreamParse { body_head, .. } => assert_eq!(body_head, "not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_model_available_requires_exact_name() {
        let hits = Hits::default();
        let client = client_for(&hits, StatusCode::OK, "{}").await;

        assert!(client.check_model_available("gemma3:1b").await.unwrap());
        assert!(!client.check_model_available("gemma3").await.unwrap());
        assert!(!client.check_model_available("gemma3:1b-it").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_model_available_network_error_carries_url() {
        let base = closed_url().await;
        let client = OllamaClient::new(InferenceConfig::new(base.clone(), "gemma3:1b")).unwrap();

        let err = client.check_model_available("gemma3:1b").await.unwrap_err();

        assert_eq!(err.url, format!("{base}/api/tags"));
        assert!(!err.cause.is_empty());
    }

    #[tokio::test]
    async fn test_probe_generate_returns_raw_reply() {
        let hits = Hits::default();
        let client = client_for(&hits, StatusCode::BAD_REQUEST, "bad prompt").await;

        let reply = client.probe_generate("gemma3:1b", "p").await.unwrap();

        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, "bad prompt");
    }

    #[test]
    fn test_interpret_error_field() {
        let err = interpret_generate_body(r#"{"error":"out of memory"}"#, false).unwrap_err();
        match err {
            InferenceError::UpstreamErrorField { error } => assert_eq!(error, "out of memory"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_empty_error_field_is_ignored() {
        let text = interpret_generate_body(r#"{"error":"","response":"ok"}"#, false).unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_interpret_empty_response_lists_keys() {
        let err =
            interpret_generate_body(r#"{"response":"   ","done":true}"#, false).unwrap_err();
        match err {
            InferenceError::EmptyResponse { mut keys, raw } => {
                keys.sort();
                assert_eq!(keys, vec!["done".to_string(), "response".to_string()]);
                assert!(raw.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_empty_response_echoes_raw_in_debug() {
        let err = interpret_generate_body(r#"{"done":true}"#, true).unwrap_err();
        match err {
            InferenceError::EmptyResponse { raw, .. } => {
                assert_eq!(raw, Some(json!({ "done": true })))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_snippets_are_truncated() {
        let long = "x".repeat(1000);
        let body = format!(r#"{{"error":"{long}"}}"#);
        match interpret_generate_body(&body, false).unwrap_err() {
            InferenceError::UpstreamErrorField { error } => {
                assert_eq!(error.chars().count(), SNIPPET_LIMIT)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_head_respects_char_boundaries() {
        assert_eq!(head("héllo", 2), "hé");
        assert_eq!(head("ab", 10), "ab");
    }

    #[test]
    fn test_detail_carries_stage() {
        let err = InferenceError::UpstreamStatus {
            status: 503,
            snippet: "busy".to_string(),
            diagnosis: None,
        };
        let detail = err.detail();
        assert_eq!(detail["stage"], "upstream-status");
        assert_eq!(detail["status"], 503);
    }
}
