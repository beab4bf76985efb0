//! In-process `InferenceBackend` for pipeline and handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{InferenceBackend, InferenceError, NetworkError, UpstreamReply};

pub(crate) struct FakeBackend {
    reply: Result<String, InferenceError>,
    models: Result<Vec<String>, NetworkError>,
    generate_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeBackend {
    /// Every generation returns `text`.
    pub(crate) fn replying(text: &str) -> Self {
        Self::with_reply(Ok(text.to_string()))
    }

    /// Every generation fails with `err`.
    pub(crate) fn failing(err: InferenceError) -> Self {
        Self::with_reply(Err(err))
    }

    fn with_reply(reply: Result<String, InferenceError>) -> Self {
        Self {
            reply,
            models: Ok(vec!["fake-model".to_string()]),
            generate_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_models(mut self, models: Result<Vec<String>, NetworkError>) -> Self {
        self.models = models;
        self
    }

    pub(crate) fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for FakeBackend {
    fn model(&self) -> &str {
        "fake-model"
    }

    async fn list_models(&self) -> Result<Vec<String>, NetworkError> {
        self.models.clone()
    }

    async fn generate(&self, _model: &str, prompt: &str) -> Result<String, InferenceError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }

    async fn probe_generate(
        &self,
        _model: &str,
        prompt: &str,
    ) -> Result<UpstreamReply, NetworkError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(UpstreamReply {
            status: 200,
            body: match &self.reply {
                Ok(text) => serde_json::json!({ "response": text }).to_string(),
                Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
            },
        })
    }
}
