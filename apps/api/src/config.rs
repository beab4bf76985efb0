use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "gemma3:1b";
const DEFAULT_GENERATE_TIMEOUT_SECS: f64 = 180.0;
const DEFAULT_PROBE_TIMEOUT_SECS: f64 = 4.0;
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:19006",
    "http://localhost:8081",
    "http://localhost:3000",
];

/// Application configuration loaded from environment variables once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub inference: InferenceConfig,
    pub port: u16,
    pub rust_log: String,
    pub cors_origins: Vec<String>,
}

/// Everything the inference client needs. Immutable after construction;
/// tests build one pointing at a fake server.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub model: String,
    /// Per-call timeout for `/api/generate`.
    pub generate_timeout: Duration,
    /// Per-call timeout for `/api/tags` availability checks.
    pub probe_timeout: Duration,
    /// Echo the full upstream body in empty-response error payloads.
    pub debug: bool,
}

impl InferenceConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            generate_timeout: Duration::from_secs_f64(DEFAULT_GENERATE_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs_f64(DEFAULT_PROBE_TIMEOUT_SECS),
            debug: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut inference = InferenceConfig::new(
            env_or("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            env_or("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
        );
        inference.generate_timeout = seconds_env("OLLAMA_TIMEOUT", DEFAULT_GENERATE_TIMEOUT_SECS)?;
        inference.probe_timeout = seconds_env("OLLAMA_PROBE_TIMEOUT", DEFAULT_PROBE_TIMEOUT_SECS)?;
        inference.debug = std::env::var("OLLAMA_DEBUG")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let cors_origins = match std::env::var("CORS_ORIGINS") {
            Ok(raw) => split_list(&raw),
            Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Config {
            inference,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG")
                .or_else(|_| std::env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string())
                .to_lowercase(),
            cors_origins,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn seconds_env(key: &str, default: f64) -> Result<Duration> {
    let secs = match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("{key} must be a number of seconds"))?,
        Err(_) => default,
    };
    Duration::try_from_secs_f64(secs).with_context(|| format!("{key} must be a positive duration"))
}

/// `0`, `false` and the empty string are off; anything else is on.
fn parse_flag(raw: &str) -> bool {
    !matches!(raw.trim(), "" | "0" | "false" | "False" | "FALSE")
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
