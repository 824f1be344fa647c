//! AI draft generation
//!
//! One blocking chat-completions call per generate; no internal retry and no
//! caching, so identical inputs may produce different drafts. That
//! non-determinism comes from the model, not a bug here.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::GeneratorConfig;
use crate::error::{PlatformError, Result, Upstream};

/// Fixed system instruction sent with every generation call.
pub const SYSTEM_INSTRUCTION: &str = "You are a professional LinkedIn content writer. \
Keep the tone enthusiastic, clear, and concise. \
Do not include hashtags unless requested. \
Never mention or imply that the post was written with automated assistance. \
Do not use dash characters. \
Return only the post body, with no commentary.";

#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce or refine a post body from free-form input.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Generation` carrying the upstream status/body
    /// on any non-success response or a response missing the text field.
    async fn generate(&self, input: &str) -> Result<String>;
}

/// Live generator backed by an OpenRouter-compatible completions endpoint
pub struct OpenRouterGenerator {
    http: reqwest::Client,
    config: GeneratorConfig,
}

impl OpenRouterGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Generator for OpenRouterGenerator {
    async fn generate(&self, input: &str) -> Result<String> {
        let request = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_INSTRUCTION},
                {"role": "user", "content": format!("Write a LinkedIn post based on: {}", input)},
            ],
        });

        tracing::debug!(model = %self.config.model, "requesting draft generation");

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PlatformError::Generation(Upstream::transport(e)))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Generation(Upstream::http(status, body)).into());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PlatformError::Generation(Upstream::transport(e)))?;

        match body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
        {
            Some(content) => Ok(content.to_string()),
            None => Err(PlatformError::Generation(Upstream::http(
                status,
                format!("completion response missing content: {}", body),
            ))
            .into()),
        }
    }
}

/// Deterministic generator for tests
///
/// Returns scripted outputs in order, repeating the last one once the script
/// is exhausted, or fails every call when constructed as failing.
pub struct MockGenerator {
    outputs: Arc<Mutex<VecDeque<String>>>,
    last: Arc<Mutex<Option<String>>>,
    failure: Option<String>,
    calls: Arc<Mutex<usize>>,
}

impl MockGenerator {
    pub fn returning(output: &str) -> Self {
        Self::sequence(vec![output.to_string()])
    }

    pub fn sequence(outputs: Vec<String>) -> Self {
        Self {
            outputs: Arc::new(Mutex::new(outputs.into())),
            last: Arc::new(Mutex::new(None)),
            failure: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(upstream_body: &str) -> Self {
        Self {
            outputs: Arc::new(Mutex::new(VecDeque::new())),
            last: Arc::new(Mutex::new(None)),
            failure: Some(upstream_body.to_string()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Succeed through `outputs`, then fail every further call.
    pub fn sequence_then_fail(outputs: Vec<String>, upstream_body: &str) -> Self {
        Self {
            outputs: Arc::new(Mutex::new(outputs.into())),
            last: Arc::new(Mutex::new(None)),
            failure: Some(upstream_body.to_string()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _input: &str) -> Result<String> {
        *self.calls.lock().unwrap() += 1;

        let mut outputs = self.outputs.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(next) = outputs.pop_front() {
            *last = Some(next.clone());
            return Ok(next);
        }
        if let Some(body) = &self.failure {
            return Err(PlatformError::Generation(Upstream::http(500, body.clone())).into());
        }
        last.clone().ok_or_else(|| {
            PlatformError::Generation(Upstream::http(500, "mock script exhausted")).into()
        })
    }
}
