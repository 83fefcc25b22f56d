//! OpenAI-compatible capability implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, llama.cpp, Together AI and
//! any endpoint exposing `/v1/chat/completions`.
//!
//! The engine never retries; this capability does, with a linearly growing
//! delay between attempts. Every await point races the cancellation token so
//! a cancelled fan-out stops the request (or the back-off sleep) at once.

use std::time::Duration;

use async_trait::async_trait;
use conclave_core::{CancellationToken, Capability, CapabilityError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible chat-completion capability.
pub struct OpenAiCompatCapability {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatCapability {
    /// Create a new OpenAI-compatible capability.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 2048,
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            client,
        }
    }

    /// Create an OpenAI capability (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(model.clone(), "https://api.openai.com/v1", api_key, model)
    }

    /// Create an Ollama capability (convenience constructor).
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            model.clone(),
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
            model,
        )
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }

    /// One HTTP round trip, without retry.
    async fn attempt(&self, prompt: &str) -> Result<String, CapabilityError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(capability = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| CapabilityError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        extract_content(api_response)
    }
}

/// Map a non-200 status to a capability error.
fn status_error(status: u16, body: String) -> CapabilityError {
    match status {
        401 | 403 => CapabilityError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        429 => CapabilityError::RateLimited {
            retry_after_secs: 5,
        },
        _ => CapabilityError::Api {
            status_code: status,
            message: body,
        },
    }
}

fn extract_content(response: ApiResponse) -> Result<String, CapabilityError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CapabilityError::Api {
            status_code: 200,
            message: "No choices in response".into(),
        })?;

    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(CapabilityError::Api {
            status_code: 200,
            message: "Empty completion".into(),
        }),
    }
}

#[async_trait]
impl Capability for OpenAiCompatCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> Result<String, CapabilityError> {
        if self.api_key.is_empty() {
            return Err(CapabilityError::NotConfigured(format!(
                "no API key for capability '{}'",
                self.name
            )));
        }

        let mut last_error = CapabilityError::Failed("no attempt made".into());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(
                    capability = %self.name,
                    attempt,
                    max_retries = self.max_retries,
                    error = %last_error,
                    "Retrying completion request"
                );
                let delay = self.retry_delay * attempt;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(CapabilityError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CapabilityError::Cancelled),
                outcome = self.attempt(prompt) => outcome,
            };

            match outcome {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() => last_error = e,
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

// --- OpenAI API types ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}
