//! Completion backend trait and the OpenAI-compatible HTTP implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CompletionError;

/// A text completion service.
///
/// The engine issues exactly one call per document and does not retry;
/// failure is immediate and triggers the regex fallback tier. Implementations
/// must bound their own execution time (see [`CompletionConfig::timeout`]).
pub trait CompletionBackend: Send + Sync {
    /// Send a prompt, return the raw completion text.
    fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;
}

/// Configuration for [`HttpCompletionBackend`].
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Chat completions endpoint, without the `/chat/completions` suffix.
    pub endpoint: String,
    /// API key; read from `ITINEX_AI_API_KEY` by default.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// Sampling temperature. Extraction wants determinism, so default is 0.
    pub temperature: f32,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: std::env::var("ITINEX_AI_API_KEY").unwrap_or_default(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2048,
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

impl CompletionConfig {
    /// Create a config with an explicit key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Point at a local OpenAI-compatible server (vLLM, Ollama, etc.).
    pub fn local(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: "not-needed".to_string(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// OpenAI-compatible chat completions backend.
///
/// Works against OpenAI itself and any server speaking the same protocol.
/// The call is blocking; the engine processes one document at a time and has
/// no use for an async runtime.
pub struct HttpCompletionBackend {
    config: CompletionConfig,
    client: Client,
}

impl HttpCompletionBackend {
    /// Create a new backend. Fails if no API key is configured for a remote
    /// endpoint or if the HTTP client cannot be built.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        if config.api_key.is_empty() && !config.endpoint.starts_with("http://localhost") {
            return Err(CompletionError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Configuration(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

impl CompletionBackend for HttpCompletionBackend {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            stream: Some(false),
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "sending completion request");

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: ChatResponse = response
            .json()
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("no choices in response".to_string()))?;

        Ok(choice.message.content)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
