use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CompletionGateway, LlmError, MAX_ATTEMPTS};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";
const MAX_COMPLETION_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.7;
const ERROR_BODY_PREVIEW: usize = 200;

/// Client for the OpenRouter chat-completions API.
///
/// Stateless between calls. Rate limiting (HTTP 429) and transient transport
/// or decode failures are retried with exponential backoff; any other non-2xx
/// response fails immediately with a truncated body preview for diagnostics.
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    default_model: String,
    backoff_unit: Duration,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

enum AttemptError {
    Retryable(String),
    Fatal(LlmError),
}

impl OpenRouterClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, OPENROUTER_URL)
    }

    /// Point the client at a different completions endpoint. Used by tests to
    /// target a local stub server.
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
            default_model: DEFAULT_MODEL.to_string(),
            backoff_unit: Duration::from_secs(1),
        }
    }

    #[cfg(test)]
    fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Delay before the retry that follows `attempt` (1-based): 2s, 4s, ...
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_unit * 2u32.saturating_pow(attempt)
    }

    async fn attempt(&self, key: &str, model: &str, prompt: &str) -> Result<String, AttemptError> {
        let request = CompletionRequest {
            model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|err| AttemptError::Retryable(format!("transport error: {err}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AttemptError::Retryable("rate limited (429)".to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| AttemptError::Retryable(format!("failed to read body: {err}")))?;

        if !status.is_success() {
            // Truncate by characters, not bytes, so multibyte bodies cannot
            // split a UTF-8 scalar.
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(AttemptError::Fatal(LlmError::Upstream {
                status: status.as_u16(),
                body: preview,
            }));
        }

        if body.trim().is_empty() {
            return Err(AttemptError::Retryable("empty response body".to_string()));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|err| AttemptError::Retryable(format!("invalid JSON response: {err}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AttemptError::Retryable("no content in response".to_string()))
    }
}

#[async_trait]
impl CompletionGateway for OpenRouterClient {
    async fn complete(&self, prompt: &str, model: Option<&str>) -> Result<String, LlmError> {
        let key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingCredentials)?;
        let model = model.unwrap_or(&self.default_model);

        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            debug!(model, attempt, prompt_len = prompt.len(), "completion attempt");
            match self.attempt(key, model, prompt).await {
                Ok(content) => return Ok(content),
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Retryable(reason)) => {
                    warn!(attempt, max = MAX_ATTEMPTS, %reason, "completion attempt failed");
                    last_error = reason;
                }
            }
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(self.backoff_delay(attempt)).await;
            }
        }

        Err(LlmError::ExhaustedRetries {
            attempts: MAX_ATTEMPTS,
            last_error,
        })
    }
}
