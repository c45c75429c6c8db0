mod openrouter;

pub use openrouter::OpenRouterClient;

use async_trait::async_trait;

/// Maximum attempts for one logical completion call, counting the first try.
pub const MAX_ATTEMPTS: u32 = 3;

/// Errors raised by completion gateways.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("no language-model API key configured")]
    MissingCredentials,
    #[error("language-model call gave up after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },
    #[error("language-model request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// Seam for the remote completion service.
///
/// Production uses [`OpenRouterClient`]; tests substitute deterministic stubs
/// so pipeline behavior can be checked without network access.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Send a prompt to the completion service and return the generated text.
    ///
    /// `model` overrides the gateway's default model identifier when given.
    async fn complete(&self, prompt: &str, model: Option<&str>) -> Result<String, LlmError>;
}
