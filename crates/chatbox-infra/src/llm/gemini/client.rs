//! GeminiProvider -- concrete [`LlmProvider`] for the Gemini REST API.
//!
//! Talks to `models/{model}:generateContent` and `models/{model}:countTokens`.
//! The API key is held as a [`SecretString`] and only exposed when building
//! the `x-goog-api-key` header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use chatbox_core::llm::provider::LlmProvider;
use chatbox_types::chat::Message;
use chatbox_types::llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, TokenCount, Usage,
};

use super::types::{
    CountTokensRequest, CountTokensResponse, GeminiContent, GeminiErrorEnvelope,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

/// Public Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini language model provider.
///
/// Does not derive Debug: the struct holds the API key.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// Create a provider whose HTTP client gives up after `timeout`.
    pub fn new(api_key: SecretString, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        })
    }

    /// Override the base URL (proxies, local emulators).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Endpoint for `method` on `model`. Model names outside
    /// `[A-Za-z0-9._-]` would alter the path, so they are unknown models.
    fn url(&self, model: &str, method: &str) -> Result<String, LlmError> {
        if !is_model_name(model) {
            return Err(LlmError::ModelNotFound(model.to_string()));
        }
        Ok(format!("{}/models/{}:{}", self.base_url, model, method))
    }

    async fn post<B: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        body: &B,
    ) -> Result<R, LlmError> {
        let url = self.url(model, method)?;
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout.as_secs())
                } else {
                    LlmError::Provider {
                        message: format!("HTTP request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), model, &body));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse {method} response: {e}")))
    }
}

fn is_model_name(model: &str) -> bool {
    !model.is_empty()
        && model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Build the `generateContent` body from a provider-agnostic request.
pub(crate) fn to_gemini_request(request: &CompletionRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request.messages.iter().map(GeminiContent::from_message).collect(),
        system_instruction: request.system.as_deref().map(GeminiContent::system),
        generation_config: (!request.settings.is_empty())
            .then(|| GenerationConfig::from(&request.settings)),
    }
}

/// Convert a `generateContent` response into a [`CompletionResponse`].
///
/// A candidate without text (a safety stop, say) is an empty response.
pub(crate) fn from_gemini_response(
    response: GenerateContentResponse,
    model: &str,
) -> Result<CompletionResponse, LlmError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(LlmError::EmptyResponse(reason));
    };

    let finish_reason = candidate
        .finish_reason
        .as_deref()
        .map(|r| r.parse().unwrap_or(FinishReason::Other))
        .unwrap_or(FinishReason::Stop);

    let content = candidate.text();
    if content.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "no content".to_string());
        return Err(LlmError::EmptyResponse(reason));
    }

    let usage = response
        .usage_metadata
        .map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        model: model.to_string(),
        finish_reason,
        usage,
    })
}

/// Map a non-success status to an [`LlmError`].
pub(crate) fn map_status(status: u16, model: &str, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        404 => LlmError::ModelNotFound(model.to_string()),
        400 => LlmError::InvalidRequest(message),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited,
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = to_gemini_request(request);
        debug!(model = %request.model, messages = body.contents.len(), "gemini generateContent");

        let response: GenerateContentResponse =
            self.post(&request.model, "generateContent", &body).await?;
        from_gemini_response(response, &request.model)
    }

    async fn count_tokens(&self, model: &str, messages: &[Message]) -> Result<TokenCount, LlmError> {
        let body = CountTokensRequest {
            contents: messages.iter().map(GeminiContent::from_message).collect(),
        };

        let response: CountTokensResponse = self.post(model, "countTokens", &body).await?;
        Ok(TokenCount {
            total_tokens: response.total_tokens,
        })
    }
}
