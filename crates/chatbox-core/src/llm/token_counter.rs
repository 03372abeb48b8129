//! Token counting capability used by the conversation window.

use std::time::Duration;

use chatbox_types::chat::Message;
use chatbox_types::llm::LlmError;

use crate::llm::provider::LlmProvider;

/// Measures the token cost of a message list.
///
/// The measurement may be a remote call, so it is async and fallible.
pub trait TokenCounter: Send + Sync {
    fn count(
        &self,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<u32, LlmError>> + Send;
}

/// Counts tokens through a provider's own tokenizer for one model.
///
/// Each call is bounded by `timeout`; an elapsed timeout is reported as
/// [`LlmError::Timeout`].
pub struct ModelTokenCounter<'a, L: LlmProvider> {
    provider: &'a L,
    model: &'a str,
    timeout: Duration,
}

impl<'a, L: LlmProvider> ModelTokenCounter<'a, L> {
    pub fn new(provider: &'a L, model: &'a str, timeout: Duration) -> Self {
        Self {
            provider,
            model,
            timeout,
        }
    }
}

impl<L: LlmProvider> TokenCounter for ModelTokenCounter<'_, L> {
    async fn count(&self, messages: &[Message]) -> Result<u32, LlmError> {
        match tokio::time::timeout(self.timeout, self.provider.count_tokens(self.model, messages))
            .await
        {
            Ok(result) => result.map(|count| count.total_tokens),
            Err(_) => Err(LlmError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbox_types::llm::{
        CompletionRequest, CompletionResponse, FinishReason, TokenCount, Usage,
    };

    struct SlowProvider {
        delay: Duration,
    }

    impl LlmProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: String::new(),
                model: request.model.clone(),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            })
        }

        async fn count_tokens(
            &self,
            _model: &str,
            messages: &[Message],
        ) -> Result<TokenCount, LlmError> {
            tokio::time::sleep(self.delay).await;
            Ok(TokenCount {
                total_tokens: messages.len() as u32 * 10,
            })
        }
    }

    #[tokio::test]
    async fn test_counts_through_provider() {
        let provider = SlowProvider {
            delay: Duration::ZERO,
        };
        let counter = ModelTokenCounter::new(&provider, "m", Duration::from_secs(1));
        let total = counter
            .count(&[Message::user("a"), Message::model("b")])
            .await
            .unwrap();
        assert_eq!(total, 20);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let provider = SlowProvider {
            delay: Duration::from_millis(500),
        };
        let counter = ModelTokenCounter::new(&provider, "m", Duration::from_millis(20));
        let err = counter.count(&[Message::user("a")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }
}
