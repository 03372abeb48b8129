//! Bounded conversation window sent to the model on each turn.
//!
//! The window starts from the persisted history plus the new user message and
//! is trimmed from the head, one user/model pair at a time, until its measured
//! token count fits the budget. Trimming only affects what is sent to the
//! model; persisted history is never shortened.

use chatbox_types::chat::Message;
use chatbox_types::llm::LlmError;
use tracing::debug;

use crate::llm::token_counter::TokenCounter;

/// Smallest window `fit` will leave behind.
pub const MIN_WINDOW_MESSAGES: usize = 2;

/// Errors from window mutation.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("message content must not be empty")]
    EmptyMessage,
}

/// Result of fitting a window to a token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOutcome {
    /// Token count of the window as last measured.
    pub tokens: u32,
    /// Messages removed from the head.
    pub dropped: usize,
    /// False when the floor was reached while still over budget.
    pub within_budget: bool,
}

/// Ordered messages, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationWindow {
    messages: Vec<Message>,
}

impl ConversationWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing history. Stored messages are trusted as-is.
    pub fn from_history(history: Vec<Message>) -> Self {
        Self { messages: history }
    }

    /// Append a message. Whitespace-only content is rejected.
    pub fn append(&mut self, message: Message) -> Result<(), WindowError> {
        if message.content.trim().is_empty() {
            return Err(WindowError::EmptyMessage);
        }
        self.messages.push(message);
        Ok(())
    }

    /// Trim the window until it fits `budget` or only the floor remains.
    ///
    /// Messages are dropped in head pairs so the window keeps its role
    /// alternation. A pair is only dropped if at least
    /// [`MIN_WINDOW_MESSAGES`] remain afterwards, so an odd-length window
    /// bottoms out at three messages. Nothing is dropped when the first
    /// measurement already fits. A counting failure is returned unchanged and
    /// leaves the window as it was at the failing measurement.
    pub async fn fit<T: TokenCounter>(
        &mut self,
        counter: &T,
        budget: u32,
    ) -> Result<FitOutcome, LlmError> {
        let mut dropped = 0;
        loop {
            let tokens = counter.count(&self.messages).await?;
            if tokens <= budget {
                return Ok(FitOutcome {
                    tokens,
                    dropped,
                    within_budget: true,
                });
            }
            if self.messages.len() < MIN_WINDOW_MESSAGES + 2 {
                debug!(tokens, budget, "window at floor, still over budget");
                return Ok(FitOutcome {
                    tokens,
                    dropped,
                    within_budget: false,
                });
            }

            debug!(tokens, budget, len = self.messages.len(), "dropping oldest turn");
            self.messages.drain(..2);
            dropped += 2;
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbox_types::chat::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Charges a fixed cost per message and records how often it was asked.
    struct PerMessage {
        cost: u32,
        calls: AtomicUsize,
    }

    impl PerMessage {
        fn new(cost: u32) -> Self {
            Self {
                cost,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TokenCounter for PerMessage {
        async fn count(&self, messages: &[Message]) -> Result<u32, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(messages.len() as u32 * self.cost)
        }
    }

    struct Failing;

    impl TokenCounter for Failing {
        async fn count(&self, _messages: &[Message]) -> Result<u32, LlmError> {
            Err(LlmError::Provider {
                message: "tokenizer offline".to_string(),
            })
        }
    }

    fn conversation(turns: usize) -> ConversationWindow {
        let mut window = ConversationWindow::new();
        for i in 0..turns {
            window.append(Message::user(format!("question {i}"))).unwrap();
            window.append(Message::model(format!("answer {i}"))).unwrap();
        }
        window
    }

    #[test]
    fn test_append_rejects_blank_content() {
        let mut window = ConversationWindow::new();
        assert!(matches!(
            window.append(Message::user("   \n")),
            Err(WindowError::EmptyMessage)
        ));
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn test_fit_leaves_window_alone_when_within_budget() {
        let mut window = conversation(3);
        let before = window.clone();
        let counter = PerMessage::new(10);

        let outcome = window.fit(&counter, 60).await.unwrap();

        assert_eq!(window, before);
        assert_eq!(
            outcome,
            FitOutcome {
                tokens: 60,
                dropped: 0,
                within_budget: true
            }
        );
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fit_drops_oldest_pairs() {
        let mut window = conversation(4);
        window.append(Message::user("latest")).unwrap();
        let counter = PerMessage::new(10);

        let outcome = window.fit(&counter, 30).await.unwrap();

        assert_eq!(outcome.dropped, 6);
        assert_eq!(outcome.tokens, 30);
        assert!(outcome.within_budget);
        assert_eq!(window.len(), 3);
        assert_eq!(window.messages()[0].content, "question 3");
        assert_eq!(window.messages()[2].content, "latest");
    }

    #[tokio::test]
    async fn test_fit_never_goes_below_floor() {
        for turns in 1..6 {
            let mut window = conversation(turns);
            let counter = PerMessage::new(1_000);

            let outcome = window.fit(&counter, 1).await.unwrap();

            assert_eq!(window.len(), MIN_WINDOW_MESSAGES);
            assert!(!outcome.within_budget);
        }
    }

    #[tokio::test]
    async fn test_fit_floor_with_odd_length() {
        let mut window = conversation(2);
        window.append(Message::user("latest")).unwrap();
        let counter = PerMessage::new(1_000);

        let outcome = window.fit(&counter, 1).await.unwrap();

        assert_eq!(window.len(), 3);
        assert_eq!(outcome.dropped, 2);
        assert_eq!(window.messages()[0].content, "question 1");
        assert_eq!(window.messages()[2].content, "latest");
    }

    #[tokio::test]
    async fn test_fit_is_idempotent() {
        let counter = PerMessage::new(7);
        let mut once = conversation(5);
        once.append(Message::user("latest")).unwrap();
        once.fit(&counter, 40).await.unwrap();

        let mut twice = once.clone();
        let outcome = twice.fit(&counter, 40).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(outcome.dropped, 0);
    }

    #[tokio::test]
    async fn test_fit_preserves_role_alternation() {
        let mut window = conversation(6);
        window.append(Message::user("latest")).unwrap();
        let counter = PerMessage::new(5);

        window.fit(&counter, 26).await.unwrap();

        assert_eq!(window.messages()[0].role, Role::User);
        for pair in window.messages().windows(2) {
            assert_ne!(pair[0].role, pair[1].role);
        }
    }

    #[tokio::test]
    async fn test_fit_propagates_counter_failure() {
        let mut window = conversation(2);
        let before = window.clone();

        let err = window.fit(&Failing, 10).await.unwrap_err();

        assert!(matches!(err, LlmError::Provider { .. }));
        assert_eq!(window, before);
    }
}
