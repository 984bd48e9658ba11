//! Mock AI provider for testing.
//!
//! Configurable implementation of the AiProvider port so pipeline tests
//! run without calling real LLM APIs: scripted replies consumed in order,
//! error injection, and call tracking for verification.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAiProvider::new()
//!     .with_reply("Hola, ¿cuál es tu nombre?");
//!
//! let reply = provider.complete("system", &history).await?;
//! assert_eq!(reply, "Hola, ¿cuál es tu nombre?");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::conversation::Message;
use crate::ports::{AiError, AiProvider};

/// A scripted outcome for one `complete` call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this reply text.
    Reply(String),
    /// Fail with a network error.
    NetworkError(String),
    /// Fail with a retired-model error.
    ModelNotFound(String),
    /// Fail with an authentication error.
    AuthFailed,
}

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_instruction: String,
    pub history_len: usize,
}

/// Mock AI provider with scripted replies.
#[derive(Debug, Clone, Default)]
pub struct MockAiProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockAiProvider {
    /// Creates a new mock provider with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Reply(reply.into()));
        self
    }

    /// Queues an arbitrary scripted outcome.
    pub fn with_outcome(self, outcome: MockReply) -> Self {
        self.replies.lock().unwrap().push_back(outcome);
        self
    }

    /// Returns the recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<String, AiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system_instruction: system_instruction.to_string(),
            history_len: history.len(),
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(MockReply::Reply(reply)) => Ok(reply),
            Some(MockReply::NetworkError(msg)) => Err(AiError::Network(msg)),
            Some(MockReply::ModelNotFound(model)) => Err(AiError::ModelNotFound(model)),
            Some(MockReply::AuthFailed) => Err(AiError::AuthenticationFailed),
            None => Ok("Entendido.".to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
