//! Grounded answer generation.

use std::sync::Arc;

use coderag_llm::LlmProvider;
use coderag_llm::provider::Message;

use crate::error::Result;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant who answers questions about a codebase.";

#[must_use]
pub fn build_messages(context: &str, question: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(format!("{context}\n\nQuestion: {question}")),
    ]
}

/// Asks the chat model one question over assembled context.
pub struct Answerer<P> {
    provider: Arc<P>,
}

impl<P: LlmProvider> Answerer<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// # Errors
    ///
    /// Returns an error if the chat call fails.
    pub async fn answer(&self, context: &str, question: &str) -> Result<String> {
        let messages = build_messages(context, question);
        let reply = self.provider.chat(&messages).await?;
        Ok(reply.trim().to_string())
    }
}
