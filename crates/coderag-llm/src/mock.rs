//! Test-only mock LLM provider.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

/// Deterministic provider: embeddings are token-hash histograms, so texts that
/// share words land close to each other under L2.
#[derive(Debug, Clone)]
pub struct MockProvider {
    pub dimension: usize,
    pub default_response: String,
    pub fail_chat: bool,
    /// Zero-based `embed_batch` call indices that fail.
    pub failing_embed_calls: Vec<usize>,
    embed_calls: Arc<AtomicUsize>,
    last_messages: Arc<std::sync::Mutex<Vec<Message>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            dimension: 1536,
            default_response: "mock response".into(),
            fail_chat: false,
            failing_embed_calls: Vec::new(),
            embed_calls: Arc::new(AtomicUsize::new(0)),
            last_messages: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    #[must_use]
    pub fn failing_chat(mut self) -> Self {
        self.fail_chat = true;
        self
    }

    #[must_use]
    pub fn failing_embed_calls(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_embed_calls = calls.into_iter().collect();
        self
    }

    /// Number of `embed_batch` calls made so far, failed ones included.
    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Messages passed to the most recent `chat` call.
    #[must_use]
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// The vector this provider produces for `text`.
    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        if self.dimension == 0 {
            return vector;
        }
        for token in text.split(|c: char| !c.is_alphanumeric() && c != '_') {
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        Ok(self.default_response.clone())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let call = self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_embed_calls.contains(&call) {
            return Err(LlmError::Other(format!("mock embedding failure on call {call}")));
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embed_batch_is_deterministic() {
        let p = MockProvider::with_dimension(32);
        let a = p.embed_batch(&["def foo".into()]).await.unwrap();
        let b = p.embed_batch(&["def foo".into()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 32);
        assert_eq!(p.embed_calls(), 2);
    }

    #[tokio::test]
    async fn failing_call_schedule() {
        let p = MockProvider::with_dimension(8).failing_embed_calls([1]);
        assert!(p.embed_batch(&["a".into()]).await.is_ok());
        assert!(p.embed_batch(&["a".into()]).await.is_err());
        assert!(p.embed_batch(&["a".into()]).await.is_ok());
    }

    #[tokio::test]
    async fn chat_records_messages() {
        let p = MockProvider::default().with_response("ok");
        let out = p.chat(&[Message::user("hello")]).await.unwrap();
        assert_eq!(out, "ok");
        assert_eq!(p.last_messages()[0].content, "hello");
    }

    #[tokio::test]
    async fn failing_chat_errors() {
        let p = MockProvider::default().failing_chat();
        assert!(p.chat(&[]).await.is_err());
    }
}
