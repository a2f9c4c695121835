//! Batch embedding with count and dimension checks.

use std::sync::Arc;

use coderag_llm::LlmProvider;

use crate::error::{IndexError, Result};

/// Wraps an embedding provider and enforces the index dimension on every
/// vector it returns.
pub struct Embedder<P> {
    provider: Arc<P>,
    dimension: usize,
}

impl<P: LlmProvider> Embedder<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, dimension: usize) -> Self {
        Self {
            provider,
            dimension,
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed `texts` in a single provider call, preserving order.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails, the vector count differs from the
    /// input count, or any vector has the wrong dimension.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.provider.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(IndexError::Embedding(format!(
                "{} returned {} vectors for {} inputs",
                self.provider.name(),
                vectors.len(),
                texts.len()
            )));
        }
        for vector in &vectors {
            self.check(vector)?;
        }
        Ok(vectors)
    }

    /// Embed one query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the vector has the wrong dimension.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let vector = self.provider.embed(query).await?;
        self.check(&vector)?;
        Ok(vector)
    }

    fn check(&self, vector: &[f32]) -> Result<()> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(IndexError::Dimension {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use coderag_llm::mock::MockProvider;

    use super::*;

    #[tokio::test]
    async fn batch_preserves_order_and_count() {
        let provider = Arc::new(MockProvider::with_dimension(16));
        let embedder = Embedder::new(Arc::clone(&provider), 16);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], provider.vector_for("alpha"));
        assert_eq!(vectors[1], provider.vector_for("beta"));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_call() {
        let provider = Arc::new(MockProvider::with_dimension(4));
        let embedder = Embedder::new(Arc::clone(&provider), 4);
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
        assert_eq!(provider.embed_calls(), 0);
    }

    #[tokio::test]
    async fn wrong_dimension_rejected() {
        let embedder = Embedder::new(Arc::new(MockProvider::with_dimension(8)), 16);
        let err = embedder.embed_query("q").await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::Dimension {
                expected: 16,
                actual: 8
            }
        ));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = MockProvider::with_dimension(4).failing_embed_calls([0]);
        let embedder = Embedder::new(Arc::new(provider), 4);
        let err = embedder.embed_batch(&["x".into()]).await.unwrap_err();
        assert!(matches!(err, IndexError::Llm(_)));
    }
}
