use crate::error::Result;
use async_trait::async_trait;

/// A source of embedding vectors for arbitrary text
///
/// Implementations may call out to a remote service; the contract is one
/// vector per input text, in input order. Timeouts and cancellation are
/// the implementation's responsibility, not the index's.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per text
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::EmbedderError::BatchMismatch {
                expected: 1,
                actual: 0,
            })
    }
}
