use crate::embedder::Embedder;
use crate::error::{EmbedderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Memoizing wrapper around an `Embedder`
///
/// Results are cached by exact input text, so repeated queries for the
/// same text never hit the backend twice. Failed batches are not cached.
pub struct MemoEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Mutex<HashMap<String, Arc<Vec<f32>>>>,
}

impl MemoEmbedder {
    pub fn new(inner: Arc<dyn Embedder>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Embed a batch, reusing cached vectors and backfilling misses
    pub async fn embed_cached(&self, texts: &[String]) -> Result<Vec<Arc<Vec<f32>>>> {
        let mut misses: Vec<String> = Vec::new();
        {
            let cache = self.cache.lock().expect("embedding cache poisoned");
            for text in texts {
                if !cache.contains_key(text) && !misses.contains(text) {
                    misses.push(text.clone());
                }
            }
        }

        if !misses.is_empty() {
            log::debug!("Embedding {} uncached texts", misses.len());
            let vectors = self.inner.embed(&misses).await?;
            if vectors.len() != misses.len() {
                return Err(EmbedderError::BatchMismatch {
                    expected: misses.len(),
                    actual: vectors.len(),
                });
            }
            let mut cache = self.cache.lock().expect("embedding cache poisoned");
            for (text, vector) in misses.into_iter().zip(vectors) {
                cache.insert(text, Arc::new(vector));
            }
        }

        let cache = self.cache.lock().expect("embedding cache poisoned");
        Ok(texts
            .iter()
            .map(|text| Arc::clone(cache.get(text).expect("memoized vector present")))
            .collect())
    }

    /// Cached vector for a text, if any
    #[must_use]
    pub fn cached(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        self.cache
            .lock()
            .expect("embedding cache poisoned")
            .get(text)
            .map(Arc::clone)
    }

    /// Number of memoized texts
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().expect("embedding cache poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Embedder for MemoEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embed_cached(texts).await?;
        Ok(vectors.iter().map(|v| v.as_ref().clone()).collect())
    }
}
