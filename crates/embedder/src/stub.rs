use crate::embedder::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic hash-seeded embedder for offline and test use
///
/// Each text hashes to an RNG seed that generates its vector, so the same
/// text always embeds identically within a build. Not a semantic model:
/// unrelated texts land on unrelated directions, which is exactly what
/// stub-mode tests need.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = rand::rngs::StdRng::seed_from_u64(hasher.finish());

        let raw: Vec<f32> = (0..self.dimension)
            .map(|_| rng.gen_range(-1.0_f32..1.0))
            .collect();
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm <= f32::EPSILON {
            return raw;
        }
        raw.into_iter().map(|v| v / norm).collect()
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosine::cosine_similarity;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let stub = HashEmbedder::new(32);
        let a = stub.embed_one("send-email").await.unwrap();
        let b = stub.embed_one("send-email").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let stub = HashEmbedder::default();
        let v = stub.embed_one("get-weather").await.unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn distinct_texts_are_not_aligned() {
        let stub = HashEmbedder::new(64);
        let a = stub.embed_one("alpha").await.unwrap();
        let b = stub.embed_one("omega").await.unwrap();
        assert!(cosine_similarity(&a, &b) < 0.9);
    }
}
