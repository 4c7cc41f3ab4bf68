use ndarray::{Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use toolbelt_catalog::{TextField, ToolId};
use toolbelt_embedder::cosine_similarity;

/// Fixed seed for hyperplane sampling; XOR'd with the vector dimension so
/// every dimension gets its own, reproducible projection. Deterministic on
/// purpose (rebuilds must agree), not a cryptographic source.
const LSH_SEED: u64 = 0x746f_6f6c_6265_6c74;

/// Signature band width in bits
const BAND_BITS: u32 = 4;

/// Signature width grows with vector dimension
const fn signature_bits(dimension: usize) -> u32 {
    match dimension {
        0..=64 => 16,
        65..=192 => 20,
        193..=512 => 24,
        _ => 28,
    }
}

fn projection_matrix(dimension: usize) -> Array2<f32> {
    let bits = signature_bits(dimension) as usize;
    let mut rng = rand::rngs::StdRng::seed_from_u64(LSH_SEED ^ dimension as u64);
    let data: Vec<f32> = (0..bits * dimension)
        .map(|_| rng.gen_range(-1.0_f32..1.0))
        .collect();
    Array2::from_shape_vec((bits, dimension), data).expect("projection shape matches data")
}

/// Approximate nearest-neighbor index over per-field embedding vectors
///
/// Random-hyperplane signatures are split into 4-bit bands; a tool joins
/// one bucket per band per embedded field. Bucket hits are candidates
/// only — callers re-score the shortlist with exact cosine similarity.
/// Tools without any vector live in `missing` and are always candidates.
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    projections: Mutex<HashMap<usize, Arc<Array2<f32>>>>,
    buckets: HashMap<TextField, HashMap<(u32, u32), HashSet<ToolId>>>,
    vectors: HashMap<ToolId, HashMap<TextField, Vec<f32>>>,
    missing: HashSet<ToolId>,
}

impl EmbeddingIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn projection_for(&self, dimension: usize) -> Arc<Array2<f32>> {
        let mut projections = self.projections.lock().expect("projection cache poisoned");
        Arc::clone(
            projections
                .entry(dimension)
                .or_insert_with(|| Arc::new(projection_matrix(dimension))),
        )
    }

    /// Binary signature of a vector under this index's hyperplanes
    #[must_use]
    pub fn signature(&self, vector: &[f32]) -> u32 {
        let projection = self.projection_for(vector.len());
        let projected = projection.dot(&ArrayView1::from(vector));
        let mut signature = 0_u32;
        for (bit, value) in projected.iter().enumerate() {
            if *value >= 0.0 {
                signature |= 1_u32 << bit;
            }
        }
        signature
    }

    fn band_keys(dimension: usize, signature: u32) -> impl Iterator<Item = (u32, u32)> {
        let bands = signature_bits(dimension) / BAND_BITS;
        (0..bands).map(move |band| {
            let value = (signature >> (band * BAND_BITS)) & ((1 << BAND_BITS) - 1);
            (band, value)
        })
    }

    /// Index a tool's per-field vectors; a tool with none joins `missing`
    pub fn insert_tool(&mut self, id: ToolId, field_vectors: Vec<(TextField, Vec<f32>)>) {
        self.remove_tool(id);
        if field_vectors.is_empty() {
            self.missing.insert(id);
            return;
        }

        let mut stored = HashMap::new();
        for (field, vector) in field_vectors {
            if vector.is_empty() {
                continue;
            }
            let signature = self.signature(&vector);
            let field_buckets = self.buckets.entry(field).or_default();
            for key in Self::band_keys(vector.len(), signature) {
                field_buckets.entry(key).or_default().insert(id);
            }
            stored.insert(field, vector);
        }

        if stored.is_empty() {
            self.missing.insert(id);
        } else {
            self.vectors.insert(id, stored);
        }
    }

    /// A tool whose embedding never arrived is still reachable
    pub fn mark_missing(&mut self, id: ToolId) {
        self.remove_tool(id);
        self.missing.insert(id);
    }

    pub fn remove_tool(&mut self, id: ToolId) {
        self.missing.remove(&id);
        let Some(stored) = self.vectors.remove(&id) else {
            return;
        };
        for (field, vector) in stored {
            let signature = self.signature(&vector);
            if let Some(field_buckets) = self.buckets.get_mut(&field) {
                for key in Self::band_keys(vector.len(), signature) {
                    if let Some(bucket) = field_buckets.get_mut(&key) {
                        bucket.remove(&id);
                        if bucket.is_empty() {
                            field_buckets.remove(&key);
                        }
                    }
                }
                if field_buckets.is_empty() {
                    self.buckets.remove(&field);
                }
            }
        }
    }

    /// Candidate tools for a query vector: union of band-bucket hits
    /// across the requested fields, always including `missing`
    #[must_use]
    pub fn candidates(&self, query: &[f32], fields: &[TextField]) -> HashSet<ToolId> {
        let mut out: HashSet<ToolId> = self.missing.iter().copied().collect();
        if query.is_empty() {
            return out;
        }
        let signature = self.signature(query);
        for field in fields {
            let Some(field_buckets) = self.buckets.get(field) else {
                continue;
            };
            for key in Self::band_keys(query.len(), signature) {
                if let Some(bucket) = field_buckets.get(&key) {
                    out.extend(bucket);
                }
            }
        }
        out
    }

    /// Exact cosine re-score: the best (field, similarity) pair for a tool
    #[must_use]
    pub fn best_similarity(
        &self,
        id: ToolId,
        query: &[f32],
        fields: &[TextField],
    ) -> Option<(TextField, f32)> {
        let stored = self.vectors.get(&id)?;
        let mut best: Option<(TextField, f32)> = None;
        for field in fields {
            let Some(vector) = stored.get(field) else {
                continue;
            };
            let score = cosine_similarity(query, vector);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((*field, score));
            }
        }
        best
    }

    #[must_use]
    pub fn vector(&self, id: ToolId, field: TextField) -> Option<&[f32]> {
        self.vectors
            .get(&id)
            .and_then(|stored| stored.get(&field))
            .map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_missing(&self, id: ToolId) -> bool {
        self.missing.contains(&id)
    }

    /// Tools indexed with at least one vector
    #[must_use]
    pub fn embedded_count(&self) -> usize {
        self.vectors.len()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.vectors.clear();
        self.missing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbelt_catalog::Catalog;
    use toolbelt_catalog::Tool;

    fn id_of(catalog: &mut Catalog, name: &str) -> ToolId {
        catalog.register(Tool::new(name, ""))
    }

    #[test]
    fn signature_bit_widths_follow_dimension() {
        assert_eq!(signature_bits(2), 16);
        assert_eq!(signature_bits(64), 16);
        assert_eq!(signature_bits(65), 20);
        assert_eq!(signature_bits(192), 20);
        assert_eq!(signature_bits(384), 24);
        assert_eq!(signature_bits(768), 28);
    }

    #[test]
    fn signatures_are_deterministic_across_instances() {
        let a = EmbeddingIndex::new();
        let b = EmbeddingIndex::new();
        let vector: Vec<f32> = (0..96).map(|i| (i as f32).sin()).collect();
        assert_eq!(a.signature(&vector), b.signature(&vector));
    }

    #[test]
    fn identical_vectors_share_every_band_bucket() {
        let mut catalog = Catalog::new();
        let x = id_of(&mut catalog, "x");
        let mut index = EmbeddingIndex::new();
        let vector = vec![0.3_f32, -0.7, 0.2, 0.9];
        index.insert_tool(x, vec![(TextField::Description, vector.clone())]);

        let hits = index.candidates(&vector, &[TextField::Description]);
        assert!(hits.contains(&x));
    }

    #[test]
    fn missing_tools_are_always_candidates() {
        let mut catalog = Catalog::new();
        let x = id_of(&mut catalog, "x");
        let y = id_of(&mut catalog, "y");
        let mut index = EmbeddingIndex::new();
        index.insert_tool(x, vec![(TextField::Description, vec![1.0, 0.0])]);
        index.mark_missing(y);

        let hits = index.candidates(&[0.0_f32, -1.0], &[TextField::Description]);
        assert!(hits.contains(&y), "missing tool must stay reachable");
        assert!(index.is_missing(y));
    }

    #[test]
    fn removal_clears_buckets_and_missing() {
        let mut catalog = Catalog::new();
        let x = id_of(&mut catalog, "x");
        let mut index = EmbeddingIndex::new();
        let vector = vec![0.5_f32, 0.5, -0.5];
        index.insert_tool(x, vec![(TextField::Name, vector.clone())]);

        index.remove_tool(x);
        assert_eq!(index.embedded_count(), 0);
        let hits = index.candidates(&vector, &[TextField::Name]);
        assert!(hits.is_empty());
    }

    #[test]
    fn best_similarity_picks_the_closest_field() {
        let mut catalog = Catalog::new();
        let x = id_of(&mut catalog, "x");
        let mut index = EmbeddingIndex::new();
        index.insert_tool(
            x,
            vec![
                (TextField::Name, vec![1.0, 0.0]),
                (TextField::Description, vec![0.0, 1.0]),
            ],
        );

        let (field, score) = index
            .best_similarity(x, &[0.0, 1.0], &[TextField::Name, TextField::Description])
            .unwrap();
        assert_eq!(field, TextField::Description);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_scores_zero_not_error() {
        let mut catalog = Catalog::new();
        let x = id_of(&mut catalog, "x");
        let mut index = EmbeddingIndex::new();
        index.insert_tool(x, vec![(TextField::Name, vec![1.0, 0.0, 0.0])]);

        let (_, score) = index
            .best_similarity(x, &[1.0, 0.0], &[TextField::Name])
            .unwrap();
        assert_eq!(score, 0.0);
    }
}
