//! # Toolbelt Embedder
//!
//! The embedding boundary for the query engine: a pluggable `Embedder`
//! trait, exact-text memoization, cosine similarity, and a deterministic
//! hash-based stub for offline use.
//!
//! The engine never talks to an embedding backend directly; it sees
//! `MemoEmbedder`, which guarantees that repeated queries for the same
//! text never recompute a vector.

mod cosine;
mod embedder;
mod error;
mod memo;
mod stub;

pub use cosine::cosine_similarity;
pub use embedder::Embedder;
pub use error::{EmbedderError, Result};
pub use memo::MemoEmbedder;
pub use stub::HashEmbedder;
