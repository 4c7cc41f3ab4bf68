//! # Toolbelt Index
//!
//! Index structures that make catalog queries faster than linear scans:
//!
//! ```text
//! Tool mutation ──> LookupCache refresh ──> incremental index update
//!
//! ToolIndex
//!   ├─ LookupCache      memoized normalized views (lowercase tags/keys)
//!   ├─ InvertedIndex    tag / schema-key -> set of tools
//!   ├─ TextIndex        per-field token / length / char / n-gram buckets
//!   └─ EmbeddingIndex   per-dimension LSH band buckets + "missing" set
//! ```
//!
//! Every structure here produces *candidates*; exact predicate and
//! similarity checks downstream remain the source of truth. The indices
//! must never be stale relative to add/remove calls already applied —
//! an entry for a removed tool is a correctness bug, not a perf issue.

mod cache;
mod index;
mod inverted;
mod lsh;
mod text;

pub use cache::{LookupCache, ToolProfile};
pub use index::ToolIndex;
pub use inverted::InvertedIndex;
pub use lsh::EmbeddingIndex;
pub use text::{fuzzy_length_window, tokenize, MatchMode, TextIndex};
