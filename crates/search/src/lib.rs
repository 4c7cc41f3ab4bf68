//! # Toolbelt Search
//!
//! Query compiler and ranker over an indexed tool catalog.
//!
//! ```text
//! QueryCriteria ──> index narrowing ──> predicate pass ──> Ranker ──> top-K
//! ```
//!
//! Two entry points on [`SearchEngine`]: `query` filters and shapes,
//! `search` additionally scores (tag + text + semantic + custom channels),
//! orders deterministically and paginates. Indices only propose
//! candidates; every criterion is re-checked exactly before a tool can
//! appear in a result.
//!
//! ## Example
//!
//! ```no_run
//! use toolbelt_catalog::{Catalog, Tool};
//! use toolbelt_index::ToolIndex;
//! use toolbelt_search::{QueryCriteria, QueryOptions, SearchEngine, TagFilter};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = Catalog::from_tools([
//!         Tool::new("send-email", "Send an email").tag("comms"),
//!         Tool::new("get-weather", "Daily forecast").tag("weather"),
//!     ]);
//!     let engine = SearchEngine::new(ToolIndex::build(&catalog, None).await);
//!
//!     let criteria = QueryCriteria::new().tags(TagFilter::any(["comms"]));
//!     let results = engine
//!         .query(&catalog, &criteria, &QueryOptions::default())
//!         .await?;
//!     for view in results {
//!         println!("{}", view.name());
//!     }
//!     Ok(())
//! }
//! ```

mod compile;
mod criteria;
mod engine;
mod error;
mod rank;
mod relevance;
mod topk;

pub use criteria::{
    MetadataCondition, MetadataOp, MetadataPredicate, QueryCriteria, SchemaFilter, TagFilter,
    TextQuery, ToolPredicate, DEFAULT_FUZZY_THRESHOLD, DEFAULT_SEMANTIC_THRESHOLD,
};
pub use engine::{
    QueryOptions, ResultShape, SearchEngine, SearchOptions, ToolConfig, ToolSummary, ToolView,
};
pub use error::{Result, SearchError};
pub use rank::{
    field_weight, FieldScore, MatchDetail, RankAdjustment, RankDirective, RankOptions,
    RankedMatch, TieBreak, ToolComparator, ToolRanker, WeightedText,
};
pub use relevance::normalized_levenshtein;

// Re-export the match mode alongside the criteria that use it
pub use toolbelt_index::MatchMode;
