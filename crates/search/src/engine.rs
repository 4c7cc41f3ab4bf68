use crate::compile::{matches, narrow, EvalContext};
use crate::criteria::{MetadataOp, QueryCriteria, TextQuery};
use crate::error::{Result, SearchError};
use crate::rank::{RankContext, RankOptions, RankedMatch, TieBreak, WeightedText};
use crate::topk::{HeapEntry, TopK};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use toolbelt_catalog::{Catalog, Tool, ToolId, ToolSchema};
use toolbelt_index::{MatchMode, ToolIndex};

/// Shape of entries returned by a filter-only query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultShape {
    /// The full tool
    #[default]
    Tool,
    /// Just the name
    Name,
    /// The callable definition
    Config,
    /// Name, description and tags
    Summary,
}

/// A query result in the requested shape
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolView {
    Tool(Arc<Tool>),
    Name(String),
    Config(ToolConfig),
    Summary(ToolSummary),
}

impl ToolView {
    /// Name of the underlying tool, whatever the shape
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Tool(tool) => &tool.name,
            Self::Name(name) => name,
            Self::Config(config) => &config.name,
            Self::Summary(summary) => &summary.name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolConfig {
    pub name: String,
    pub description: String,
    pub schema: ToolSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Options for a filter-only query
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub limit: Option<usize>,
    pub offset: usize,
    pub shape: ResultShape,
}

/// Options for a filter + rank search
#[derive(Clone, Default)]
pub struct SearchOptions {
    pub criteria: Option<QueryCriteria>,
    pub rank: RankOptions,
    pub limit: Option<usize>,
    pub offset: usize,
    /// Attach a structured per-channel breakdown to every result
    pub explain: bool,
}

/// Query and ranking engine over an indexed catalog
///
/// Holds the derived index structures; the catalog itself stays with the
/// host, which serializes mutation against queries.
pub struct SearchEngine {
    index: ToolIndex,
}

impl SearchEngine {
    #[must_use]
    pub fn new(index: ToolIndex) -> Self {
        Self { index }
    }

    #[must_use]
    pub fn index(&self) -> &ToolIndex {
        &self.index
    }

    /// Mutable index access for the catalog's register/unregister hooks
    pub fn index_mut(&mut self) -> &mut ToolIndex {
        &mut self.index
    }

    /// Filter-only query: candidate narrowing, exact predicate pass,
    /// deterministic name ordering, pagination, shaping
    pub async fn query(
        &self,
        catalog: &Catalog,
        criteria: &QueryCriteria,
        options: &QueryOptions,
    ) -> Result<Vec<ToolView>> {
        validate_criteria(criteria)?;
        validate_page(options.limit)?;

        let ctx = EvalContext::for_criteria(&self.index, criteria).await;
        let mut matched = self.filter(catalog, criteria, &ctx);
        matched.sort_by(|(ida, a), (idb, b)| a.name.cmp(&b.name).then(ida.cmp(idb)));

        Ok(paginate(matched, options.offset, options.limit)
            .map(|(_, tool)| shape_tool(&tool, options.shape))
            .collect())
    }

    /// Filter + rank + paginate
    pub async fn search(
        &self,
        catalog: &Catalog,
        options: &SearchOptions,
    ) -> Result<Vec<RankedMatch>> {
        if let Some(criteria) = &options.criteria {
            validate_criteria(criteria)?;
        }
        validate_rank(&options.rank)?;
        validate_page(options.limit)?;

        let empty = QueryCriteria::new();
        let criteria = options.criteria.as_ref().unwrap_or(&empty);
        let mut ctx = EvalContext::for_criteria(&self.index, criteria).await;
        if let Some(text) = &options.rank.text {
            ctx.embed(&self.index, &text.query).await;
        }

        let matched = self.filter(catalog, criteria, &ctx);
        log::debug!("Search: {} candidates after filtering", matched.len());

        let query_vector = options
            .rank
            .text
            .as_ref()
            .and_then(|text| ctx.vector(&text.query))
            .map(|vector| vector.to_vec());
        let rank_ctx = RankContext::new(&self.index, &options.rank, query_vector);

        let bounded = options.limit.is_some()
            && !rank_ctx.has_custom_ranker()
            && !matches!(options.rank.tie_break, TieBreak::Comparator(_));
        let results = if bounded {
            self.search_bounded(&rank_ctx, matched, options)
        } else {
            self.search_sorted(&rank_ctx, matched, options)
        };
        Ok(results)
    }

    fn filter(
        &self,
        catalog: &Catalog,
        criteria: &QueryCriteria,
        ctx: &EvalContext,
    ) -> Vec<(ToolId, Arc<Tool>)> {
        let candidates = narrow(&self.index, criteria, ctx);
        if let Some(candidates) = &candidates {
            log::debug!("Narrowed to {} candidates via indices", candidates.len());
        }

        let consider: Vec<(ToolId, &Arc<Tool>)> = match candidates {
            Some(ids) => {
                let mut ids: Vec<ToolId> = ids.into_iter().collect();
                ids.sort_unstable();
                ids.into_iter()
                    .filter_map(|id| catalog.get(id).map(|tool| (id, tool)))
                    .collect()
            }
            None => catalog.iter().collect(),
        };

        consider
            .into_iter()
            .filter(|(id, tool)| {
                let profile = self.index.lookup().get_or_build(*id, tool);
                matches(&self.index, *id, tool, &profile, criteria, ctx)
            })
            .map(|(id, tool)| (id, Arc::clone(tool)))
            .collect()
    }

    /// Top-K path: a bounded heap of size limit+offset selects finalists
    /// without a full sort; only they get reasons and breakdowns
    fn search_bounded(
        &self,
        rank_ctx: &RankContext<'_>,
        matched: Vec<(ToolId, Arc<Tool>)>,
        options: &SearchOptions,
    ) -> Vec<RankedMatch> {
        let limit = options.limit.unwrap_or(0);
        let mut topk = TopK::new(limit + options.offset);
        let mut by_id: std::collections::HashMap<ToolId, Arc<Tool>> = std::collections::HashMap::new();

        for (id, tool) in matched {
            let profile = self.index.lookup().get_or_build(id, &tool);
            let score = rank_ctx.score_only(id, &tool, &profile);
            topk.push(HeapEntry {
                score,
                name: tool.name.clone(),
                id,
            });
            by_id.insert(id, tool);
        }

        topk.into_sorted()
            .into_iter()
            .skip(options.offset)
            .take(limit)
            .filter_map(|entry| {
                let tool = by_id.remove(&entry.id)?;
                let profile = self.index.lookup().get_or_build(entry.id, &tool);
                let (score, reasons, detail) =
                    rank_ctx.score_detailed(entry.id, &tool, &profile)?;
                Some(RankedMatch {
                    id: entry.id,
                    tool,
                    score,
                    reasons,
                    detail: options.explain.then_some(detail),
                })
            })
            .collect()
    }

    /// Full path: detailed scoring for every match, then a complete sort
    fn search_sorted(
        &self,
        rank_ctx: &RankContext<'_>,
        matched: Vec<(ToolId, Arc<Tool>)>,
        options: &SearchOptions,
    ) -> Vec<RankedMatch> {
        let mut results: Vec<RankedMatch> = matched
            .into_iter()
            .filter_map(|(id, tool)| {
                let profile = self.index.lookup().get_or_build(id, &tool);
                let (score, reasons, detail) = rank_ctx.score_detailed(id, &tool, &profile)?;
                Some(RankedMatch {
                    id,
                    tool,
                    score,
                    reasons,
                    detail: options.explain.then_some(detail),
                })
            })
            .collect();

        let tie_break = options.rank.tie_break.clone();
        results.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| match &tie_break {
                TieBreak::Name => a.tool.name.cmp(&b.tool.name).then(a.id.cmp(&b.id)),
                TieBreak::None => Ordering::Equal,
                TieBreak::Comparator(comparator) => comparator.compare(&a.tool, &b.tool),
            })
        });

        paginate(results, options.offset, options.limit).collect()
    }
}

fn paginate<T>(
    items: Vec<T>,
    offset: usize,
    limit: Option<usize>,
) -> impl Iterator<Item = T> {
    items
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
}

fn shape_tool(tool: &Arc<Tool>, shape: ResultShape) -> ToolView {
    match shape {
        ResultShape::Tool => ToolView::Tool(Arc::clone(tool)),
        ResultShape::Name => ToolView::Name(tool.name.clone()),
        ResultShape::Config => ToolView::Config(ToolConfig {
            name: tool.name.clone(),
            description: tool.description.clone(),
            schema: tool.schema.clone(),
        }),
        ResultShape::Summary => ToolView::Summary(ToolSummary {
            name: tool.name.clone(),
            description: tool.description.clone(),
            tags: tool.tags.clone(),
        }),
    }
}

fn validate_page(limit: Option<usize>) -> Result<()> {
    if limit == Some(0) {
        return Err(SearchError::InvalidOptions(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_rank(rank: &RankOptions) -> Result<()> {
    if let Some(text) = &rank.text {
        validate_weighted_text(text)?;
    }
    Ok(())
}

fn validate_weighted_text(text: &WeightedText) -> Result<()> {
    if text.query.trim().is_empty() {
        return Err(SearchError::InvalidOptions(
            "rank text query must not be empty".to_string(),
        ));
    }
    validate_threshold("rank fuzzy threshold", text.fuzzy_threshold)
}

fn validate_criteria(criteria: &QueryCriteria) -> Result<()> {
    if let Some(text) = &criteria.text {
        validate_text_query(text)?;
    }

    for condition in &criteria.metadata {
        if let MetadataOp::Range {
            min: Some(min),
            max: Some(max),
        } = &condition.op
        {
            if min > max {
                return Err(SearchError::InvalidOptions(format!(
                    "metadata range for '{}' is inverted ({min} > {max})",
                    condition.key
                )));
            }
        }
    }

    for child in criteria.all.iter().chain(&criteria.any).chain(&criteria.not) {
        validate_criteria(child)?;
    }
    Ok(())
}

fn validate_text_query(text: &TextQuery) -> Result<()> {
    if text.query.trim().is_empty() {
        return Err(SearchError::InvalidOptions(
            "text query must not be empty".to_string(),
        ));
    }
    if let MatchMode::Fuzzy { threshold } = text.mode {
        validate_threshold("fuzzy threshold", threshold)?;
    }
    validate_threshold("semantic threshold", text.semantic_threshold)
}

fn validate_threshold(what: &str, threshold: f32) -> Result<()> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(SearchError::InvalidOptions(format!(
            "{what} must be within (0, 1], got {threshold}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::TagFilter;

    #[tokio::test]
    async fn malformed_options_are_rejected_up_front() {
        let catalog = Catalog::from_tools([Tool::new("a", "")]);
        let engine = SearchEngine::new(ToolIndex::build(&catalog, None).await);

        let bad_limit = QueryOptions {
            limit: Some(0),
            ..QueryOptions::default()
        };
        assert!(matches!(
            engine
                .query(&catalog, &QueryCriteria::new(), &bad_limit)
                .await,
            Err(SearchError::InvalidOptions(_))
        ));

        let bad_threshold = QueryCriteria::new()
            .text_query(TextQuery::new("x").mode(MatchMode::Fuzzy { threshold: 1.5 }));
        assert!(engine
            .query(&catalog, &bad_threshold, &QueryOptions::default())
            .await
            .is_err());

        let empty_text = QueryCriteria::new().text("   ");
        assert!(engine
            .query(&catalog, &empty_text, &QueryOptions::default())
            .await
            .is_err());

        let inverted_range = QueryCriteria::new().metadata(
            "n",
            MetadataOp::Range {
                min: Some(9.0),
                max: Some(1.0),
            },
        );
        assert!(engine
            .query(&catalog, &inverted_range, &QueryOptions::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn query_shapes_and_paginates() {
        let catalog = Catalog::from_tools([
            Tool::new("beta", "second").tag("x"),
            Tool::new("alpha", "first").tag("x"),
            Tool::new("gamma", "third").tag("x"),
        ]);
        let engine = SearchEngine::new(ToolIndex::build(&catalog, None).await);

        let criteria = QueryCriteria::new().tags(TagFilter::any(["x"]));
        let options = QueryOptions {
            limit: Some(2),
            offset: 1,
            shape: ResultShape::Name,
        };
        let views = engine.query(&catalog, &criteria, &options).await.unwrap();
        let names: Vec<_> = views.iter().map(ToolView::name).collect();
        assert_eq!(names, vec!["beta", "gamma"]);
    }

    #[tokio::test]
    async fn empty_criteria_return_every_tool() {
        let catalog = Catalog::from_tools([Tool::new("a", ""), Tool::new("b", "")]);
        let engine = SearchEngine::new(ToolIndex::build(&catalog, None).await);

        let views = engine
            .query(&catalog, &QueryCriteria::new(), &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(views.len(), 2);
    }

    #[tokio::test]
    async fn views_serialize_without_shape_wrappers() {
        let catalog = Catalog::from_tools([Tool::new("send-email", "Send an email").tag("comms")]);
        let engine = SearchEngine::new(ToolIndex::build(&catalog, None).await);

        let options = QueryOptions {
            shape: ResultShape::Summary,
            ..QueryOptions::default()
        };
        let views = engine
            .query(&catalog, &QueryCriteria::new(), &options)
            .await
            .unwrap();
        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["name"], "send-email");
        assert_eq!(json["tags"][0], "comms");
    }
}
