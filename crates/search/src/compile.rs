use crate::criteria::{MetadataOp, QueryCriteria, TextQuery};
use crate::relevance::token_matches;
use std::collections::{HashMap, HashSet};
use toolbelt_catalog::{Tool, ToolId};
use toolbelt_index::{tokenize, ToolIndex, ToolProfile};

/// Query-scoped evaluation state: embeddings computed once per distinct
/// text query, shared by narrowing and the predicate pass
#[derive(Default)]
pub(crate) struct EvalContext {
    pub vectors: HashMap<String, Vec<f32>>,
}

impl EvalContext {
    /// Embed every text query in the tree through the index's embedder
    pub(crate) async fn for_criteria(index: &ToolIndex, criteria: &QueryCriteria) -> Self {
        let mut queries = Vec::new();
        criteria.collect_text_queries(&mut queries);

        let mut ctx = Self::default();
        for text in queries {
            ctx.embed(index, &text.query).await;
        }
        ctx
    }

    pub(crate) async fn embed(&mut self, index: &ToolIndex, query: &str) {
        if self.vectors.contains_key(query) {
            return;
        }
        if let Some(vector) = index.embed_query(query).await {
            self.vectors.insert(query.to_string(), vector);
        }
    }

    pub(crate) fn vector(&self, query: &str) -> Option<&[f32]> {
        self.vectors.get(query).map(Vec::as_slice)
    }
}

/// Index-based candidate narrowing
///
/// Returns `None` when the tree carries no indexable criterion, meaning
/// "consider every tool". Indices are a performance aid only: every
/// surviving candidate is still re-checked by [`matches`].
pub(crate) fn narrow(
    index: &ToolIndex,
    criteria: &QueryCriteria,
    ctx: &EvalContext,
) -> Option<HashSet<ToolId>> {
    let mut narrowed: Option<HashSet<ToolId>> = None;

    let mut intersect = |set: HashSet<ToolId>| {
        narrowed = Some(match narrowed.take() {
            None => set,
            Some(mut acc) => {
                acc.retain(|id| set.contains(id));
                acc
            }
        });
    };

    if let Some(tags) = &criteria.tags {
        // `none` cannot be narrowed from an inverted index; it stays a
        // post-filter.
        if !tags.any.is_empty() {
            intersect(index.inverted().tagged_any(&tags.any));
        }
        if !tags.all.is_empty() {
            intersect(index.inverted().tagged_all(&tags.all));
        }
    }

    if let Some(schema) = &criteria.schema {
        if !schema.keys.is_empty() {
            intersect(index.inverted().with_schema_keys(&schema.keys));
        }
    }

    if let Some(text) = &criteria.text {
        intersect(text_candidates(index, text, ctx));
    }

    for child in &criteria.all {
        if let Some(set) = narrow(index, child, ctx) {
            intersect(set);
        }
    }

    if !criteria.any.is_empty() {
        let mut union = HashSet::new();
        let mut narrowable = true;
        for child in &criteria.any {
            match narrow(index, child, ctx) {
                Some(set) => union.extend(set),
                // One un-narrowable branch widens the whole OR.
                None => {
                    narrowable = false;
                    break;
                }
            }
        }
        if narrowable {
            intersect(union);
        }
    }

    narrowed
}

/// Text candidates: text-index hits unioned with LSH band-bucket hits
/// (plus the embedding-less `missing` set) when an embedder is active
fn text_candidates(index: &ToolIndex, text: &TextQuery, ctx: &EvalContext) -> HashSet<ToolId> {
    let fields = text.resolved_fields();
    let tokens = tokenize(&text.query);
    let mut out = index.text().candidates(&fields, &tokens, text.mode);

    if let (Some(embeddings), Some(vector)) = (index.embeddings(), ctx.vector(&text.query)) {
        out.extend(embeddings.candidates(vector, &fields));
    }
    out
}

/// Authoritative criteria check for one tool
///
/// All present leaf filters and `all` children must hold, at least one
/// `any` child (when present), and no `not` child. Caller-supplied
/// predicate errors count as non-match for this tool only.
pub(crate) fn matches(
    index: &ToolIndex,
    id: ToolId,
    tool: &Tool,
    profile: &ToolProfile,
    criteria: &QueryCriteria,
    ctx: &EvalContext,
) -> bool {
    if let Some(tags) = &criteria.tags {
        if !tags.any.is_empty()
            && !tags.any.iter().any(|tag| profile.has_tag(&tag.to_lowercase()))
        {
            return false;
        }
        if !tags
            .all
            .iter()
            .all(|tag| profile.has_tag(&tag.to_lowercase()))
        {
            return false;
        }
        if tags
            .none
            .iter()
            .any(|tag| profile.has_tag(&tag.to_lowercase()))
        {
            return false;
        }
    }

    if let Some(schema) = &criteria.schema {
        if !schema
            .keys
            .iter()
            .all(|key| profile.has_schema_key(&key.to_lowercase()))
        {
            return false;
        }
    }

    for condition in &criteria.metadata {
        let Some(value) = tool.metadata.get(&condition.key) else {
            return false;
        };
        let holds = match &condition.op {
            MetadataOp::Eq(expected) => value.loosely_equals(expected),
            MetadataOp::Contains(needle) => value.contains(needle),
            MetadataOp::StartsWith(prefix) => value.starts_with(prefix),
            MetadataOp::Range { min, max } => value.in_range(*min, *max),
            MetadataOp::Predicate(predicate) => match predicate.evaluate(value) {
                Ok(result) => result,
                Err(err) => {
                    log::debug!("Metadata predicate failed for {id}: {err}");
                    false
                }
            },
        };
        if !holds {
            return false;
        }
    }

    if let Some(text) = &criteria.text {
        if !text_matches(index, id, tool, text, ctx) {
            return false;
        }
    }

    if let Some(predicate) = &criteria.predicate {
        match predicate.evaluate(tool) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                log::debug!("Tool predicate failed for {id}: {err}");
                return false;
            }
        }
    }

    if !criteria
        .all
        .iter()
        .all(|child| matches(index, id, tool, profile, child, ctx))
    {
        return false;
    }

    if !criteria.any.is_empty()
        && !criteria
            .any
            .iter()
            .any(|child| matches(index, id, tool, profile, child, ctx))
    {
        return false;
    }

    if criteria
        .not
        .iter()
        .any(|child| matches(index, id, tool, profile, child, ctx))
    {
        return false;
    }

    true
}

/// Text criterion: every query token matches some requested field under
/// the mode, or the best-field cosine clears the semantic threshold
fn text_matches(
    index: &ToolIndex,
    id: ToolId,
    tool: &Tool,
    text: &TextQuery,
    ctx: &EvalContext,
) -> bool {
    let fields = text.resolved_fields();
    let tokens = tokenize(&text.query);

    let lexical = !tokens.is_empty()
        && tokens.iter().all(|token| {
            fields
                .iter()
                .any(|field| token_matches(token, &field.texts_of(tool), text.mode))
        });
    if lexical {
        return true;
    }

    if let (Some(embeddings), Some(vector)) = (index.embeddings(), ctx.vector(&text.query)) {
        if let Some((_, similarity)) = embeddings.best_similarity(id, vector, &fields) {
            return similarity >= text.semantic_threshold;
        }
    }
    false
}
