use crate::criteria::DEFAULT_FUZZY_THRESHOLD;
use crate::relevance::field_relevance;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use toolbelt_catalog::{TextField, Tool, ToolId};
use toolbelt_index::{tokenize, ToolIndex, ToolProfile};

/// Relative weight of each queryable field in the text channel
#[must_use]
pub const fn field_weight(field: TextField) -> f64 {
    match field {
        TextField::Name => 1.0,
        TextField::Tags => 0.9,
        TextField::Description => 0.8,
        TextField::SchemaKeys => 0.5,
        TextField::MetadataKeys => 0.3,
    }
}

/// Caller-supplied scoring callback
pub trait ToolRanker: Send + Sync {
    fn rank(&self, tool: &Tool) -> RankDirective;
}

impl<F> ToolRanker for F
where
    F: Fn(&Tool) -> RankDirective + Send + Sync,
{
    fn rank(&self, tool: &Tool) -> RankDirective {
        self(tool)
    }
}

/// What a custom ranker may do to a tool's score
pub enum RankDirective {
    /// Add to the accumulated score
    Delta(f64),
    /// Full control: replace or drop, with explanation
    Detailed(RankAdjustment),
}

#[derive(Default)]
pub struct RankAdjustment {
    pub score: f64,
    pub reasons: Vec<String>,
    pub matches: Vec<String>,
    /// Replace the accumulated score instead of adding to it
    pub override_score: bool,
    /// Drop the tool from the results entirely
    pub exclude: bool,
}

/// Caller-supplied tie comparator
pub trait ToolComparator: Send + Sync {
    fn compare(&self, a: &Tool, b: &Tool) -> Ordering;
}

impl<F> ToolComparator for F
where
    F: Fn(&Tool, &Tool) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &Tool, b: &Tool) -> Ordering {
        self(a, b)
    }
}

/// How equal scores are ordered
#[derive(Clone, Default)]
pub enum TieBreak {
    /// Ascending tool name
    #[default]
    Name,
    /// Leave ties unordered
    None,
    /// Caller comparator
    Comparator(Arc<dyn ToolComparator>),
}

/// Text query that contributes to scoring (as opposed to filtering)
#[derive(Clone, Debug)]
pub struct WeightedText {
    pub query: String,
    pub weight: f64,
    /// Fields to score; `None` means all queryable fields
    pub fields: Option<Vec<TextField>>,
    pub fuzzy_threshold: f32,
}

impl WeightedText {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            weight: 1.0,
            fields: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    #[must_use]
    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn resolved_fields(&self) -> Vec<TextField> {
        self.fields
            .clone()
            .unwrap_or_else(|| TextField::ALL.to_vec())
    }
}

/// Ranking controls for a search call
#[derive(Clone)]
pub struct RankOptions {
    /// Tags that earn the base weight when present on a tool
    pub preferred_tags: Vec<String>,
    /// Base score per distinct matched preferred/boosted tag
    pub tag_weight: f64,
    /// Extra score per specific tag, on top of the base weight
    pub tag_boosts: HashMap<String, f64>,
    /// Weighted free-text relevance
    pub text: Option<WeightedText>,
    /// Custom scoring callback
    pub ranker: Option<Arc<dyn ToolRanker>>,
    pub tie_break: TieBreak,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            preferred_tags: Vec::new(),
            tag_weight: 1.0,
            tag_boosts: HashMap::new(),
            text: None,
            ranker: None,
            tie_break: TieBreak::default(),
        }
    }
}

impl RankOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn prefer_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.preferred_tags
            .extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn boost_tag(mut self, tag: impl Into<String>, boost: f64) -> Self {
        self.tag_boosts.insert(tag.into(), boost);
        self
    }

    #[must_use]
    pub fn text(mut self, text: WeightedText) -> Self {
        self.text = Some(text);
        self
    }

    #[must_use]
    pub fn ranker(mut self, ranker: Arc<dyn ToolRanker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    #[must_use]
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }
}

/// Per-channel score breakdown, attached to results when `explain` is on
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchDetail {
    pub tag_score: f64,
    pub text_score: f64,
    pub semantic_score: f64,
    pub custom_score: f64,
    pub matched_tags: Vec<String>,
    pub matched_fields: Vec<FieldScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldScore {
    pub field: TextField,
    pub relevance: f64,
}

/// One ranked result
#[derive(Clone)]
pub struct RankedMatch {
    pub id: ToolId,
    pub tool: Arc<Tool>,
    pub score: f64,
    pub reasons: Vec<String>,
    pub detail: Option<MatchDetail>,
}

impl std::fmt::Debug for RankedMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankedMatch")
            .field("tool", &self.tool.name)
            .field("score", &self.score)
            .field("reasons", &self.reasons)
            .finish()
    }
}

/// Precomputed per-query ranking state
pub(crate) struct RankContext<'a> {
    index: &'a ToolIndex,
    options: &'a RankOptions,
    /// Distinct lowercase tag -> per-tag score (base + boost)
    tag_weights: Vec<(String, f64)>,
    text_tokens: Vec<String>,
    text_fields: Vec<TextField>,
    query_vector: Option<Vec<f32>>,
}

impl<'a> RankContext<'a> {
    pub(crate) fn new(
        index: &'a ToolIndex,
        options: &'a RankOptions,
        query_vector: Option<Vec<f32>>,
    ) -> Self {
        // Union of preferred and boosted tags, deduplicated so the same
        // tag can never score twice.
        let mut tag_weights: Vec<(String, f64)> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let boosts_lower: HashMap<String, f64> = options
            .tag_boosts
            .iter()
            .map(|(tag, boost)| (tag.to_lowercase(), *boost))
            .collect();
        let mut boosted_tags: Vec<String> = boosts_lower.keys().cloned().collect();
        boosted_tags.sort_unstable();
        for tag in options
            .preferred_tags
            .iter()
            .map(|tag| tag.to_lowercase())
            .chain(boosted_tags)
        {
            if seen.insert(tag.clone()) {
                let boost = boosts_lower.get(&tag).copied().unwrap_or(0.0);
                tag_weights.push((tag, options.tag_weight + boost));
            }
        }

        let (text_tokens, text_fields) = match &options.text {
            Some(text) => (tokenize(&text.query), text.resolved_fields()),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            index,
            options,
            tag_weights,
            text_tokens,
            text_fields,
            query_vector,
        }
    }

    pub(crate) fn has_custom_ranker(&self) -> bool {
        self.options.ranker.is_some()
    }

    /// Channel scores without explanation strings; cheap enough to run
    /// over every candidate on the top-K path
    pub(crate) fn score_only(&self, id: ToolId, tool: &Tool, profile: &ToolProfile) -> f64 {
        let (tag, _) = self.tag_channel(profile, false);
        let (text, semantic, _) = self.text_channel(id, tool, false);
        tag + text + semantic
    }

    /// Full scoring: channels, custom callback, reasons, breakdown.
    /// Returns `None` when the custom ranker excludes the tool.
    pub(crate) fn score_detailed(
        &self,
        id: ToolId,
        tool: &Tool,
        profile: &ToolProfile,
    ) -> Option<(f64, Vec<String>, MatchDetail)> {
        let mut reasons = Vec::new();

        let (tag_score, matched_tags) = self.tag_channel(profile, true);
        for tag in &matched_tags {
            reasons.push(format!("tag:{tag}"));
        }

        let (text_score, semantic_score, matched_fields) = self.text_channel(id, tool, true);
        for field_score in &matched_fields {
            reasons.push(format!("text:{}", field_score.field.as_str()));
        }
        if semantic_score > 0.0 {
            reasons.push("semantic".to_string());
        }

        let mut score = tag_score + text_score + semantic_score;
        let mut custom_score = 0.0;
        if let Some(ranker) = &self.options.ranker {
            match ranker.rank(tool) {
                RankDirective::Delta(delta) => {
                    custom_score = delta;
                    score += delta;
                }
                RankDirective::Detailed(adjustment) => {
                    if adjustment.exclude {
                        return None;
                    }
                    custom_score = adjustment.score;
                    if adjustment.override_score {
                        score = adjustment.score;
                    } else {
                        score += adjustment.score;
                    }
                    reasons.extend(adjustment.reasons);
                    reasons.extend(
                        adjustment
                            .matches
                            .into_iter()
                            .map(|matched| format!("match:{matched}")),
                    );
                }
            }
        }

        let detail = MatchDetail {
            tag_score,
            text_score,
            semantic_score,
            custom_score,
            matched_tags,
            matched_fields,
        };
        Some((score, reasons, detail))
    }

    fn tag_channel(&self, profile: &ToolProfile, collect: bool) -> (f64, Vec<String>) {
        let mut score = 0.0;
        let mut matched = Vec::new();
        for (tag, weight) in &self.tag_weights {
            if profile.has_tag(tag) {
                score += weight;
                if collect {
                    matched.push(tag.clone());
                }
            }
        }
        (score, matched)
    }

    /// Lexical and semantic text scores: best field wins each
    fn text_channel(
        &self,
        id: ToolId,
        tool: &Tool,
        collect: bool,
    ) -> (f64, f64, Vec<FieldScore>) {
        let Some(text) = &self.options.text else {
            return (0.0, 0.0, Vec::new());
        };

        let mut best_lexical = 0.0_f64;
        let mut matched_fields = Vec::new();
        for field in &self.text_fields {
            let relevance =
                field_relevance(&self.text_tokens, &field.texts_of(tool), text.fuzzy_threshold);
            if relevance <= 0.0 {
                continue;
            }
            if collect {
                matched_fields.push(FieldScore {
                    field: *field,
                    relevance,
                });
            }
            best_lexical = best_lexical.max(relevance * field_weight(*field));
        }

        let mut semantic = 0.0;
        if let (Some(embeddings), Some(vector)) = (self.index.embeddings(), &self.query_vector) {
            if let Some((field, similarity)) =
                embeddings.best_similarity(id, vector, &self.text_fields)
            {
                // Negative cosine means "unrelated", not "penalize".
                semantic = f64::from(similarity.max(0.0)) * field_weight(field) * text.weight;
            }
        }

        (best_lexical * text.weight, semantic, matched_fields)
    }
}
