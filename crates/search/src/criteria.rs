use std::sync::Arc;
use toolbelt_catalog::{MetadataValue, TextField, Tool};
use toolbelt_index::MatchMode;

/// Default similarity threshold for fuzzy text criteria
pub const DEFAULT_FUZZY_THRESHOLD: f32 = 0.6;

/// Default cosine threshold for accepting a semantic-only text match
pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.7;

/// Fallible caller-supplied predicate over a whole tool
///
/// An `Err` counts as non-match for that tool only; it never aborts the
/// query.
pub trait ToolPredicate: Send + Sync {
    fn evaluate(&self, tool: &Tool) -> anyhow::Result<bool>;
}

impl<F> ToolPredicate for F
where
    F: Fn(&Tool) -> anyhow::Result<bool> + Send + Sync,
{
    fn evaluate(&self, tool: &Tool) -> anyhow::Result<bool> {
        self(tool)
    }
}

/// Fallible caller-supplied predicate over a metadata value
pub trait MetadataPredicate: Send + Sync {
    fn evaluate(&self, value: &MetadataValue) -> anyhow::Result<bool>;
}

impl<F> MetadataPredicate for F
where
    F: Fn(&MetadataValue) -> anyhow::Result<bool> + Send + Sync,
{
    fn evaluate(&self, value: &MetadataValue) -> anyhow::Result<bool> {
        self(value)
    }
}

/// Tag criteria; all present parts must hold
#[derive(Clone, Debug, Default)]
pub struct TagFilter {
    /// At least one of these tags
    pub any: Vec<String>,
    /// Every one of these tags
    pub all: Vec<String>,
    /// None of these tags
    pub none: Vec<String>,
}

impl TagFilter {
    pub fn any(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            any: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn all(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            all: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn none(tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            none: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.any.is_empty() && self.all.is_empty() && self.none.is_empty()
    }
}

/// Schema-shape criterion: every listed property must be declared
#[derive(Clone, Debug, Default)]
pub struct SchemaFilter {
    pub keys: Vec<String>,
}

impl SchemaFilter {
    pub fn keys(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

/// One condition against the open metadata bag
#[derive(Clone)]
pub struct MetadataCondition {
    pub key: String,
    pub op: MetadataOp,
}

impl MetadataCondition {
    pub fn new(key: impl Into<String>, op: MetadataOp) -> Self {
        Self {
            key: key.into(),
            op,
        }
    }
}

/// Operator over a metadata value
#[derive(Clone)]
pub enum MetadataOp {
    /// Equality, widening Int/Float to a shared numeric comparison
    Eq(MetadataValue),
    /// Substring (strings) or membership (lists), case-insensitive
    Contains(String),
    /// Prefix match on strings, case-insensitive
    StartsWith(String),
    /// Inclusive numeric range; either bound may be open
    Range { min: Option<f64>, max: Option<f64> },
    /// Caller-supplied check; `Err` counts as non-match
    Predicate(Arc<dyn MetadataPredicate>),
}

/// Free-text criterion
#[derive(Clone, Debug)]
pub struct TextQuery {
    pub query: String,
    /// Fields to search; `None` means all queryable fields
    pub fields: Option<Vec<TextField>>,
    pub mode: MatchMode,
    /// Cosine level at which a semantic hit alone satisfies the criterion
    pub semantic_threshold: f32,
}

impl TextQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fields: None,
            mode: MatchMode::Fuzzy {
                threshold: DEFAULT_FUZZY_THRESHOLD,
            },
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = TextField>) -> Self {
        self.fields = Some(fields.into_iter().collect());
        self
    }

    /// Fields to search, defaulting to every queryable field
    #[must_use]
    pub fn resolved_fields(&self) -> Vec<TextField> {
        self.fields
            .clone()
            .unwrap_or_else(|| TextField::ALL.to_vec())
    }
}

/// Recursive boolean criteria tree
///
/// Leaf filters set on one node are implicitly ANDed with each other and
/// with the `all` children. `any` children are ORed; `not` children
/// exclude tools matching any of them.
#[derive(Clone, Default)]
pub struct QueryCriteria {
    pub tags: Option<TagFilter>,
    pub schema: Option<SchemaFilter>,
    pub metadata: Vec<MetadataCondition>,
    pub text: Option<TextQuery>,
    pub predicate: Option<Arc<dyn ToolPredicate>>,
    pub all: Vec<QueryCriteria>,
    pub any: Vec<QueryCriteria>,
    pub not: Vec<QueryCriteria>,
}

impl QueryCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tags(mut self, filter: TagFilter) -> Self {
        self.tags = Some(filter);
        self
    }

    #[must_use]
    pub fn tags_any(self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.merge_tags(|filter| filter.any.extend(tags.into_iter().map(Into::into)))
    }

    #[must_use]
    pub fn tags_all(self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.merge_tags(|filter| filter.all.extend(tags.into_iter().map(Into::into)))
    }

    #[must_use]
    pub fn tags_none(self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.merge_tags(|filter| filter.none.extend(tags.into_iter().map(Into::into)))
    }

    fn merge_tags(mut self, apply: impl FnOnce(&mut TagFilter)) -> Self {
        let mut filter = self.tags.take().unwrap_or_default();
        apply(&mut filter);
        self.tags = Some(filter);
        self
    }

    #[must_use]
    pub fn schema_keys(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.schema = Some(SchemaFilter::keys(keys));
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, op: MetadataOp) -> Self {
        self.metadata.push(MetadataCondition::new(key, op));
        self
    }

    #[must_use]
    pub fn text(mut self, query: impl Into<String>) -> Self {
        self.text = Some(TextQuery::new(query));
        self
    }

    #[must_use]
    pub fn text_query(mut self, query: TextQuery) -> Self {
        self.text = Some(query);
        self
    }

    #[must_use]
    pub fn predicate(mut self, predicate: Arc<dyn ToolPredicate>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn and(mut self, child: QueryCriteria) -> Self {
        self.all.push(child);
        self
    }

    #[must_use]
    pub fn or(mut self, child: QueryCriteria) -> Self {
        self.any.push(child);
        self
    }

    #[must_use]
    pub fn not(mut self, child: QueryCriteria) -> Self {
        self.not.push(child);
        self
    }

    /// True when no criterion is set anywhere in the tree
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.as_ref().map_or(true, TagFilter::is_empty)
            && self.schema.is_none()
            && self.metadata.is_empty()
            && self.text.is_none()
            && self.predicate.is_none()
            && self.all.iter().all(Self::is_empty)
            && self.any.is_empty()
            && self.not.is_empty()
    }

    /// Every text query in the tree, for up-front embedding
    pub(crate) fn collect_text_queries<'a>(&'a self, out: &mut Vec<&'a TextQuery>) {
        if let Some(text) = &self.text {
            out.push(text);
        }
        for child in self.all.iter().chain(&self.any).chain(&self.not) {
            child.collect_text_queries(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_merges_tag_parts() {
        let criteria = QueryCriteria::new()
            .tags_any(["comms"])
            .tags_all(["email"])
            .tags_none(["deprecated"]);

        let tags = criteria.tags.unwrap();
        assert_eq!(tags.any, vec!["comms"]);
        assert_eq!(tags.all, vec!["email"]);
        assert_eq!(tags.none, vec!["deprecated"]);
    }

    #[test]
    fn empty_detection_walks_the_tree() {
        assert!(QueryCriteria::new().is_empty());
        assert!(QueryCriteria::new().and(QueryCriteria::new()).is_empty());
        assert!(!QueryCriteria::new().text("weather").is_empty());
        assert!(!QueryCriteria::new()
            .or(QueryCriteria::new().tags_any(["a"]))
            .is_empty());
    }

    #[test]
    fn text_queries_are_collected_from_nested_nodes() {
        let criteria = QueryCriteria::new()
            .text("outer")
            .or(QueryCriteria::new().text("inner"))
            .not(QueryCriteria::new().text("negated"));

        let mut queries = Vec::new();
        criteria.collect_text_queries(&mut queries);
        let texts: Vec<_> = queries.iter().map(|q| q.query.as_str()).collect();
        assert_eq!(texts, vec!["outer", "inner", "negated"]);
    }
}
