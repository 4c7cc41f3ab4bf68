use crate::cache::LookupCache;
use crate::inverted::InvertedIndex;
use crate::lsh::EmbeddingIndex;
use crate::text::TextIndex;
use std::sync::Arc;
use toolbelt_catalog::{Catalog, TextField, Tool, ToolId};
use toolbelt_embedder::{Embedder, MemoEmbedder};

/// Fields embedded per tool when an embedder is configured
pub(crate) const EMBEDDED_FIELDS: [TextField; 2] = [TextField::Name, TextField::Description];

/// All derived structures over a catalog
///
/// Mutations are synchronous with the catalog's own: the host serializes
/// register/unregister against queries (single-writer discipline), so no
/// internal locking is needed beyond the lookup cache's memoization.
pub struct ToolIndex {
    lookup: LookupCache,
    inverted: InvertedIndex,
    text: TextIndex,
    embeddings: Option<EmbeddingIndex>,
    embedder: Option<Arc<MemoEmbedder>>,
}

impl ToolIndex {
    /// Index without semantic search
    #[must_use]
    pub fn new() -> Self {
        Self {
            lookup: LookupCache::new(),
            inverted: InvertedIndex::new(),
            text: TextIndex::new(),
            embeddings: None,
            embedder: None,
        }
    }

    /// Index with an embedding backend; results are memoized by exact text
    #[must_use]
    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            lookup: LookupCache::new(),
            inverted: InvertedIndex::new(),
            text: TextIndex::new(),
            embeddings: Some(EmbeddingIndex::new()),
            embedder: Some(Arc::new(MemoEmbedder::new(embedder))),
        }
    }

    /// Build all derived structures for a catalog in one pass
    pub async fn build(catalog: &Catalog, embedder: Option<Arc<dyn Embedder>>) -> Self {
        let mut index = match embedder {
            Some(embedder) => Self::with_embedder(embedder),
            None => Self::new(),
        };
        index.populate(catalog).await;
        index
    }

    /// Wholesale rebuild after batch mutation
    pub async fn reindex(&mut self, catalog: &Catalog) {
        log::info!("Reindexing {} tools", catalog.len());
        self.lookup.clear();
        self.inverted.clear();
        self.text.clear();
        if let Some(embeddings) = self.embeddings.as_mut() {
            embeddings.clear();
        }
        self.populate(catalog).await;
    }

    async fn populate(&mut self, catalog: &Catalog) {
        for (id, tool) in catalog.iter() {
            self.add_tool(id, tool).await;
        }
        log::info!(
            "Index ready: {} tag buckets, {} embedded tools",
            self.inverted.tag_bucket_count(),
            self.embeddings
                .as_ref()
                .map_or(0, EmbeddingIndex::embedded_count)
        );
    }

    /// Incremental hook for the catalog's register
    pub async fn add_tool(&mut self, id: ToolId, tool: &Tool) {
        let profile = self.lookup.get_or_build(id, tool);
        self.inverted.insert_tool(id, &profile);
        self.text.insert_tool(id, tool);

        let (Some(embeddings), Some(embedder)) = (self.embeddings.as_mut(), &self.embedder)
        else {
            return;
        };

        let texts: Vec<(TextField, String)> = EMBEDDED_FIELDS
            .iter()
            .map(|field| (*field, field.texts_of(tool).join(" ")))
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();
        if texts.is_empty() {
            embeddings.mark_missing(id);
            return;
        }

        let batch: Vec<String> = texts.iter().map(|(_, text)| text.clone()).collect();
        match embedder.embed_cached(&batch).await {
            Ok(vectors) => {
                let field_vectors = texts
                    .iter()
                    .zip(vectors)
                    .map(|((field, _), vector)| (*field, vector.as_ref().clone()))
                    .collect();
                embeddings.insert_tool(id, field_vectors);
            }
            Err(err) => {
                // The tool stays reachable, it just earns no semantic score.
                log::debug!("Embedding failed for {id}: {err}");
                embeddings.mark_missing(id);
            }
        }
    }

    /// Incremental hook for the catalog's unregister
    pub fn remove_tool(&mut self, id: ToolId, tool: &Tool) {
        let profile = self.lookup.get_or_build(id, tool);
        self.inverted.remove_tool(id, &profile);
        self.text.remove_tool(id, tool);
        if let Some(embeddings) = self.embeddings.as_mut() {
            embeddings.remove_tool(id);
        }
        self.lookup.invalidate(id);
    }

    /// Embed query text; `None` when no embedder is configured or the
    /// backend fails (queries degrade, they do not error)
    pub async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed_one(text).await {
            Ok(vector) => Some(vector),
            Err(err) => {
                log::debug!("Query embedding failed: {err}");
                None
            }
        }
    }

    #[must_use]
    pub fn lookup(&self) -> &LookupCache {
        &self.lookup
    }

    #[must_use]
    pub fn inverted(&self) -> &InvertedIndex {
        &self.inverted
    }

    #[must_use]
    pub fn text(&self) -> &TextIndex {
        &self.text
    }

    #[must_use]
    pub fn embeddings(&self) -> Option<&EmbeddingIndex> {
        self.embeddings.as_ref()
    }

    #[must_use]
    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    #[must_use]
    pub fn embedder(&self) -> Option<&Arc<MemoEmbedder>> {
        self.embedder.as_ref()
    }
}

impl Default for ToolIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::MatchMode;
    use toolbelt_catalog::PropertyType;
    use toolbelt_embedder::HashEmbedder;

    fn sample_catalog() -> Catalog {
        Catalog::from_tools([
            Tool::new("send-email", "Send an email to a recipient")
                .tag("comms")
                .tag("email")
                .property("to", PropertyType::String),
            Tool::new("get-weather", "Daily forecast for a city")
                .tag("weather")
                .property("city", PropertyType::String),
        ])
    }

    #[tokio::test]
    async fn build_without_embedder_skips_embeddings() {
        let catalog = sample_catalog();
        let index = ToolIndex::build(&catalog, None).await;

        assert!(index.embeddings().is_none());
        assert!(!index.has_embedder());
        assert_eq!(index.inverted().tagged_any(&["comms".into()]).len(), 1);
    }

    #[tokio::test]
    async fn build_with_embedder_indexes_every_tool() {
        let catalog = sample_catalog();
        let index = ToolIndex::build(&catalog, Some(Arc::new(HashEmbedder::new(32)))).await;

        let embeddings = index.embeddings().unwrap();
        assert_eq!(embeddings.embedded_count(), 2);
        assert!(index.embed_query("weather").await.is_some());
    }

    #[tokio::test]
    async fn add_then_remove_round_trips_every_structure() {
        let mut catalog = sample_catalog();
        let mut index = ToolIndex::build(&catalog, Some(Arc::new(HashEmbedder::new(32)))).await;

        let id = catalog.register(Tool::new("post-chat", "Post a chat message").tag("comms"));
        let tool = Arc::clone(catalog.get(id).unwrap());
        index.add_tool(id, &tool).await;

        assert!(index.inverted().tagged_any(&["comms".into()]).contains(&id));
        assert!(index
            .text()
            .candidates(&[TextField::Name], &["chat".into()], MatchMode::Exact)
            .contains(&id));

        index.remove_tool(id, &tool);
        assert!(!index.inverted().tagged_any(&["comms".into()]).contains(&id));
        assert!(index
            .text()
            .candidates(&[TextField::Name], &["chat".into()], MatchMode::Exact)
            .is_empty());
        assert_eq!(index.embeddings().unwrap().embedded_count(), 2);
    }

    #[tokio::test]
    async fn reindex_matches_a_fresh_build() {
        let mut catalog = sample_catalog();
        let mut index = ToolIndex::build(&catalog, None).await;

        let id = catalog.register(Tool::new("translate", "Translate text").tag("nlp"));
        index.reindex(&catalog).await;

        let fresh = ToolIndex::build(&catalog, None).await;
        assert_eq!(
            index.inverted().tagged_any(&["nlp".into()]),
            fresh.inverted().tagged_any(&["nlp".into()])
        );
        assert!(index.inverted().tagged_any(&["nlp".into()]).contains(&id));
    }
}
