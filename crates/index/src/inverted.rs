use crate::cache::ToolProfile;
use std::collections::{HashMap, HashSet};
use toolbelt_catalog::ToolId;

/// Inverted tag and schema-key index
///
/// Buckets map a lowercase feature to the set of tools carrying it.
/// Empty buckets are pruned on removal so iteration never walks tombstones
/// and memory tracks live content.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    tags: HashMap<String, HashSet<ToolId>>,
    schema_keys: HashMap<String, HashSet<ToolId>>,
}

impl InvertedIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tool(&mut self, id: ToolId, profile: &ToolProfile) {
        for tag in &profile.tag_set {
            self.tags.entry(tag.clone()).or_default().insert(id);
        }
        for key in &profile.schema_key_set {
            self.schema_keys.entry(key.clone()).or_default().insert(id);
        }
    }

    pub fn remove_tool(&mut self, id: ToolId, profile: &ToolProfile) {
        for tag in &profile.tag_set {
            prune_bucket(&mut self.tags, tag, id);
        }
        for key in &profile.schema_key_set {
            prune_bucket(&mut self.schema_keys, key, id);
        }
    }

    /// Tools carrying at least one of the requested tags (union)
    #[must_use]
    pub fn tagged_any(&self, tags: &[String]) -> HashSet<ToolId> {
        let mut out = HashSet::new();
        for tag in tags {
            if let Some(bucket) = self.tags.get(&tag.to_lowercase()) {
                out.extend(bucket);
            }
        }
        out
    }

    /// Tools carrying every requested tag (intersection)
    ///
    /// Seeds from the first requested tag's bucket and short-circuits to
    /// empty as soon as any intersection step empties out.
    #[must_use]
    pub fn tagged_all(&self, tags: &[String]) -> HashSet<ToolId> {
        intersect_buckets(&self.tags, tags)
    }

    /// Tools whose schema declares every requested property name
    #[must_use]
    pub fn with_schema_keys(&self, keys: &[String]) -> HashSet<ToolId> {
        intersect_buckets(&self.schema_keys, keys)
    }

    /// Bucket for a single tag, if present
    #[must_use]
    pub fn tag_bucket(&self, tag: &str) -> Option<&HashSet<ToolId>> {
        self.tags.get(&tag.to_lowercase())
    }

    /// Number of live tag buckets
    #[must_use]
    pub fn tag_bucket_count(&self) -> usize {
        self.tags.len()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.schema_keys.clear();
    }
}

fn prune_bucket(buckets: &mut HashMap<String, HashSet<ToolId>>, key: &str, id: ToolId) {
    if let Some(bucket) = buckets.get_mut(key) {
        bucket.remove(&id);
        if bucket.is_empty() {
            buckets.remove(key);
        }
    }
}

fn intersect_buckets(
    buckets: &HashMap<String, HashSet<ToolId>>,
    keys: &[String],
) -> HashSet<ToolId> {
    let Some(first) = keys.first() else {
        return HashSet::new();
    };
    let Some(seed) = buckets.get(&first.to_lowercase()) else {
        return HashSet::new();
    };

    let mut out = seed.clone();
    for key in &keys[1..] {
        let Some(bucket) = buckets.get(&key.to_lowercase()) else {
            return HashSet::new();
        };
        out.retain(|id| bucket.contains(id));
        if out.is_empty() {
            return out;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbelt_catalog::{Catalog, PropertyType, Tool};

    fn profile(catalog: &Catalog, id: ToolId) -> ToolProfile {
        let cache = crate::cache::LookupCache::new();
        let tool = catalog.get(id).unwrap();
        cache.get_or_build(id, tool).as_ref().clone()
    }

    fn sample_catalog() -> (Catalog, ToolId, ToolId, ToolId) {
        let mut catalog = Catalog::new();
        let email = catalog.register(
            Tool::new("send-email", "")
                .tag("comms")
                .tag("email")
                .property("to", PropertyType::String),
        );
        let chat = catalog.register(Tool::new("post-chat", "").tag("comms").tag("chat"));
        let weather = catalog.register(
            Tool::new("get-weather", "")
                .tag("weather")
                .property("city", PropertyType::String),
        );
        (catalog, email, chat, weather)
    }

    fn build_index(catalog: &Catalog) -> InvertedIndex {
        let mut index = InvertedIndex::new();
        for (id, _) in catalog.iter() {
            index.insert_tool(id, &profile(catalog, id));
        }
        index
    }

    #[test]
    fn any_is_union_all_is_intersection() {
        let (catalog, email, chat, weather) = sample_catalog();
        let index = build_index(&catalog);

        let any = index.tagged_any(&["comms".into(), "weather".into()]);
        assert_eq!(
            any,
            HashSet::from([email, chat, weather])
        );

        let all = index.tagged_all(&["comms".into(), "email".into()]);
        assert_eq!(all, HashSet::from([email]));
    }

    #[test]
    fn all_short_circuits_on_unknown_tag() {
        let (catalog, ..) = sample_catalog();
        let index = build_index(&catalog);
        assert!(index
            .tagged_all(&["comms".into(), "no-such-tag".into()])
            .is_empty());
        assert!(index.tagged_all(&[]).is_empty());
    }

    #[test]
    fn schema_key_lookup_is_case_insensitive() {
        let (catalog, email, _, weather) = sample_catalog();
        let index = build_index(&catalog);

        assert_eq!(index.with_schema_keys(&["TO".into()]), HashSet::from([email]));
        assert_eq!(
            index.with_schema_keys(&["city".into()]),
            HashSet::from([weather])
        );
    }

    #[test]
    fn removal_prunes_empty_buckets() {
        let (catalog, email, chat, _) = sample_catalog();
        let mut index = build_index(&catalog);
        let before = index.tag_bucket_count();

        index.remove_tool(email, &profile(&catalog, email));
        assert!(index.tag_bucket("email").is_none(), "email bucket must be gone");
        assert_eq!(index.tag_bucket("comms").unwrap(), &HashSet::from([chat]));
        assert_eq!(index.tag_bucket_count(), before - 1);
    }

    #[test]
    fn remove_then_readd_restores_membership() {
        let (catalog, email, ..) = sample_catalog();
        let mut index = build_index(&catalog);
        let before = index.tagged_any(&["email".into()]);

        let p = profile(&catalog, email);
        index.remove_tool(email, &p);
        index.insert_tool(email, &p);

        assert_eq!(index.tagged_any(&["email".into()]), before);
    }
}
