use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use toolbelt_catalog::{Tool, ToolId};

/// Memoized normalized views of a tool
///
/// Holds only derived strings, never the tool itself, so a cache entry
/// cannot extend a tool's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolProfile {
    /// Tags lowercased, original order, duplicates kept
    pub tags_lower: Vec<String>,
    /// Distinct lowercase tags
    pub tag_set: HashSet<String>,
    /// Schema property names lowercased
    pub schema_keys_lower: Vec<String>,
    /// Distinct lowercase schema property names
    pub schema_key_set: HashSet<String>,
}

impl ToolProfile {
    fn build(tool: &Tool) -> Self {
        let tags_lower: Vec<String> = tool.tags.iter().map(|t| t.to_lowercase()).collect();
        let tag_set = tags_lower.iter().cloned().collect();
        let schema_keys_lower: Vec<String> =
            tool.schema_keys().map(str::to_lowercase).collect();
        let schema_key_set = schema_keys_lower.iter().cloned().collect();

        Self {
            tags_lower,
            tag_set,
            schema_keys_lower,
            schema_key_set,
        }
    }

    #[must_use]
    pub fn has_tag(&self, tag_lower: &str) -> bool {
        self.tag_set.contains(tag_lower)
    }

    #[must_use]
    pub fn has_schema_key(&self, key_lower: &str) -> bool {
        self.schema_key_set.contains(key_lower)
    }
}

/// Lazily built per-tool profile cache, invalidated only explicitly
#[derive(Debug, Default)]
pub struct LookupCache {
    entries: Mutex<HashMap<ToolId, Arc<ToolProfile>>>,
}

impl LookupCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized profile, computing it on first access
    pub fn get_or_build(&self, id: ToolId, tool: &Tool) -> Arc<ToolProfile> {
        let mut entries = self.entries.lock().expect("lookup cache poisoned");
        Arc::clone(
            entries
                .entry(id)
                .or_insert_with(|| Arc::new(ToolProfile::build(tool))),
        )
    }

    /// Drop one entry; the next access recomputes it
    pub fn invalidate(&self, id: ToolId) {
        self.entries
            .lock()
            .expect("lookup cache poisoned")
            .remove(&id);
    }

    /// Drop all entries (full reindex)
    pub fn clear(&self) {
        self.entries.lock().expect("lookup cache poisoned").clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("lookup cache poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use toolbelt_catalog::{Catalog, PropertyType};

    #[test]
    fn profile_normalizes_tags_and_schema_keys() {
        let tool = Tool::new("send-email", "")
            .tag("Comms")
            .tag("EMAIL")
            .tag("comms")
            .property("To", PropertyType::String);
        let profile = ToolProfile::build(&tool);

        assert_eq!(profile.tags_lower, vec!["comms", "email", "comms"]);
        assert_eq!(profile.tag_set.len(), 2);
        assert!(profile.has_tag("email"));
        assert!(!profile.has_tag("EMAIL"));
        assert!(profile.has_schema_key("to"));
    }

    #[test]
    fn cache_memoizes_until_invalidated() {
        let mut catalog = Catalog::new();
        let id = catalog.register(Tool::new("a", "").tag("x"));
        let tool = Arc::clone(catalog.get(id).unwrap());

        let cache = LookupCache::new();
        let first = cache.get_or_build(id, &tool);
        let second = cache.get_or_build(id, &tool);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.invalidate(id);
        assert!(cache.is_empty());
        let third = cache.get_or_build(id, &tool);
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
