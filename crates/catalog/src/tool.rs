use crate::metadata::MetadataValue;
use crate::schema::{PropertyType, ToolSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, described, schema-validated catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// Callable name, unique within a catalog
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Input schema: named properties with type descriptors
    #[serde(default)]
    pub schema: ToolSchema,

    /// Free-form tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Open metadata bag
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl Tool {
    /// Create a tool with a name and description
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: ToolSchema::default(),
            tags: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Builder: add a tag
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Builder: add tags
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Builder: declare an input property
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, kind: PropertyType) -> Self {
        self.schema.properties.insert(name.into(), kind);
        self
    }

    /// Builder: declare a required input property
    #[must_use]
    pub fn required_property(mut self, name: impl Into<String>, kind: PropertyType) -> Self {
        let name = name.into();
        self.schema.properties.insert(name.clone(), kind);
        self.schema.required.push(name);
        self
    }

    /// Builder: attach a metadata entry
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Schema property names in declaration order
    pub fn schema_keys(&self) -> impl Iterator<Item = &str> {
        self.schema.properties.keys().map(String::as_str)
    }

    /// Metadata keys in sorted order
    pub fn metadata_keys(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_collects_tags_schema_and_metadata() {
        let tool = Tool::new("send-email", "Send an email to a recipient")
            .tag("comms")
            .tag("email")
            .required_property("to", PropertyType::String)
            .property("subject", PropertyType::String)
            .meta("provider", "smtp");

        assert_eq!(tool.tags, vec!["comms", "email"]);
        assert_eq!(
            tool.schema_keys().collect::<Vec<_>>(),
            vec!["subject", "to"]
        );
        assert_eq!(tool.schema.required, vec!["to"]);
        assert_eq!(
            tool.metadata.get("provider").and_then(MetadataValue::as_str),
            Some("smtp")
        );
    }

    #[test]
    fn serde_round_trip_keeps_defaults() {
        let json = r#"{"name":"get-weather","description":"Daily forecast"}"#;
        let tool: Tool = serde_json::from_str(json).unwrap();
        assert!(tool.tags.is_empty());
        assert!(tool.schema.properties.is_empty());
        assert!(tool.metadata.is_empty());
    }
}
