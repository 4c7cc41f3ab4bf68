use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named-property input schema for a tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    /// Property name -> type descriptor
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyType>,

    /// Names of required properties
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Check whether a property is declared (case-sensitive)
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Number of declared properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Type descriptor for a schema property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl PropertyType {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_lookup() {
        let mut schema = ToolSchema::default();
        schema
            .properties
            .insert("city".to_string(), PropertyType::String);

        assert!(schema.has_property("city"));
        assert!(!schema.has_property("City"));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn property_type_serde_uses_lowercase() {
        let json = serde_json::to_string(&PropertyType::Integer).unwrap();
        assert_eq!(json, r#""integer""#);
        let back: PropertyType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PropertyType::Integer);
    }
}
