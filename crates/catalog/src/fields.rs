use crate::tool::Tool;
use serde::{Deserialize, Serialize};

/// Queryable text field of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    Name,
    Description,
    Tags,
    SchemaKeys,
    MetadataKeys,
}

impl TextField {
    /// All queryable fields, in default ranking order
    pub const ALL: [TextField; 5] = [
        Self::Name,
        Self::Tags,
        Self::Description,
        Self::SchemaKeys,
        Self::MetadataKeys,
    ];

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Tags => "tags",
            Self::SchemaKeys => "schemaKeys",
            Self::MetadataKeys => "metadataKeys",
        }
    }

    /// Raw content of this field, one string per constituent value
    #[must_use]
    pub fn texts_of(self, tool: &Tool) -> Vec<String> {
        match self {
            Self::Name => vec![tool.name.clone()],
            Self::Description => vec![tool.description.clone()],
            Self::Tags => tool.tags.clone(),
            Self::SchemaKeys => tool.schema_keys().map(str::to_string).collect(),
            Self::MetadataKeys => tool.metadata_keys().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyType;

    #[test]
    fn texts_cover_every_field() {
        let tool = Tool::new("send-email", "Send an email")
            .tag("comms")
            .property("to", PropertyType::String)
            .meta("provider", "smtp");

        assert_eq!(TextField::Name.texts_of(&tool), vec!["send-email"]);
        assert_eq!(TextField::Description.texts_of(&tool), vec!["Send an email"]);
        assert_eq!(TextField::Tags.texts_of(&tool), vec!["comms"]);
        assert_eq!(TextField::SchemaKeys.texts_of(&tool), vec!["to"]);
        assert_eq!(TextField::MetadataKeys.texts_of(&tool), vec!["provider"]);
    }
}
