use serde::{Deserialize, Serialize};

/// Tagged metadata value with typed accessors per operator
///
/// The metadata bag is open-ended; filters act on it through the typed
/// accessors below rather than dynamic type checks at call sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view; integers widen to f64
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[MetadataValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// `contains` operator: substring for strings, membership for lists
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Self::Str(s) => s.to_lowercase().contains(&needle.to_lowercase()),
            Self::List(items) => items.iter().any(|item| {
                item.as_str()
                    .is_some_and(|s| s.eq_ignore_ascii_case(needle))
            }),
            _ => false,
        }
    }

    /// `startsWith` operator: strings only
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        match self {
            Self::Str(s) => s.to_lowercase().starts_with(&prefix.to_lowercase()),
            _ => false,
        }
    }

    /// `range` operator: numeric values only, bounds inclusive
    #[must_use]
    pub fn in_range(&self, min: Option<f64>, max: Option<f64>) -> bool {
        let Some(value) = self.as_f64() else {
            return false;
        };
        min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
    }

    /// Equality that widens Int/Float to a shared numeric comparison
    #[must_use]
    pub fn loosely_equals(&self, other: &MetadataValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Convert from a JSON value; objects and nulls have no metadata form
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            serde_json::Value::String(s) => Some(Self::Str(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            serde_json::Value::Null | serde_json::Value::Object(_) => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        assert_eq!(MetadataValue::from("smtp").as_str(), Some("smtp"));
        assert_eq!(MetadataValue::from(3_i64).as_f64(), Some(3.0));
        assert_eq!(MetadataValue::from(2.5).as_f64(), Some(2.5));
        assert_eq!(MetadataValue::from(true).as_bool(), Some(true));
        assert!(MetadataValue::from("x").as_f64().is_none());
    }

    #[test]
    fn contains_checks_strings_and_lists() {
        assert!(MetadataValue::from("Mail Provider").contains("provider"));
        let list = MetadataValue::List(vec!["a".into(), "b".into()]);
        assert!(list.contains("B"));
        assert!(!list.contains("c"));
    }

    #[test]
    fn range_is_inclusive_and_numeric_only() {
        let v = MetadataValue::from(5_i64);
        assert!(v.in_range(Some(5.0), Some(5.0)));
        assert!(v.in_range(None, Some(10.0)));
        assert!(!v.in_range(Some(6.0), None));
        assert!(!MetadataValue::from("5").in_range(Some(0.0), Some(10.0)));
    }

    #[test]
    fn loose_equality_widens_numbers() {
        assert!(MetadataValue::Int(2).loosely_equals(&MetadataValue::Float(2.0)));
        assert!(!MetadataValue::Int(2).loosely_equals(&MetadataValue::Str("2".into())));
    }

    #[test]
    fn from_json_maps_scalars_and_arrays() {
        let json: serde_json::Value = serde_json::json!(["x", 1, true]);
        let value = MetadataValue::from_json(&json).unwrap();
        assert_eq!(value.as_list().unwrap().len(), 3);
        assert!(MetadataValue::from_json(&serde_json::json!(null)).is_none());
        assert!(MetadataValue::from_json(&serde_json::json!({"k": 1})).is_none());
    }
}
