//! Metadata filters restricting vector store search and delete operations.
//!
//! A [`Filter`] is a small predicate tree over string metadata. It is
//! evaluated locally by [`InMemoryVectorStore`](crate::InMemoryVectorStore)
//! and rendered to the Data API filter language by the Astra backend.
//!
//! # Example
//!
//! ```rust
//! use astra_rag::Filter;
//!
//! let filter = Filter::eq("document_id", "doc-1").and(Filter::eq("document_format", "text"));
//! assert!(filter.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::document::Metadata;
use crate::error::{RagError, Result};

/// A predicate over record metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// `field == value`
    Eq { field: String, value: String },
    /// `field != value` (records without the field also match)
    Ne { field: String, value: String },
    /// `field` is one of `values`
    In { field: String, values: Vec<String> },
    /// `field` is none of `values`
    NotIn { field: String, values: Vec<String> },
    /// `field` is present
    Exists { field: String },
    /// Every sub-filter matches
    And(Vec<Filter>),
    /// At least one sub-filter matches
    Or(Vec<Filter>),
}

impl Filter {
    /// Match records whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq { field: field.into(), value: value.into() }
    }

    /// Match records whose `field` differs from `value`.
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Ne { field: field.into(), value: value.into() }
    }

    /// Match records whose `field` is one of `values`.
    pub fn is_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In { field: field.into(), values: values.into_iter().map(Into::into).collect() }
    }

    /// Match records whose `field` is none of `values`.
    pub fn not_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NotIn { field: field.into(), values: values.into_iter().map(Into::into).collect() }
    }

    /// Match records that carry `field`.
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists { field: field.into() }
    }

    /// Combine with another filter; both must match.
    ///
    /// Nested `And`s are flattened.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            this => Self::And(vec![this, other]),
        }
    }

    /// Combine with another filter; either may match.
    pub fn or(self, other: Filter) -> Self {
        match self {
            Self::Or(mut filters) => {
                filters.push(other);
                Self::Or(filters)
            }
            this => Self::Or(vec![this, other]),
        }
    }

    /// Check the filter is well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidFilter`] if a field name is empty, is the
    /// record key `_id`, or starts with `$` (reserved by the Data API), if an
    /// `In`/`NotIn` list is empty, or if an `And`/`Or` has no operands.
    /// Records are removed by id through
    /// [`VectorStore::delete_by_ids`](crate::VectorStore::delete_by_ids).
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Eq { field, .. } | Self::Ne { field, .. } | Self::Exists { field } => {
                validate_field(field)
            }
            Self::In { field, values } | Self::NotIn { field, values } => {
                validate_field(field)?;
                if values.is_empty() {
                    return Err(RagError::InvalidFilter(format!(
                        "value list for field '{field}' must not be empty"
                    )));
                }
                Ok(())
            }
            Self::And(filters) | Self::Or(filters) => {
                if filters.is_empty() {
                    return Err(RagError::InvalidFilter(
                        "logical operator requires at least one operand".to_string(),
                    ));
                }
                filters.iter().try_for_each(Filter::validate)
            }
        }
    }

    /// Evaluate the filter against a metadata map.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Self::Eq { field, value } => metadata.get(field) == Some(value),
            Self::Ne { field, value } => metadata.get(field) != Some(value),
            Self::In { field, values } => metadata.get(field).is_some_and(|v| values.contains(v)),
            Self::NotIn { field, values } => {
                metadata.get(field).is_none_or(|v| !values.contains(v))
            }
            Self::Exists { field } => metadata.contains_key(field),
            Self::And(filters) => filters.iter().all(|f| f.matches(metadata)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(metadata)),
        }
    }

    /// Render the filter in the Data API JSON filter language.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Eq { field, value } => single(field, json!(value)),
            Self::Ne { field, value } => single(field, json!({ "$ne": value })),
            Self::In { field, values } => single(field, json!({ "$in": values })),
            Self::NotIn { field, values } => single(field, json!({ "$nin": values })),
            Self::Exists { field } => single(field, json!({ "$exists": true })),
            Self::And(filters) => {
                json!({ "$and": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Self::Or(filters) => {
                json!({ "$or": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
        }
    }
}

fn validate_field(field: &str) -> Result<()> {
    if field.trim().is_empty() {
        return Err(RagError::InvalidFilter("field name must not be empty".to_string()));
    }
    if field.starts_with('$') || field == "_id" {
        return Err(RagError::InvalidFilter(format!("field name '{field}' is reserved")));
    }
    Ok(())
}

fn single(field: &str, condition: Value) -> Value {
    let mut map = Map::new();
    map.insert(field.to_string(), condition);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, &str)]) -> Metadata {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn eq_renders_as_plain_field_match() {
        let filter = Filter::eq("document_id", "42");
        assert_eq!(filter.to_json(), json!({ "document_id": "42" }));
    }

    #[test]
    fn and_flattens_and_renders_operands() {
        let filter = Filter::eq("a", "1").and(Filter::ne("b", "2")).and(Filter::exists("c"));
        assert_eq!(
            filter.to_json(),
            json!({ "$and": [
                { "a": "1" },
                { "b": { "$ne": "2" } },
                { "c": { "$exists": true } },
            ]})
        );
    }

    #[test]
    fn matches_evaluates_every_operator() {
        let meta = metadata(&[("document_id", "d1"), ("document_format", "text")]);

        assert!(Filter::eq("document_id", "d1").matches(&meta));
        assert!(!Filter::eq("document_id", "d2").matches(&meta));
        assert!(Filter::ne("document_id", "d2").matches(&meta));
        assert!(Filter::ne("missing", "x").matches(&meta));
        assert!(Filter::is_in("document_id", ["d0", "d1"]).matches(&meta));
        assert!(!Filter::not_in("document_id", ["d1"]).matches(&meta));
        assert!(Filter::not_in("missing", ["d1"]).matches(&meta));
        assert!(Filter::exists("document_format").matches(&meta));
        assert!(
            Filter::eq("document_id", "x").or(Filter::exists("document_format")).matches(&meta)
        );
        assert!(!Filter::eq("document_id", "d1").and(Filter::exists("nope")).matches(&meta));
    }

    #[test]
    fn validate_rejects_malformed_filters() {
        assert!(matches!(Filter::eq("", "x").validate(), Err(RagError::InvalidFilter(_))));
        assert!(matches!(Filter::eq("$vector", "x").validate(), Err(RagError::InvalidFilter(_))));
        assert!(matches!(Filter::eq("_id", "r1").validate(), Err(RagError::InvalidFilter(_))));
        assert!(matches!(
            Filter::is_in("a", Vec::<String>::new()).validate(),
            Err(RagError::InvalidFilter(_))
        ));
        assert!(matches!(Filter::And(vec![]).validate(), Err(RagError::InvalidFilter(_))));
        assert!(matches!(
            Filter::Or(vec![Filter::exists(" ")]).validate(),
            Err(RagError::InvalidFilter(_))
        ));
        assert!(Filter::eq("document_id", "d1").validate().is_ok());
    }
}
