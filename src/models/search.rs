use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

/// Indexed document field a query can target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    #[default]
    Description,
}

impl SearchField {
    pub const ALL: [SearchField; 2] = [SearchField::Name, SearchField::Description];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Description => "description",
        }
    }
}

impl Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the index matches the term
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// `semantic` query against semantic_text fields
    #[default]
    Semantic,
    /// Classic full-text `match` query
    Match,
}

/// Query derived from the group's shared interest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    pub field: Option<SearchField>,
    pub term: String,
}

impl SearchQuery {
    /// Builds a query, rejecting blank terms
    pub fn new(field: Option<SearchField>, term: impl Into<String>) -> AppResult<Self> {
        let term = term.into().trim().to_string();
        if term.is_empty() {
            return Err(AppError::InvalidInput(
                "Search term cannot be empty".to_string(),
            ));
        }
        Ok(Self { field, term })
    }

    /// Field to match against; description when the model named none
    pub fn effective_field(&self) -> SearchField {
        self.field.unwrap_or_default()
    }
}

/// A raw hit as the index returned it
///
/// Fields are optional because source documents are not validated at ingest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IndexHit {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl IndexHit {
    /// Reads name/description from an index `_source` document. Non-string values count as absent.
    pub fn from_source(source: &serde_json::Value) -> Self {
        let text = |key: &str| {
            source
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };

        Self {
            name: text("name"),
            description: text("description"),
        }
    }
}

/// A destination or event returned to the group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationHit {
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_field_serialization() {
        assert_eq!(serde_json::to_string(&SearchField::Name).unwrap(), "\"name\"");
        let field: SearchField = serde_json::from_str("\"description\"").unwrap();
        assert_eq!(field, SearchField::Description);
        assert!(serde_json::from_str::<SearchField>("\"location\"").is_err());
    }

    #[test]
    fn test_query_rejects_blank_term() {
        assert!(SearchQuery::new(None, "  ").is_err());
    }

    #[test]
    fn test_query_defaults_to_description() {
        let query = SearchQuery::new(None, "beach").unwrap();
        assert_eq!(query.effective_field(), SearchField::Description);

        let query = SearchQuery::new(Some(SearchField::Name), "Bali").unwrap();
        assert_eq!(query.effective_field(), SearchField::Name);
    }

    #[test]
    fn test_index_hit_from_source() {
        let hit = IndexHit::from_source(&json!({
            "name": "Bali",
            "description": "Island beaches",
            "country": "Indonesia"
        }));
        assert_eq!(hit.name.as_deref(), Some("Bali"));
        assert_eq!(hit.description.as_deref(), Some("Island beaches"));
    }

    #[test]
    fn test_index_hit_non_string_name_is_absent() {
        let hit = IndexHit::from_source(&json!({ "name": 42, "description": "x" }));
        assert_eq!(hit.name, None);
    }
}
