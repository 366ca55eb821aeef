use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One retrieved code example with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Exemplar {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    pub code: String,
    /// Similarity distance reported by the store; lower is closer
    pub distance: Option<f64>,
}

impl Exemplar {
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}

/// Similarity query sent to an exemplar store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub text: String,
    pub n_results: usize,
    /// Restricts results to one exemplar category when set
    pub category: Option<String>,
}

impl StoreQuery {
    pub fn new(text: impl Into<String>, n_results: usize) -> Self {
        Self {
            text: text.into(),
            n_results,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    #[error("Store query timed out after {seconds}s")]
    TimeoutError { seconds: u64 },

    #[error("Store API error ({status_code}): {message}")]
    ApiError { message: String, status_code: u16 },

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Invalid store response: {0}")]
    InvalidResponse(String),

    #[error("Store configuration error: {0}")]
    ConfigurationError(String),
}

/// Semantic store of code exemplars
#[async_trait]
pub trait ExemplarStore: Send + Sync {
    /// Ranked exemplars for the query; an empty list is a valid answer.
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Exemplar>, StoreError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exemplar_builder() {
        let exemplar = Exemplar::new("ex-1", "print('hi')")
            .with_title("Box")
            .with_tags(["box", "extrude"])
            .with_parameter("width", json!(50))
            .with_distance(0.25);

        assert_eq!(exemplar.title.as_deref(), Some("Box"));
        assert_eq!(exemplar.tags, vec!["box", "extrude"]);
        assert_eq!(exemplar.parameters["width"], json!(50));
        assert_eq!(exemplar.distance, Some(0.25));
        assert!(exemplar.description.is_none());
    }

    #[test]
    fn test_store_query_category() {
        let query = StoreQuery::new("block length", 5).with_category("solids");
        assert_eq!(query.n_results, 5);
        assert_eq!(query.category.as_deref(), Some("solids"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::ApiError {
            message: "boom".to_string(),
            status_code: 500,
        };
        assert_eq!(err.to_string(), "Store API error (500): boom");
        assert_eq!(
            StoreError::TimeoutError { seconds: 5 }.to_string(),
            "Store query timed out after 5s"
        );
    }
}
