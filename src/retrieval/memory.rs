use crate::retrieval::store::{Exemplar, ExemplarStore, StoreError, StoreQuery};
use async_trait::async_trait;
use std::sync::Mutex;

/// Fixed in-memory exemplar store.
///
/// Returns its exemplars in insertion order, filtered by category and
/// truncated to the requested count. Query text is recorded but not ranked
/// against; tests use it to assert what the pipeline asked for.
pub struct StaticExemplarStore {
    exemplars: Vec<Exemplar>,
    failure: Option<StoreError>,
    queries: Mutex<Vec<StoreQuery>>,
}

impl StaticExemplarStore {
    pub fn new(exemplars: Vec<Exemplar>) -> Self {
        Self {
            exemplars,
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A store whose every query fails with `error`.
    pub fn failing(error: StoreError) -> Self {
        Self {
            failure: Some(error),
            ..Self::empty()
        }
    }

    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }

    /// Queries received so far, oldest first.
    pub fn recorded_queries(&self) -> Vec<StoreQuery> {
        self.queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExemplarStore for StaticExemplarStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Exemplar>, StoreError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let results = self
            .exemplars
            .iter()
            .filter(|exemplar| match &query.category {
                Some(category) => exemplar.category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .take(query.n_results)
            .cloned()
            .collect();

        Ok(results)
    }

    fn name(&self) -> &str {
        "static"
    }
}
