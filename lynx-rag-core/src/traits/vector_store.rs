//! Similarity search interface consumed by the vector-store retriever.

use async_trait::async_trait;

use crate::{Document, FilterExpr, RagError, Result};

/// Lowest similarity score a vector store may return.
pub const MIN_SIMILARITY_SCORE: f64 = 0.0;

/// Highest similarity score a vector store may return.
pub const MAX_SIMILARITY_SCORE: f64 = 1.0;

/// Number of documents requested when no `top_k` is configured.
pub const DEFAULT_TOP_K: usize = 4;

/// A similarity search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Query text to embed and search for.
    pub query: String,
    /// Maximum number of documents to return.
    pub top_k: usize,
    /// Minimum similarity score, in `[MIN_SIMILARITY_SCORE, MAX_SIMILARITY_SCORE]`.
    pub min_score: f64,
    /// Optional metadata filter.
    pub filter: Option<FilterExpr>,
}

impl SearchRequest {
    /// Create a request with default `top_k`, no score threshold and no filter.
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            min_score: MIN_SIMILARITY_SCORE,
            filter: None,
        }
    }

    /// Set `top_k`. Zero selects [`DEFAULT_TOP_K`].
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = if top_k == 0 { DEFAULT_TOP_K } else { top_k };
        self
    }

    /// Set the minimum similarity score.
    #[must_use]
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Set the metadata filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Option<FilterExpr>) -> Self {
        self.filter = filter;
        self
    }

    /// Check that the score threshold lies in the closed similarity range.
    pub fn validate(&self) -> Result<()> {
        validate_min_score(self.min_score)
    }
}

/// Fail with a configuration error if `min_score` lies outside the similarity range.
pub fn validate_min_score(min_score: f64) -> Result<()> {
    if (MIN_SIMILARITY_SCORE..=MAX_SIMILARITY_SCORE).contains(&min_score) {
        Ok(())
    } else {
        Err(RagError::configuration(format!(
            "min_score must be between {MIN_SIMILARITY_SCORE} and {MAX_SIMILARITY_SCORE}, got {min_score}"
        )))
    }
}

/// A store that answers similarity searches over embedded documents.
#[async_trait]
pub trait VectorStore: Send + Sync + std::fmt::Debug {
    /// Return up to `request.top_k` documents scoring at least `request.min_score`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStore`] when the backing store fails.
    async fn similarity_search(&self, request: &SearchRequest) -> Result<Vec<Document>>;

    /// Get a human-readable name for this store.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
