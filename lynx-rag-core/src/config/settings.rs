//! Settings records for the pipeline and its built-in stages.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::traits::{DEFAULT_TOP_K, MIN_SIMILARITY_SCORE, validate_min_score};
use crate::{RagError, Result};

/// Orchestrator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Upper bound on concurrent retrievals. `None` runs every
    /// `(sub-query, retriever)` pair at once.
    pub max_concurrency: Option<usize>,

    /// Overall time limit for one execution, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl PipelineSettings {
    /// Cap the number of concurrent retrievals.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    /// Set the execution time limit.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The execution time limit, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == Some(0) {
            return Err(RagError::configuration(
                "max_concurrency must be greater than 0",
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(RagError::configuration("timeout_ms must be greater than 0"));
        }
        Ok(())
    }
}

/// Vector-store retriever settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverSettings {
    /// Number of documents to request. Zero selects the default.
    pub top_k: usize,

    /// Minimum similarity score, between 0.0 and 1.0 inclusive.
    pub min_score: f64,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: MIN_SIMILARITY_SCORE,
        }
    }
}

impl RetrieverSettings {
    /// Set `top_k`.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the similarity threshold.
    #[must_use]
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// `top_k` with zero replaced by the default.
    #[must_use]
    pub fn effective_top_k(&self) -> usize {
        if self.top_k == 0 {
            DEFAULT_TOP_K
        } else {
            self.top_k
        }
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        validate_min_score(self.min_score)
    }
}

/// Multi-query expander settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderSettings {
    /// Number of variants to ask the model for.
    pub number_of_queries: usize,

    /// Whether the original query leads the expanded list.
    pub include_original: bool,
}

impl Default for ExpanderSettings {
    fn default() -> Self {
        Self {
            number_of_queries: 3,
            include_original: false,
        }
    }
}

impl ExpanderSettings {
    /// Set the number of variants.
    #[must_use]
    pub fn with_number_of_queries(mut self, number_of_queries: usize) -> Self {
        self.number_of_queries = number_of_queries;
        self
    }

    /// Keep the original query in the expanded list.
    #[must_use]
    pub fn with_include_original(mut self, include_original: bool) -> Self {
        self.include_original = include_original;
        self
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.number_of_queries == 0 {
            return Err(RagError::configuration(
                "number_of_queries must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Contextual augmenter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmenterSettings {
    /// When `true`, an empty document set leaves the query untouched.
    /// When `false`, the model is told that no context was found.
    pub allow_empty_context: bool,
}

impl AugmenterSettings {
    /// Set the empty-context policy.
    #[must_use]
    pub fn with_allow_empty_context(mut self, allow_empty_context: bool) -> Self {
        self.allow_empty_context = allow_empty_context;
        self
    }
}

/// All runtime settings, as loaded from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Orchestrator settings.
    pub pipeline: PipelineSettings,
    /// Vector-store retriever settings.
    pub retriever: RetrieverSettings,
    /// Multi-query expander settings.
    pub expander: ExpanderSettings,
    /// Contextual augmenter settings.
    pub augmenter: AugmenterSettings,
}

impl RagSettings {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.retriever.validate()?;
        self.expander.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RagSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.retriever.top_k, DEFAULT_TOP_K);
        assert_eq!(settings.expander.number_of_queries, 3);
        assert!(!settings.augmenter.allow_empty_context);
        assert!(settings.pipeline.timeout().is_none());
    }

    #[test]
    fn test_zero_top_k_means_default() {
        let settings = RetrieverSettings::default().with_top_k(0);
        assert_eq!(settings.effective_top_k(), DEFAULT_TOP_K);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(RetrieverSettings::default().with_min_score(1.01).validate().is_err());
        assert!(ExpanderSettings::default().with_number_of_queries(0).validate().is_err());
        assert!(PipelineSettings::default().with_max_concurrency(0).validate().is_err());
    }

    #[test]
    fn test_timeout_round_trip() {
        let settings = PipelineSettings::default().with_timeout(Duration::from_millis(1500));
        assert_eq!(settings.timeout_ms, Some(1500));
        assert_eq!(settings.timeout(), Some(Duration::from_millis(1500)));
    }
}
