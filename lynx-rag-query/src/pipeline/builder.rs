//! Fluent construction of [`RagPipeline`].

use std::sync::Arc;
use std::time::Duration;

use lynx_rag_core::Result;
use lynx_rag_core::config::PipelineSettings;
use lynx_rag_core::traits::{
    DocumentRefiner, DocumentRetriever, QueryAugmenter, QueryExpander, QueryTransformer,
};

use super::{RagPipeline, RagPipelineConfig};

/// Pipeline builder.
#[derive(Debug, Default)]
pub struct RagPipelineBuilder {
    config: RagPipelineConfig,
}

impl RagPipelineBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a query transformer.
    #[must_use]
    pub fn add_transformer(self, transformer: impl QueryTransformer + 'static) -> Self {
        self.add_transformer_arc(Arc::new(transformer))
    }

    /// Appends a query transformer (Arc version).
    #[must_use]
    pub fn add_transformer_arc(mut self, transformer: Arc<dyn QueryTransformer>) -> Self {
        self.config.transformers.push(transformer);
        self
    }

    /// Sets the query expander.
    #[must_use]
    pub fn with_expander(self, expander: impl QueryExpander + 'static) -> Self {
        self.with_expander_arc(Arc::new(expander))
    }

    /// Sets the query expander (Arc version).
    #[must_use]
    pub fn with_expander_arc(mut self, expander: Arc<dyn QueryExpander>) -> Self {
        self.config.expander = Some(expander);
        self
    }

    /// Adds a document retriever.
    #[must_use]
    pub fn add_retriever(self, retriever: impl DocumentRetriever + 'static) -> Self {
        self.add_retriever_arc(Arc::new(retriever))
    }

    /// Adds a document retriever (Arc version).
    #[must_use]
    pub fn add_retriever_arc(mut self, retriever: Arc<dyn DocumentRetriever>) -> Self {
        self.config.retrievers.push(retriever);
        self
    }

    /// Appends a document refiner.
    #[must_use]
    pub fn add_refiner(self, refiner: impl DocumentRefiner + 'static) -> Self {
        self.add_refiner_arc(Arc::new(refiner))
    }

    /// Appends a document refiner (Arc version).
    #[must_use]
    pub fn add_refiner_arc(mut self, refiner: Arc<dyn DocumentRefiner>) -> Self {
        self.config.refiners.push(refiner);
        self
    }

    /// Sets the query augmenter.
    #[must_use]
    pub fn with_augmenter(self, augmenter: impl QueryAugmenter + 'static) -> Self {
        self.with_augmenter_arc(Arc::new(augmenter))
    }

    /// Sets the query augmenter (Arc version).
    #[must_use]
    pub fn with_augmenter_arc(mut self, augmenter: Arc<dyn QueryAugmenter>) -> Self {
        self.config.augmenter = Some(augmenter);
        self
    }

    /// Replaces the orchestrator settings.
    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Caps the number of concurrent retrievals.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.settings.max_concurrency = Some(max_concurrency);
        self
    }

    /// Bounds each execution by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.settings = self.config.settings.with_timeout(timeout);
        self
    }

    /// The configuration collected so far.
    #[must_use]
    pub fn into_config(self) -> RagPipelineConfig {
        self.config
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no retriever was added or the
    /// settings are invalid.
    pub fn build(self) -> Result<RagPipeline> {
        RagPipeline::new(self.config)
    }
}
