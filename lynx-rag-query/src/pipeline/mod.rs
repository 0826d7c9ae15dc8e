//! The retrieval-augmented generation pipeline.
//!
//! A [`RagPipeline`] runs five stages in order:
//!
//! 1. **Transform**: the query flows through the transformer chain
//! 2. **Expand**: the expander turns it into one or more sub-queries
//! 3. **Retrieve**: every retriever runs against every sub-query concurrently
//! 4. **Refine**: the refiner chain reshapes the documents, using the original query
//! 5. **Augment**: the augmenter injects the documents into the original query
//!
//! Every stage is fail-fast except retrieval, which succeeds as long as one
//! retriever call succeeds.

mod builder;
mod retrieval;
pub mod state;

pub use builder::RagPipelineBuilder;
pub use state::PipelineState;

use std::sync::Arc;

use lynx_rag_core::config::PipelineSettings;
use lynx_rag_core::traits::{
    DocumentRefiner, DocumentRetriever, QueryAugmenter, QueryExpander, QueryTransformer,
};
use lynx_rag_core::{Document, ExecutionContext, Query, RagError, Result, Stage, noop};
use tracing::{debug, info, instrument};

/// Components and settings of a pipeline.
#[derive(Debug, Clone, Default)]
pub struct RagPipelineConfig {
    /// Ordered query transformers. May be empty.
    pub transformers: Vec<Arc<dyn QueryTransformer>>,
    /// Query expander. Defaults to the no-op stage.
    pub expander: Option<Arc<dyn QueryExpander>>,
    /// Document retrievers. At least one is required.
    pub retrievers: Vec<Arc<dyn DocumentRetriever>>,
    /// Ordered document refiners. May be empty.
    pub refiners: Vec<Arc<dyn DocumentRefiner>>,
    /// Query augmenter. Defaults to the no-op stage.
    pub augmenter: Option<Arc<dyn QueryAugmenter>>,
    /// Orchestrator settings.
    pub settings: PipelineSettings,
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// The augmented query to hand to the chat model.
    pub query: Query,
    /// The refined documents the augmented query was built from.
    pub documents: Vec<Document>,
}

/// A configured, reusable pipeline.
///
/// The pipeline holds no per-run state, so one instance can serve many
/// concurrent executions.
///
/// # Examples
///
/// ```rust,no_run
/// use lynx_rag_core::{ExecutionContext, noop};
/// use lynx_rag_query::RagPipeline;
///
/// # async fn example() -> lynx_rag_core::Result<()> {
/// let pipeline = RagPipeline::builder()
///     .add_retriever_arc(noop())
///     .build()?;
///
/// let output = pipeline.run(&ExecutionContext::new(), "What is RAG?").await?;
/// println!("{} documents", output.documents.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RagPipeline {
    transformers: Vec<Arc<dyn QueryTransformer>>,
    expander: Arc<dyn QueryExpander>,
    retrievers: Vec<Arc<dyn DocumentRetriever>>,
    refiners: Vec<Arc<dyn DocumentRefiner>>,
    augmenter: Arc<dyn QueryAugmenter>,
    settings: PipelineSettings,
}

impl RagPipeline {
    /// Creates a pipeline using the builder pattern.
    #[must_use]
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::new()
    }

    /// Build a pipeline from an optional configuration record.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `config` is `None` or invalid.
    pub fn from_config(config: Option<RagPipelineConfig>) -> Result<Self> {
        let config =
            config.ok_or_else(|| RagError::configuration("pipeline configuration is required"))?;
        Self::new(config)
    }

    /// Build a pipeline from a configuration record.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no retriever is configured or the
    /// settings are invalid.
    pub fn new(config: RagPipelineConfig) -> Result<Self> {
        if config.retrievers.is_empty() {
            return Err(RagError::configuration(
                "at least one document retriever is required",
            ));
        }
        config.settings.validate()?;

        let expander: Arc<dyn QueryExpander> = match config.expander {
            Some(expander) => expander,
            None => noop(),
        };
        let augmenter: Arc<dyn QueryAugmenter> = match config.augmenter {
            Some(augmenter) => augmenter,
            None => noop(),
        };

        info!(
            transformers = config.transformers.len(),
            expander = expander.name(),
            retrievers = config.retrievers.len(),
            refiners = config.refiners.len(),
            augmenter = augmenter.name(),
            "Built RAG pipeline"
        );

        Ok(Self {
            transformers: config.transformers,
            expander,
            retrievers: config.retrievers,
            refiners: config.refiners,
            augmenter,
            settings: config.settings,
        })
    }

    /// Orchestrator settings.
    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Number of configured retrievers.
    #[must_use]
    pub fn retriever_count(&self) -> usize {
        self.retrievers.len()
    }

    /// Build a query from `text` and execute the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] for empty text, otherwise as
    /// [`execute`](Self::execute).
    pub async fn run(&self, ctx: &ExecutionContext, text: &str) -> Result<PipelineOutput> {
        let query = Query::new(text)?;
        self.execute(ctx, &query).await
    }

    /// Execute the pipeline for `query`.
    ///
    /// `query` is never modified. On failure no partial output is returned;
    /// the error is a [`RagError::Stage`] naming the failing stage.
    #[instrument(skip(self, ctx, query), fields(query_len = query.text().len()))]
    pub async fn execute(&self, ctx: &ExecutionContext, query: &Query) -> Result<PipelineOutput> {
        let scoped = self
            .settings
            .timeout()
            .map(|timeout| ctx.child().with_timeout(timeout));
        let ctx = scoped.as_ref().unwrap_or(ctx);

        let mut state = PipelineState::Init;
        match self.run_stages(ctx, query, &mut state).await {
            Ok(output) => {
                state.advance(PipelineState::Done)?;
                info!(
                    documents = output.documents.len(),
                    "Pipeline execution completed"
                );
                Ok(output)
            }
            Err(error) => {
                state.fail()?;
                debug!(%error, "Pipeline execution failed");
                Err(error)
            }
        }
    }

    async fn run_stages(
        &self,
        ctx: &ExecutionContext,
        original: &Query,
        state: &mut PipelineState,
    ) -> Result<PipelineOutput> {
        let transformed = self.transform(ctx, original).await?;
        state.advance(PipelineState::Transformed)?;

        let queries = self.expand(ctx, &transformed).await?;
        state.advance(PipelineState::Expanded)?;

        let documents = self.retrieve(ctx, &queries).await?;
        state.advance(PipelineState::Retrieved)?;

        let documents = self.refine(ctx, original, documents).await?;
        state.advance(PipelineState::Refined)?;

        let query = self.augment(ctx, original, &documents).await?;
        state.advance(PipelineState::Augmented)?;

        Ok(PipelineOutput { query, documents })
    }

    async fn transform(&self, ctx: &ExecutionContext, query: &Query) -> Result<Query> {
        ctx.check().map_err(tag(Stage::Transform, None))?;

        let mut current = query.clone();
        for (index, transformer) in self.transformers.iter().enumerate() {
            debug!(transformer = transformer.name(), index, "Transforming query");
            current = ctx
                .run(transformer.transform(ctx, &current))
                .await
                .map_err(tag(Stage::Transform, Some(index)))?;
        }
        Ok(current)
    }

    async fn expand(&self, ctx: &ExecutionContext, query: &Query) -> Result<Vec<Query>> {
        let expanded = ctx
            .run(self.expander.expand(ctx, query))
            .await
            .map_err(tag(Stage::Expand, None))?;

        if expanded.is_empty() {
            debug!(
                expander = self.expander.name(),
                "Expander returned no queries, using the input query"
            );
            return Ok(vec![query.clone()]);
        }

        debug!(count = expanded.len(), "Expanded query");
        Ok(expanded)
    }

    async fn retrieve(&self, ctx: &ExecutionContext, queries: &[Query]) -> Result<Vec<Document>> {
        ctx.check().map_err(tag(Stage::Retrieve, None))?;
        retrieval::fan_out(ctx, queries, &self.retrievers, self.settings.max_concurrency)
            .await
            .map_err(tag(Stage::Retrieve, None))
    }

    async fn refine(
        &self,
        ctx: &ExecutionContext,
        original: &Query,
        documents: Vec<Document>,
    ) -> Result<Vec<Document>> {
        ctx.check().map_err(tag(Stage::Refine, None))?;

        let mut current = documents;
        for (index, refiner) in self.refiners.iter().enumerate() {
            debug!(
                refiner = refiner.name(),
                index,
                input = current.len(),
                "Refining documents"
            );
            current = ctx
                .run(refiner.refine(ctx, original, &current))
                .await
                .map_err(tag(Stage::Refine, Some(index)))?;
        }
        Ok(current)
    }

    async fn augment(
        &self,
        ctx: &ExecutionContext,
        original: &Query,
        documents: &[Document],
    ) -> Result<Query> {
        ctx.run(self.augmenter.augment(ctx, original, documents))
            .await
            .map_err(tag(Stage::Augment, None))
    }
}

fn tag(stage: Stage, index: Option<usize>) -> impl FnOnce(RagError) -> RagError {
    move |source| RagError::at_stage(stage, index, source)
}
