//! Pipeline orchestration and built-in stages for the Lynx RAG runtime.
//!
//! This crate turns the stage traits of `lynx-rag-core` into a working
//! retrieval-augmented generation pipeline. It includes:
//!
//! - **Pipeline**: [`RagPipeline`], its builder and its execution state machine
//! - **Transformers**: compression, rewrite and translation of the user query
//! - **Expanders**: LLM-driven multi-query expansion
//! - **Retrievers**: vector-store similarity search with metadata filters
//! - **Refiners**: deduplication, ranking and similarity cutoff
//! - **Augmenters**: context injection into the final prompt
//! - **Middleware**: [`RagMiddleware`], which splices the pipeline into chat calls
//! - **LLM adapter**: [`SiumaiChatModel`] over a `siumai` client
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lynx_rag_core::prelude::*;
//! use lynx_rag_query::prelude::*;
//!
//! # async fn example(store: Arc<dyn VectorStore>, model: Arc<dyn ChatModel>) -> Result<()> {
//! let pipeline = RagPipeline::builder()
//!     .add_transformer(RewriteQueryTransformer::new(Arc::clone(&model))?)
//!     .with_expander(MultiQueryExpander::new(model)?)
//!     .add_retriever(VectorStoreDocumentRetriever::new(store))
//!     .add_refiner(DeduplicationRefiner::new())
//!     .add_refiner(RankRefiner::new(5))
//!     .with_augmenter(ContextualQueryAugmenter::new()?)
//!     .build()?;
//!
//! let output = pipeline.run(&ExecutionContext::new(), "What is ownership?").await?;
//! println!("{}", output.query.text());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Query → Transformers → Expander → Retrievers (concurrent) → Refiners → Augmenter
//!   └───────────── original query ─────────────────────────────┴───────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod augmenters;
mod completion;
pub mod expanders;
pub mod llm;
pub mod middleware;
pub mod pipeline;
pub mod refiners;
pub mod retrievers;
pub mod transformers;

pub use llm::SiumaiChatModel;
pub use middleware::{RagChatHandler, RagMiddleware, RagStreamHandler};
pub use pipeline::{
    PipelineOutput, PipelineState, RagPipeline, RagPipelineBuilder, RagPipelineConfig,
};

/// Re-export commonly used types and traits.
pub mod prelude {
    pub use crate::augmenters::{ContextualQueryAugmenter, DocumentFormatter};
    pub use crate::expanders::MultiQueryExpander;
    pub use crate::llm::SiumaiChatModel;
    pub use crate::middleware::{RagChatHandler, RagMiddleware, RagStreamHandler};
    pub use crate::pipeline::{
        PipelineOutput, PipelineState, RagPipeline, RagPipelineBuilder, RagPipelineConfig,
    };
    pub use crate::refiners::{DeduplicationRefiner, RankRefiner, SimilarityRefiner};
    pub use crate::retrievers::{FilterFn, VectorStoreDocumentRetriever};
    pub use crate::transformers::{
        CompressionQueryTransformer, RewriteQueryTransformer, TranslationQueryTransformer,
    };
}
