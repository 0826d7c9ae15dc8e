//! # Lynx RAG - Retrieval-Augmented Generation for Rust
//!
//! Lynx RAG is an async pipeline runtime that turns a user query into an
//! augmented prompt: the query is transformed, expanded into sub-queries,
//! answered by concurrent retrievers, refined, and finally injected with the
//! retrieved context. A middleware splices the pipeline into chat-model calls.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lynx_rag::prelude::*;
//!
//! # async fn example(store: std::sync::Arc<dyn VectorStore>) -> Result<()> {
//! lynx_rag::logging::init_tracing("info");
//!
//! let pipeline = RagPipeline::builder()
//!     .add_retriever(VectorStoreDocumentRetriever::new(store))
//!     .add_refiner(DeduplicationRefiner::new())
//!     .with_augmenter(ContextualQueryAugmenter::new()?)
//!     .build()?;
//!
//! let output = pipeline.run(&ExecutionContext::new(), "What is a trait object?").await?;
//! println!("{}", output.query.text());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **lynx-rag-core**: query model, stage traits, context, filters, prompts, settings
//! - **lynx-rag-query**: orchestrator, built-in stages, chat middleware, `siumai` adapter

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod logging;

// Re-export all public APIs from sub-crates
pub use lynx_rag_core as core;
pub use lynx_rag_query as query;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits
/// from all Lynx RAG crates.
pub mod prelude {
    pub use lynx_rag_core::prelude::*;
    pub use lynx_rag_query::prelude::*;
}

/// Version information for the Lynx RAG runtime.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
