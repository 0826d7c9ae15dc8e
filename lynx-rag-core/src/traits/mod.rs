//! Core traits for the Lynx RAG runtime.
//!
//! The five stage traits describe the pipeline:
//!
//! - [`QueryTransformer`]: rewrites the query before retrieval
//! - [`QueryExpander`]: fans one query out into several
//! - [`DocumentRetriever`]: fetches candidate documents
//! - [`DocumentRefiner`]: filters and orders the candidates
//! - [`QueryAugmenter`]: injects the documents into the final query
//!
//! The remaining traits are consumed interfaces implemented by external
//! collaborators: chat models, vector stores and chat handlers.

pub mod augmenter;
pub mod chat_model;
pub mod expander;
pub mod handler;
pub mod refiner;
pub mod retriever;
pub mod transformer;
pub mod vector_store;

pub use augmenter::QueryAugmenter;
pub use chat_model::ChatModel;
pub use expander::QueryExpander;
pub use handler::{ChatHandler, ChatStream, StreamHandler};
pub use refiner::DocumentRefiner;
pub use retriever::DocumentRetriever;
pub use transformer::QueryTransformer;
pub use vector_store::{
    DEFAULT_TOP_K, MAX_SIMILARITY_SCORE, MIN_SIMILARITY_SCORE, SearchRequest, VectorStore,
    validate_min_score,
};
