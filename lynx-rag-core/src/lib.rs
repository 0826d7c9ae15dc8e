//! # Lynx RAG Core
//!
//! Core types, stage traits and interfaces for the Lynx retrieval-augmented
//! generation pipeline runtime.
//!
//! This crate provides the building blocks shared by every pipeline:
//!
//! - **Data structures**: [`Document`], [`Query`] with its metadata bag, chat types
//! - **Stage traits**: `QueryTransformer`, `QueryExpander`, `DocumentRetriever`,
//!   `DocumentRefiner`, `QueryAugmenter`
//! - **Consumed interfaces**: `ChatModel`, `VectorStore`, `ChatHandler`, `StreamHandler`
//! - **Execution context**: cancellation and deadlines for every stage call
//! - **Filters and prompts**: metadata filter expressions and `{Variable}` templates
//! - **Configuration**: serde settings records with validation
//!
//! ## Quick Start
//!
//! ```rust
//! use lynx_rag_core::prelude::*;
//!
//! let mut query = Query::new("How do lifetimes work?").unwrap();
//! query.set(CHAT_HISTORY, vec![ChatMessage::user("How do lifetimes work?")]);
//! assert_eq!(query.chat_history().map(<[ChatMessage]>::len), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used types and traits
pub mod prelude;

// Core modules
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod keys;
pub mod noop;
pub mod prompt;
pub mod traits;
pub mod types;

// Re-export key types at crate root for convenience
pub use context::ExecutionContext;
pub use error::{RagError, Result, Stage};
pub use filter::FilterExpr;
pub use keys::{CHAT_HISTORY, DOCUMENT_CONTEXT, FILTER_EXPRESSION};
pub use noop::{NoopStage, noop};
pub use prompt::PromptTemplate;
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, Document, DocumentBuilder, ExtraValue, Extras,
    MessageRole, Query,
};

// Re-export traits for convenience
pub use traits::*;

/// Version information for the Lynx RAG core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the Lynx RAG core library.
pub const NAME: &str = env!("CARGO_PKG_NAME");
