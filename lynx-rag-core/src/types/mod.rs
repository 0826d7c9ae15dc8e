//! Core data types for the Lynx RAG runtime.
//!
//! This module contains the document model, the query model with its
//! metadata bag, and the chat types exchanged with chat handlers.

pub mod chat;
pub mod document;
pub mod query;

pub use chat::*;
pub use document::*;
pub use query::*;
