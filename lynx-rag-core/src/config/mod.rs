//! Configuration types for the Lynx RAG runtime.
//!
//! Every record is serde-deserializable, has sensible defaults and a
//! `validate()` method that reports configuration errors before a pipeline
//! is built. [`RagSettings`] aggregates them and loads from TOML or JSON.

pub mod loader;
pub mod settings;

pub use settings::*;
