//! Built-in document retrievers.

pub mod vector_store;

pub use vector_store::{FilterFn, VectorStoreDocumentRetriever};
