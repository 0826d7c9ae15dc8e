//! Built-in query expanders.

pub mod multi_query;

pub use multi_query::MultiQueryExpander;
