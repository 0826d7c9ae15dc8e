//! Query expansion stage.

use async_trait::async_trait;

use crate::{ExecutionContext, Query, Result};

/// Turns one query into several retrieval queries.
///
/// The pipeline retrieves once per returned query and retriever. An empty
/// result is treated as the single input query.
#[async_trait]
pub trait QueryExpander: Send + Sync + std::fmt::Debug {
    /// Expand `query` into sub-queries.
    async fn expand(&self, ctx: &ExecutionContext, query: &Query) -> Result<Vec<Query>>;

    /// Get a human-readable name for this expander.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
