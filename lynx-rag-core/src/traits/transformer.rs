//! Query transformation stage.

use async_trait::async_trait;

use crate::{ExecutionContext, Query, Result};

/// Rewrites a query before retrieval.
///
/// Transformers run as an ordered chain, each receiving the output of the
/// previous one. An implementation must not alter its input; it returns a new
/// query that keeps every extra of the input.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use lynx_rag_core::traits::QueryTransformer;
/// use lynx_rag_core::{ExecutionContext, Query, Result};
///
/// #[derive(Debug)]
/// struct Lowercase;
///
/// #[async_trait]
/// impl QueryTransformer for Lowercase {
///     async fn transform(&self, _ctx: &ExecutionContext, query: &Query) -> Result<Query> {
///         query.with_text(query.text().to_lowercase())
///     }
/// }
/// ```
#[async_trait]
pub trait QueryTransformer: Send + Sync + std::fmt::Debug {
    /// Produce a transformed copy of `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model call fails or the context is
    /// cancelled.
    async fn transform(&self, ctx: &ExecutionContext, query: &Query) -> Result<Query>;

    /// Get a human-readable name for this transformer.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
