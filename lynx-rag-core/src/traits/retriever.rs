//! Document retrieval stage.

use async_trait::async_trait;

use crate::{Document, ExecutionContext, Query, Result};

/// Fetches candidate documents for a query.
///
/// Retrievers run concurrently, once per sub-query, so implementations must
/// be safe to call from several tasks at once. The order of the returned
/// documents is preserved by the pipeline.
///
/// # Examples
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use lynx_rag_core::traits::DocumentRetriever;
/// use lynx_rag_core::{Document, ExecutionContext, Query, Result};
///
/// #[derive(Debug)]
/// struct StaticRetriever(Vec<Document>);
///
/// #[async_trait]
/// impl DocumentRetriever for StaticRetriever {
///     async fn retrieve(&self, ctx: &ExecutionContext, _query: &Query) -> Result<Vec<Document>> {
///         ctx.check()?;
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentRetriever: Send + Sync + std::fmt::Debug {
    /// Retrieve documents relevant to `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails, the query carries an
    /// invalid filter, or the context is cancelled.
    async fn retrieve(&self, ctx: &ExecutionContext, query: &Query) -> Result<Vec<Document>>;

    /// Get a human-readable name for this retriever.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
