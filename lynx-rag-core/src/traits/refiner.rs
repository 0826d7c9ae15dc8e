//! Document refinement stage.

use async_trait::async_trait;

use crate::{Document, ExecutionContext, Query, Result};

/// Filters, orders or compresses a document set.
///
/// Refiners run as an ordered chain. Each receives the original user query,
/// not the transformed one, and builds a new document list instead of
/// editing the one it was handed.
#[async_trait]
pub trait DocumentRefiner: Send + Sync + std::fmt::Debug {
    /// Refine `documents` for `query`.
    async fn refine(
        &self,
        ctx: &ExecutionContext,
        query: &Query,
        documents: &[Document],
    ) -> Result<Vec<Document>>;

    /// Get a human-readable name for this refiner.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
