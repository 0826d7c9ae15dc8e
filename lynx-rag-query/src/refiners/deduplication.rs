//! Identity-based document deduplication.

use async_trait::async_trait;
use std::collections::HashSet;

use lynx_rag_core::traits::DocumentRefiner;
use lynx_rag_core::{Document, ExecutionContext, Query, Result};
use tracing::debug;

/// Removes documents whose id was already seen.
///
/// The first occurrence of each id is kept and the relative order of the
/// survivors is unchanged, which makes the refiner idempotent.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeduplicationRefiner;

impl DeduplicationRefiner {
    /// Create a deduplication refiner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentRefiner for DeduplicationRefiner {
    async fn refine(
        &self,
        ctx: &ExecutionContext,
        _query: &Query,
        documents: &[Document],
    ) -> Result<Vec<Document>> {
        ctx.check()?;

        let mut seen = HashSet::with_capacity(documents.len());
        let unique: Vec<Document> = documents
            .iter()
            .filter(|doc| seen.insert(doc.id.as_str()))
            .cloned()
            .collect();

        debug!(
            input = documents.len(),
            output = unique.len(),
            "Deduplicated documents"
        );
        Ok(unique)
    }

    fn name(&self) -> &'static str {
        "DeduplicationRefiner"
    }
}
