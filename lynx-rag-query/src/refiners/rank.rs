//! Score-based ranking with truncation.

use async_trait::async_trait;

use lynx_rag_core::traits::{DEFAULT_TOP_K, DocumentRefiner};
use lynx_rag_core::{Document, ExecutionContext, Query, Result};
use tracing::debug;

/// Keeps the `top_k` highest-scored documents, best first.
///
/// The sort is stable, so documents with equal scores keep their input
/// order. Documents without a score rank after every scored document.
#[derive(Debug, Clone, Copy)]
pub struct RankRefiner {
    top_k: usize,
}

impl Default for RankRefiner {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl RankRefiner {
    /// Create a ranker keeping `top_k` documents. Values below 1 are raised to 1.
    #[must_use]
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k: top_k.max(1),
        }
    }

    /// The number of documents kept.
    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rank `documents` without going through the async trait.
    #[must_use]
    pub fn rank(&self, documents: &[Document]) -> Vec<Document> {
        let mut ranked = documents.to_vec();
        ranked.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
        ranked.truncate(self.top_k);
        ranked
    }
}

#[async_trait]
impl DocumentRefiner for RankRefiner {
    async fn refine(
        &self,
        ctx: &ExecutionContext,
        _query: &Query,
        documents: &[Document],
    ) -> Result<Vec<Document>> {
        ctx.check()?;
        let ranked = self.rank(documents);
        debug!(
            input = documents.len(),
            output = ranked.len(),
            top_k = self.top_k,
            "Ranked documents"
        );
        Ok(ranked)
    }

    fn name(&self) -> &'static str {
        "RankRefiner"
    }
}
