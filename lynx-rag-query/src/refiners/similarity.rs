//! Similarity-cutoff filtering.

use async_trait::async_trait;

use lynx_rag_core::traits::DocumentRefiner;
use lynx_rag_core::{Document, ExecutionContext, Query, RagError, Result};
use tracing::debug;

/// Keeps documents scoring at least a cutoff.
///
/// Documents without a score are dropped. The order of the survivors is
/// unchanged and an optional limit truncates the result.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityRefiner {
    cutoff: f64,
    max_documents: Option<usize>,
}

impl SimilarityRefiner {
    /// Create a refiner with the given cutoff.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `cutoff` is not a finite number.
    pub fn with_cutoff(cutoff: f64) -> Result<Self> {
        if !cutoff.is_finite() {
            return Err(RagError::configuration(format!(
                "similarity cutoff must be finite, got {cutoff}"
            )));
        }
        Ok(Self {
            cutoff,
            max_documents: None,
        })
    }

    /// Also keep at most `max_documents` documents.
    #[must_use]
    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.max_documents = Some(max_documents);
        self
    }
}

#[async_trait]
impl DocumentRefiner for SimilarityRefiner {
    async fn refine(
        &self,
        ctx: &ExecutionContext,
        _query: &Query,
        documents: &[Document],
    ) -> Result<Vec<Document>> {
        ctx.check()?;

        let mut kept: Vec<Document> = documents
            .iter()
            .filter(|doc| doc.score.is_some_and(|score| score >= self.cutoff))
            .cloned()
            .collect();

        if let Some(max_documents) = self.max_documents {
            kept.truncate(max_documents);
        }

        debug!(
            input = documents.len(),
            output = kept.len(),
            cutoff = self.cutoff,
            "Filtered documents by similarity"
        );
        Ok(kept)
    }

    fn name(&self) -> &'static str {
        "SimilarityRefiner"
    }
}
