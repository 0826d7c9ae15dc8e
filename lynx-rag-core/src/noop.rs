//! Pass-through stage used where a pipeline slot is left empty.

use async_trait::async_trait;
use std::sync::{Arc, LazyLock};

use crate::traits::{
    DocumentRefiner, DocumentRetriever, QueryAugmenter, QueryExpander, QueryTransformer,
};
use crate::{Document, ExecutionContext, Query, Result};

static NOOP: LazyLock<Arc<NoopStage>> = LazyLock::new(|| Arc::new(NoopStage));

/// A stage that implements every stage trait without doing anything.
///
/// - transform and augment return a clone of the query
/// - expand returns the query alone
/// - retrieve returns no documents
/// - refine returns the documents unchanged
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoopStage;

/// The shared no-op stage. Every call returns the same instance.
///
/// ```rust
/// use std::sync::Arc;
///
/// assert!(Arc::ptr_eq(&lynx_rag_core::noop(), &lynx_rag_core::noop()));
/// ```
#[must_use]
pub fn noop() -> Arc<NoopStage> {
    Arc::clone(&NOOP)
}

#[async_trait]
impl QueryTransformer for NoopStage {
    async fn transform(&self, _ctx: &ExecutionContext, query: &Query) -> Result<Query> {
        Ok(query.clone())
    }

    fn name(&self) -> &'static str {
        "NoopStage"
    }
}

#[async_trait]
impl QueryExpander for NoopStage {
    async fn expand(&self, _ctx: &ExecutionContext, query: &Query) -> Result<Vec<Query>> {
        Ok(vec![query.clone()])
    }

    fn name(&self) -> &'static str {
        "NoopStage"
    }
}

#[async_trait]
impl DocumentRetriever for NoopStage {
    async fn retrieve(&self, _ctx: &ExecutionContext, _query: &Query) -> Result<Vec<Document>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "NoopStage"
    }
}

#[async_trait]
impl DocumentRefiner for NoopStage {
    async fn refine(
        &self,
        _ctx: &ExecutionContext,
        _query: &Query,
        documents: &[Document],
    ) -> Result<Vec<Document>> {
        Ok(documents.to_vec())
    }

    fn name(&self) -> &'static str {
        "NoopStage"
    }
}

#[async_trait]
impl QueryAugmenter for NoopStage {
    async fn augment(
        &self,
        _ctx: &ExecutionContext,
        query: &Query,
        _documents: &[Document],
    ) -> Result<Query> {
        Ok(query.clone())
    }

    fn name(&self) -> &'static str {
        "NoopStage"
    }
}
