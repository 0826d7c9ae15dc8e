//! Retrieval backed by a vector store similarity search.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use lynx_rag_core::config::RetrieverSettings;
use lynx_rag_core::traits::{DocumentRetriever, SearchRequest, VectorStore};
use lynx_rag_core::{
    Document, ExecutionContext, Extras, ExtraValue, FilterExpr, Query, RagError, Result,
};
use tracing::{debug, instrument, warn};

/// Computes a metadata filter from a query's extras.
///
/// The extras are lent read-only; the function cannot alter the query.
pub type FilterFn = Arc<dyn Fn(&Extras) -> Option<FilterExpr> + Send + Sync>;

/// Retrieves documents with a similarity search.
///
/// The filter sent with each request is resolved in this order:
///
/// 1. the query's filter-expression extra, if it holds a parsed filter
/// 2. the same extra holding a string, which is parsed (a malformed string
///    fails the retrieval with [`RagError::InvalidInput`])
/// 3. the configured [`FilterFn`], applied to the query's extras
/// 4. no filter
#[derive(Clone)]
pub struct VectorStoreDocumentRetriever {
    vector_store: Arc<dyn VectorStore>,
    settings: RetrieverSettings,
    filter_fn: Option<FilterFn>,
}

impl fmt::Debug for VectorStoreDocumentRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorStoreDocumentRetriever")
            .field("vector_store", &self.vector_store)
            .field("settings", &self.settings)
            .field("filter_fn", &self.filter_fn.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl VectorStoreDocumentRetriever {
    /// Create a retriever with default settings.
    #[must_use]
    pub fn new(vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            vector_store,
            settings: RetrieverSettings::default(),
            filter_fn: None,
        }
    }

    /// Create a retriever with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `min_score` lies outside `[0.0, 1.0]`.
    pub fn with_settings(
        vector_store: Arc<dyn VectorStore>,
        settings: RetrieverSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            vector_store,
            settings,
            filter_fn: None,
        })
    }

    /// Derive filters from query extras when no explicit filter is present.
    #[must_use]
    pub fn with_filter_fn<F>(mut self, filter_fn: F) -> Self
    where
        F: Fn(&Extras) -> Option<FilterExpr> + Send + Sync + 'static,
    {
        self.filter_fn = Some(Arc::new(filter_fn));
        self
    }

    /// The retriever settings.
    #[must_use]
    pub fn settings(&self) -> &RetrieverSettings {
        &self.settings
    }

    fn resolve_filter(&self, query: &Query) -> Result<Option<FilterExpr>> {
        match query.filter_expression() {
            Some(ExtraValue::Filter(expr)) => return Ok(Some(expr.as_ref().clone())),
            Some(value) => match value.as_str() {
                Some(text) if !text.trim().is_empty() => {
                    return FilterExpr::parse(text).map(Some).map_err(|e| {
                        RagError::invalid_input(format!("invalid filter expression extra: {e}"))
                    });
                }
                Some(_) => {}
                None => warn!("Ignoring filter expression extra of unexpected shape"),
            },
            None => {}
        }

        let Some(filter_fn) = &self.filter_fn else {
            return Ok(None);
        };
        Ok(match query.extra() {
            Some(extras) => filter_fn(extras),
            None => filter_fn(&Extras::new()),
        })
    }
}

#[async_trait]
impl DocumentRetriever for VectorStoreDocumentRetriever {
    #[instrument(
        skip_all,
        fields(
            retriever = "VectorStoreDocumentRetriever",
            top_k = self.settings.effective_top_k()
        )
    )]
    async fn retrieve(&self, ctx: &ExecutionContext, query: &Query) -> Result<Vec<Document>> {
        ctx.check()?;

        let filter = self.resolve_filter(query)?;
        let request = SearchRequest::new(query.text())
            .with_top_k(self.settings.top_k)
            .with_min_score(self.settings.min_score)
            .with_filter(filter);
        if let Some(filter) = &request.filter {
            debug!(%filter, "Searching vector store with filter");
        }

        let documents = ctx.run(self.vector_store.similarity_search(&request)).await?;
        debug!(count = documents.len(), "Vector store returned documents");
        Ok(documents)
    }

    fn name(&self) -> &'static str {
        "VectorStoreDocumentRetriever"
    }
}
