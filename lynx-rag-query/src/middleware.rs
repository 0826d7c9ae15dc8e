//! Splices a RAG pipeline into chat-model calls.
//!
//! [`RagMiddleware`] wraps a downstream [`ChatHandler`] or [`StreamHandler`]
//! so that every request is first run through the pipeline: the last user
//! message is replaced by the augmented query and the refined documents are
//! attached to the response metadata under [`DOCUMENT_CONTEXT`].

use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::sync::Arc;

use lynx_rag_core::traits::{ChatHandler, ChatStream, StreamHandler};
use lynx_rag_core::{
    CHAT_HISTORY, ChatRequest, ChatResponse, DOCUMENT_CONTEXT, Document, ExecutionContext,
    ExtraValue, Query, RagError, Result,
};
use tracing::{debug, instrument};

use crate::pipeline::RagPipeline;

/// Builds pipeline-backed wrappers around chat handlers.
///
/// The middleware holds only the shared pipeline, so it is cheap to clone
/// and safe to use from concurrent requests.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use lynx_rag_core::{ChatMessage, ChatRequest, ExecutionContext, noop};
/// use lynx_rag_core::traits::ChatHandler;
/// use lynx_rag_query::{RagMiddleware, RagPipeline};
///
/// # async fn example(model: impl ChatHandler) -> lynx_rag_core::Result<()> {
/// let pipeline = RagPipeline::builder().add_retriever_arc(noop()).build()?;
/// let handler = RagMiddleware::new(Arc::new(pipeline)).wrap_call(model);
///
/// let mut request = ChatRequest::new(vec![ChatMessage::user("What is a lifetime?")]);
/// let response = handler.call(&ExecutionContext::new(), &mut request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RagMiddleware {
    pipeline: Arc<RagPipeline>,
}

impl RagMiddleware {
    /// Create a middleware around `pipeline`.
    #[must_use]
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        Self { pipeline }
    }

    /// The wrapped pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.pipeline
    }

    /// Wrap a non-streaming handler.
    #[must_use]
    pub fn wrap_call<H: ChatHandler>(&self, handler: H) -> RagChatHandler<H> {
        RagChatHandler {
            pipeline: Arc::clone(&self.pipeline),
            inner: handler,
        }
    }

    /// Wrap a streaming handler.
    #[must_use]
    pub fn wrap_stream<H: StreamHandler + 'static>(&self, handler: H) -> RagStreamHandler<H> {
        RagStreamHandler {
            pipeline: Arc::clone(&self.pipeline),
            inner: Arc::new(handler),
        }
    }
}

/// Runs the pipeline for `request` and rewrites its last user message.
///
/// Returns the refined documents to attach to the response.
async fn prepare(
    pipeline: &RagPipeline,
    ctx: &ExecutionContext,
    request: &mut ChatRequest,
) -> Result<Arc<Vec<Document>>> {
    let text = request
        .last_user_message()
        .map(|message| message.content.clone())
        .ok_or_else(|| RagError::invalid_input("chat request has no user message"))?;
    if text.is_empty() {
        return Err(RagError::invalid_input("last user message is empty"));
    }

    let mut query = Query::new(text)?;
    if let Some(parameters) = &request.parameters {
        for (key, value) in parameters {
            query.set(key.clone(), value.clone());
        }
    }
    query.set(CHAT_HISTORY, request.messages.clone());

    let output = pipeline.execute(ctx, &query).await?;
    request.replace_last_user_message_text(output.query.text());
    debug!(
        documents = output.documents.len(),
        "Replaced last user message with augmented query"
    );

    Ok(Arc::new(output.documents))
}

/// A [`ChatHandler`] that runs the pipeline before delegating.
#[derive(Debug, Clone)]
pub struct RagChatHandler<H> {
    pipeline: Arc<RagPipeline>,
    inner: H,
}

impl<H> RagChatHandler<H> {
    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: ChatHandler> ChatHandler for RagChatHandler<H> {
    /// Run the pipeline, rewrite `request`, then call the wrapped handler.
    ///
    /// The rewrite of the last user message stays visible in `request`
    /// after the call. A pipeline failure is returned without calling the
    /// wrapped handler.
    #[instrument(skip_all, fields(middleware = "RagChatHandler"))]
    async fn call(
        &self,
        ctx: &ExecutionContext,
        request: &mut ChatRequest,
    ) -> Result<ChatResponse> {
        let documents = prepare(&self.pipeline, ctx, request).await?;
        let mut response = self.inner.call(ctx, request).await?;
        response.set_metadata(DOCUMENT_CONTEXT, ExtraValue::Documents(documents));
        Ok(response)
    }
}

/// A [`StreamHandler`] that runs the pipeline once before streaming.
#[derive(Debug)]
pub struct RagStreamHandler<H> {
    pipeline: Arc<RagPipeline>,
    inner: Arc<H>,
}

impl<H> Clone for RagStreamHandler<H> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: StreamHandler + 'static> StreamHandler for RagStreamHandler<H> {
    /// Run the pipeline on first poll, then forward the wrapped stream.
    ///
    /// Every chunk carries the same document set under the document-context
    /// key. If the pipeline fails, the stream yields that error once and ends.
    fn stream(&self, ctx: ExecutionContext, mut request: ChatRequest) -> ChatStream {
        let pipeline = Arc::clone(&self.pipeline);
        let inner = Arc::clone(&self.inner);

        let prelude = async move {
            match prepare(&pipeline, &ctx, &mut request).await {
                Ok(documents) => inner
                    .stream(ctx, request)
                    .map(move |chunk| {
                        chunk.map(|mut response| {
                            response.set_metadata(
                                DOCUMENT_CONTEXT,
                                ExtraValue::Documents(Arc::clone(&documents)),
                            );
                            response
                        })
                    })
                    .boxed(),
                Err(error) => stream::once(async move { Err(error) }).boxed(),
            }
        };

        Box::pin(stream::once(prelude).flatten())
    }
}
