//! Chat handler interfaces wrapped by the RAG middleware.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{ChatRequest, ChatResponse, ExecutionContext, Result};

/// A lazily produced sequence of response chunks.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatResponse>> + Send>>;

/// Handles a complete (non-streaming) chat call.
///
/// The request is borrowed mutably so that wrapping handlers can rewrite it
/// before delegating; the rewrite is visible to the caller.
#[async_trait]
pub trait ChatHandler: Send + Sync {
    /// Handle `request` and return the full response.
    async fn call(&self, ctx: &ExecutionContext, request: &mut ChatRequest) -> Result<ChatResponse>;
}

/// Handles a streaming chat call.
pub trait StreamHandler: Send + Sync {
    /// Start streaming a response to `request`.
    ///
    /// Nothing happens until the returned stream is polled, and dropping it
    /// cancels the underlying subscription.
    fn stream(&self, ctx: ExecutionContext, request: ChatRequest) -> ChatStream;
}
