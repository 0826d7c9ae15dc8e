//! Chat model adapter over a `siumai` client.

use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::fmt;
use std::sync::Arc;

use lynx_rag_core::traits::{ChatHandler, ChatModel, ChatStream, StreamHandler};
use lynx_rag_core::{
    ChatMessage, ChatRequest, ChatResponse, ExecutionContext, MessageRole, RagError, Result,
};
use siumai::prelude::ChatCapability;
use siumai::types::{ChatMessage as SiumaiMessage, ChatStreamEvent};
use tracing::{debug, instrument, warn};

/// Adapts a `siumai` chat client to the runtime's chat interfaces.
///
/// The same instance can back the LLM-driven stages (as a [`ChatModel`]) and
/// be wrapped by the RAG middleware (as a [`ChatHandler`] or
/// [`StreamHandler`]).
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use lynx_rag_query::SiumaiChatModel;
/// use siumai::prelude::*;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Siumai::builder()
///     .openai()
///     .api_key("your-api-key")
///     .model("gpt-4o-mini")
///     .build()
///     .await?;
/// let model = SiumaiChatModel::new(Arc::new(client));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SiumaiChatModel {
    client: Arc<dyn ChatCapability>,
}

impl fmt::Debug for SiumaiChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiumaiChatModel").finish_non_exhaustive()
    }
}

impl SiumaiChatModel {
    /// Wrap a `siumai` client.
    #[must_use]
    pub fn new(client: Arc<dyn ChatCapability>) -> Self {
        Self { client }
    }

    async fn chat_text(&self, messages: Vec<SiumaiMessage>) -> Result<String> {
        let response = self.client.chat(messages).await.map_err(|e| {
            warn!("Siumai chat failed: {e}");
            RagError::llm(format!("Siumai chat failed: {e}"))
        })?;
        Ok(response.content.all_text())
    }
}

/// Convert runtime chat messages into `siumai` messages.
#[must_use]
pub fn to_siumai_messages(messages: &[ChatMessage]) -> Vec<SiumaiMessage> {
    messages
        .iter()
        .map(|message| match message.role {
            MessageRole::User => SiumaiMessage::user(&message.content).build(),
            MessageRole::System => SiumaiMessage::system(&message.content).build(),
            // Tool output is replayed as assistant text.
            MessageRole::Assistant | MessageRole::Tool => {
                SiumaiMessage::assistant(&message.content).build()
            }
        })
        .collect()
}

#[async_trait]
impl ChatModel for SiumaiChatModel {
    #[instrument(skip_all, fields(model = "SiumaiChatModel", prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let text = self.chat_text(vec![SiumaiMessage::user(prompt).build()]).await?;
        debug!(completion_len = text.len(), "Completed prompt");
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "SiumaiChatModel"
    }
}

#[async_trait]
impl ChatHandler for SiumaiChatModel {
    async fn call(
        &self,
        ctx: &ExecutionContext,
        request: &mut ChatRequest,
    ) -> Result<ChatResponse> {
        let messages = to_siumai_messages(&request.messages);
        let text = ctx.run(self.chat_text(messages)).await?;
        Ok(ChatResponse::new(text))
    }
}

impl StreamHandler for SiumaiChatModel {
    fn stream(&self, ctx: ExecutionContext, request: ChatRequest) -> ChatStream {
        let client = Arc::clone(&self.client);
        let messages = to_siumai_messages(&request.messages);

        let opened = async move {
            ctx.check()?;
            client
                .chat_stream(messages, None)
                .await
                .map_err(|e| RagError::llm(format!("Siumai streaming failed: {e}")))
        };

        let chunks = stream::once(opened)
            .map(|opened| match opened {
                Ok(events) => events
                    .filter_map(|event| async move {
                        match event {
                            Ok(ChatStreamEvent::ContentDelta { delta, .. }) => {
                                Some(Ok(ChatResponse::new(delta)))
                            }
                            Ok(_) => None,
                            Err(e) => Some(Err(RagError::llm(format!("Stream error: {e}")))),
                        }
                    })
                    .boxed(),
                Err(error) => stream::once(async move { Err(error) }).boxed(),
            })
            .flatten();

        Box::pin(chunks)
    }
}
