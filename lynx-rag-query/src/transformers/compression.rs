//! Conversation-aware query compression.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use lynx_rag_core::traits::{ChatModel, QueryTransformer};
use lynx_rag_core::{ChatMessage, ExecutionContext, PromptTemplate, Query, Result};
use tracing::{debug, instrument};

use super::replace_text;
use crate::completion::{complete, validated_template};

const DEFAULT_COMPRESSION_PROMPT: &str = "Given the following conversation history and a follow-up query, \
your task is to synthesize a concise, standalone query that incorporates the context from the history.
Ensure the standalone query is clear, specific, and keeps the user's intent.

Conversation history:
{History}

Follow-up query:
{Query}

Standalone query:";

/// Folds the chat history into a single standalone query.
///
/// The history is read from the reserved chat-history extra. When it is
/// absent, or holds something other than messages, the prompt gets an empty
/// history.
#[derive(Debug, Clone)]
pub struct CompressionQueryTransformer {
    chat_model: Arc<dyn ChatModel>,
    template: PromptTemplate,
}

impl CompressionQueryTransformer {
    /// Template variables this transformer binds.
    pub const VARIABLES: [&'static str; 2] = ["History", "Query"];

    /// Create a transformer with the default prompt.
    ///
    /// # Errors
    ///
    /// Never fails with the built-in prompt; returns a configuration error
    /// only if the default template were invalid.
    pub fn new(chat_model: Arc<dyn ChatModel>) -> Result<Self> {
        Ok(Self {
            chat_model,
            template: validated_template(DEFAULT_COMPRESSION_PROMPT, &Self::VARIABLES)?,
        })
    }

    /// Replace the prompt template.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `template` lacks `{History}` or `{Query}`.
    pub fn with_prompt_template(mut self, template: &str) -> Result<Self> {
        self.template = validated_template(template, &Self::VARIABLES)?;
        Ok(self)
    }
}

fn format_history(history: &[ChatMessage]) -> String {
    let mut formatted = String::new();
    for message in history {
        let _ = writeln!(formatted, "{}: {}", message.role, message.content);
    }
    formatted.trim_end().to_string()
}

#[async_trait]
impl QueryTransformer for CompressionQueryTransformer {
    #[instrument(skip_all, fields(transformer = "CompressionQueryTransformer"))]
    async fn transform(&self, ctx: &ExecutionContext, query: &Query) -> Result<Query> {
        let history = query.chat_history().map(format_history).unwrap_or_default();
        debug!(history_len = history.len(), "Compressing query with history");

        let values = HashMap::from([("History", history), ("Query", query.text().to_string())]);
        let completion = complete(ctx, self.chat_model.as_ref(), &self.template, &values).await?;
        replace_text(query, completion)
    }

    fn name(&self) -> &'static str {
        "CompressionQueryTransformer"
    }
}
