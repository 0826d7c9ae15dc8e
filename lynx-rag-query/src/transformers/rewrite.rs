//! Query rewriting for a specific search backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use lynx_rag_core::traits::{ChatModel, QueryTransformer};
use lynx_rag_core::{ExecutionContext, PromptTemplate, Query, RagError, Result};
use tracing::instrument;

use super::replace_text;
use crate::completion::{complete, validated_template};

const DEFAULT_REWRITE_PROMPT: &str = "Given a user query, rewrite it to provide better results when querying a {Target}.
Remove any irrelevant information, and ensure the query is concise and specific.

Original query:
{Query}

Rewritten query:";

const DEFAULT_TARGET: &str = "vector store";

/// Rewrites a query so that it suits the target search system better.
#[derive(Debug, Clone)]
pub struct RewriteQueryTransformer {
    chat_model: Arc<dyn ChatModel>,
    template: PromptTemplate,
    target: String,
}

impl RewriteQueryTransformer {
    /// Template variables this transformer binds.
    pub const VARIABLES: [&'static str; 2] = ["Query", "Target"];

    /// Create a transformer targeting a vector store with the default prompt.
    ///
    /// # Errors
    ///
    /// Returns a configuration error only if the default template were invalid.
    pub fn new(chat_model: Arc<dyn ChatModel>) -> Result<Self> {
        Ok(Self {
            chat_model,
            template: validated_template(DEFAULT_REWRITE_PROMPT, &Self::VARIABLES)?,
            target: DEFAULT_TARGET.to_string(),
        })
    }

    /// Set the search system the query is rewritten for.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `target` is blank.
    pub fn with_target<S: Into<String>>(mut self, target: S) -> Result<Self> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(RagError::configuration("rewrite target must not be empty"));
        }
        self.target = target;
        Ok(self)
    }

    /// Replace the prompt template.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `template` lacks `{Query}` or `{Target}`.
    pub fn with_prompt_template(mut self, template: &str) -> Result<Self> {
        self.template = validated_template(template, &Self::VARIABLES)?;
        Ok(self)
    }
}

#[async_trait]
impl QueryTransformer for RewriteQueryTransformer {
    #[instrument(skip_all, fields(transformer = "RewriteQueryTransformer", target = %self.target))]
    async fn transform(&self, ctx: &ExecutionContext, query: &Query) -> Result<Query> {
        let values = HashMap::from([
            ("Query", query.text().to_string()),
            ("Target", self.target.clone()),
        ]);
        let completion = complete(ctx, self.chat_model.as_ref(), &self.template, &values).await?;
        replace_text(query, completion)
    }

    fn name(&self) -> &'static str {
        "RewriteQueryTransformer"
    }
}
