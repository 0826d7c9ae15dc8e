//! Query translation into the language of the indexed documents.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use lynx_rag_core::traits::{ChatModel, QueryTransformer};
use lynx_rag_core::{ExecutionContext, PromptTemplate, Query, RagError, Result};
use tracing::instrument;

use super::replace_text;
use crate::completion::{complete, validated_template};

const DEFAULT_TRANSLATION_PROMPT: &str = "Given a user query, translate it to {TargetLanguage}.
If the query is already in {TargetLanguage}, return it unchanged.
If you don't know the language of the query, return it unchanged.
Do not add explanations nor any other text.

Original query: {Query}

Translated query:";

/// Translates the query into a fixed target language.
#[derive(Debug, Clone)]
pub struct TranslationQueryTransformer {
    chat_model: Arc<dyn ChatModel>,
    template: PromptTemplate,
    target_language: String,
}

impl TranslationQueryTransformer {
    /// Template variables this transformer binds.
    pub const VARIABLES: [&'static str; 2] = ["Query", "TargetLanguage"];

    /// Create a transformer translating into `target_language`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `target_language` is blank.
    pub fn new<S: Into<String>>(
        chat_model: Arc<dyn ChatModel>,
        target_language: S,
    ) -> Result<Self> {
        let target_language = target_language.into();
        if target_language.trim().is_empty() {
            return Err(RagError::configuration("target language must not be empty"));
        }
        Ok(Self {
            chat_model,
            template: validated_template(DEFAULT_TRANSLATION_PROMPT, &Self::VARIABLES)?,
            target_language,
        })
    }

    /// Replace the prompt template.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `template` lacks `{Query}` or `{TargetLanguage}`.
    pub fn with_prompt_template(mut self, template: &str) -> Result<Self> {
        self.template = validated_template(template, &Self::VARIABLES)?;
        Ok(self)
    }

    /// The language queries are translated into.
    #[must_use]
    pub fn target_language(&self) -> &str {
        &self.target_language
    }
}

#[async_trait]
impl QueryTransformer for TranslationQueryTransformer {
    #[instrument(
        skip_all,
        fields(transformer = "TranslationQueryTransformer", language = %self.target_language)
    )]
    async fn transform(&self, ctx: &ExecutionContext, query: &Query) -> Result<Query> {
        let values = HashMap::from([
            ("Query", query.text().to_string()),
            ("TargetLanguage", self.target_language.clone()),
        ]);
        let completion = complete(ctx, self.chat_model.as_ref(), &self.template, &values).await?;
        replace_text(query, completion)
    }

    fn name(&self) -> &'static str {
        "TranslationQueryTransformer"
    }
}
