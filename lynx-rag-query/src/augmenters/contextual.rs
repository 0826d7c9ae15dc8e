//! Context injection into the user query.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lynx_rag_core::config::AugmenterSettings;
use lynx_rag_core::traits::QueryAugmenter;
use lynx_rag_core::{Document, ExecutionContext, PromptTemplate, Query, Result};
use tracing::{debug, instrument};

use crate::completion::validated_template;

const DEFAULT_CONTEXT_PROMPT: &str = "Context information is below.

---------------------
{Context}
---------------------

Given the context information and no prior knowledge, answer the query.

Follow these rules:

1. If the answer is not in the context, just say that you don't know.
2. Avoid statements like \"Based on the context...\" or \"The provided information...\".

Query: {Query}

Answer:";

const DEFAULT_EMPTY_CONTEXT_PROMPT: &str = "The user query is outside your knowledge base.
Politely inform the user that you can't answer it.

Query: {Query}";

/// Renders a document set into the text bound to `{Context}`.
pub type DocumentFormatter = Arc<dyn Fn(&[Document]) -> String + Send + Sync>;

fn join_texts(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wraps the query in a prompt carrying the document texts.
///
/// With no documents the behaviour depends on
/// [`AugmenterSettings::allow_empty_context`]: when allowed the query is
/// returned unchanged, otherwise (the default) it is replaced by a prompt
/// telling the model that nothing relevant was found.
#[derive(Clone)]
pub struct ContextualQueryAugmenter {
    template: PromptTemplate,
    empty_context_template: PromptTemplate,
    formatter: DocumentFormatter,
    settings: AugmenterSettings,
}

impl fmt::Debug for ContextualQueryAugmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualQueryAugmenter")
            .field("template", &self.template)
            .field("empty_context_template", &self.empty_context_template)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ContextualQueryAugmenter {
    /// Template variables the main prompt binds.
    pub const VARIABLES: [&'static str; 2] = ["Query", "Context"];

    /// Template variables the empty-context prompt binds.
    pub const EMPTY_CONTEXT_VARIABLES: [&'static str; 1] = ["Query"];

    /// Create an augmenter with the default prompts and strict empty-context handling.
    ///
    /// # Errors
    ///
    /// Returns a configuration error only if a default template were invalid.
    pub fn new() -> Result<Self> {
        Self::with_settings(AugmenterSettings::default())
    }

    /// Create an augmenter with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error only if a default template were invalid.
    pub fn with_settings(settings: AugmenterSettings) -> Result<Self> {
        Ok(Self {
            template: validated_template(DEFAULT_CONTEXT_PROMPT, &Self::VARIABLES)?,
            empty_context_template: validated_template(
                DEFAULT_EMPTY_CONTEXT_PROMPT,
                &Self::EMPTY_CONTEXT_VARIABLES,
            )?,
            formatter: Arc::new(join_texts),
            settings,
        })
    }

    /// Replace the main prompt.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `template` lacks `{Query}` or `{Context}`.
    pub fn with_prompt_template(mut self, template: &str) -> Result<Self> {
        self.template = validated_template(template, &Self::VARIABLES)?;
        Ok(self)
    }

    /// Replace the prompt used when no documents were found.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `template` lacks `{Query}`.
    pub fn with_empty_context_template(mut self, template: &str) -> Result<Self> {
        self.empty_context_template = validated_template(template, &Self::EMPTY_CONTEXT_VARIABLES)?;
        Ok(self)
    }

    /// Replace the document formatter. The default joins texts with newlines.
    #[must_use]
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&[Document]) -> String + Send + Sync + 'static,
    {
        self.formatter = Arc::new(formatter);
        self
    }
}

#[async_trait]
impl QueryAugmenter for ContextualQueryAugmenter {
    #[instrument(
        skip_all,
        fields(augmenter = "ContextualQueryAugmenter", documents = documents.len())
    )]
    async fn augment(
        &self,
        ctx: &ExecutionContext,
        query: &Query,
        documents: &[Document],
    ) -> Result<Query> {
        ctx.check()?;

        if documents.is_empty() {
            if self.settings.allow_empty_context {
                debug!("No documents, passing query through");
                return Ok(query.clone());
            }
            debug!("No documents, using empty-context prompt");
            let values = HashMap::from([("Query", query.text().to_string())]);
            return query.with_text(self.empty_context_template.render(&values)?);
        }

        let values = HashMap::from([
            ("Query", query.text().to_string()),
            ("Context", (self.formatter)(documents)),
        ]);
        query.with_text(self.template.render(&values)?)
    }

    fn name(&self) -> &'static str {
        "ContextualQueryAugmenter"
    }
}
