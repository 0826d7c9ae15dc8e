//! LLM-driven multi-query expansion.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use lynx_rag_core::config::ExpanderSettings;
use lynx_rag_core::traits::{ChatModel, QueryExpander};
use lynx_rag_core::{ExecutionContext, PromptTemplate, Query, Result};
use tracing::{debug, instrument, warn};

use crate::completion::{complete, validated_template};

const DEFAULT_MULTI_QUERY_PROMPT: &str = "You are an expert at information retrieval and search optimization.
Your task is to generate {Number} different versions of the given query.

Each variant must cover a different perspective or aspect of the topic, while keeping the core intent \
of the original query. The goal is to widen the search space and improve the chances of finding relevant information.

Do not explain your choices or add any other text.
Provide the query variants separated by newlines.

Original query: {Query}

Query variants:";

/// Asks a chat model for several phrasings of the query.
///
/// The model answer is split into lines; blank lines are dropped and at most
/// `number_of_queries` variants are kept. Each variant is a copy of the input
/// query with new text, so extras carry over. With `include_original` the
/// input query leads the list. An empty answer yields the input query alone.
#[derive(Debug, Clone)]
pub struct MultiQueryExpander {
    chat_model: Arc<dyn ChatModel>,
    template: PromptTemplate,
    settings: ExpanderSettings,
}

impl MultiQueryExpander {
    /// Template variables this expander binds.
    pub const VARIABLES: [&'static str; 2] = ["Number", "Query"];

    /// Create an expander with default settings and prompt.
    ///
    /// # Errors
    ///
    /// Returns a configuration error only if the default template were invalid.
    pub fn new(chat_model: Arc<dyn ChatModel>) -> Result<Self> {
        Self::with_settings(chat_model, ExpanderSettings::default())
    }

    /// Create an expander with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `number_of_queries` is zero.
    pub fn with_settings(
        chat_model: Arc<dyn ChatModel>,
        settings: ExpanderSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            chat_model,
            template: validated_template(DEFAULT_MULTI_QUERY_PROMPT, &Self::VARIABLES)?,
            settings,
        })
    }

    /// Replace the prompt template.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `template` lacks `{Number}` or `{Query}`.
    pub fn with_prompt_template(mut self, template: &str) -> Result<Self> {
        self.template = validated_template(template, &Self::VARIABLES)?;
        Ok(self)
    }

    /// The expander settings.
    #[must_use]
    pub fn settings(&self) -> &ExpanderSettings {
        &self.settings
    }
}

#[async_trait]
impl QueryExpander for MultiQueryExpander {
    #[instrument(
        skip_all,
        fields(expander = "MultiQueryExpander", number = self.settings.number_of_queries)
    )]
    async fn expand(&self, ctx: &ExecutionContext, query: &Query) -> Result<Vec<Query>> {
        let values = HashMap::from([
            ("Number", self.settings.number_of_queries.to_string()),
            ("Query", query.text().to_string()),
        ]);
        let completion = complete(ctx, self.chat_model.as_ref(), &self.template, &values).await?;

        let variants: Vec<&str> = completion
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(self.settings.number_of_queries)
            .collect();

        if variants.is_empty() {
            warn!("Chat model returned no query variants, using the input query");
            return Ok(vec![query.clone()]);
        }

        let mut expanded = Vec::with_capacity(variants.len() + 1);
        if self.settings.include_original {
            expanded.push(query.clone());
        }
        for variant in variants {
            expanded.push(query.with_text(variant)?);
        }

        debug!(count = expanded.len(), "Expanded query");
        Ok(expanded)
    }

    fn name(&self) -> &'static str {
        "MultiQueryExpander"
    }
}
