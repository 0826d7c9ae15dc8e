//! Minimal `{Variable}` prompt templates.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;

use crate::{RagError, Result};

const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z_][A-Za-z0-9_]*)\}";

/// A text template with `{Variable}` placeholders.
///
/// Stages declare the variables they bind and reject, at construction time,
/// a template that does not mention all of them.
///
/// # Examples
///
/// ```rust
/// use lynx_rag_core::PromptTemplate;
/// use std::collections::HashMap;
///
/// let template = PromptTemplate::new("Translate {Query} into {TargetLanguage}.").unwrap();
/// template.validate_variables(&["Query", "TargetLanguage"]).unwrap();
///
/// let rendered = template
///     .render(&HashMap::from([("Query", "bonjour".to_string()), ("TargetLanguage", "English".to_string())]))
///     .unwrap();
/// assert_eq!(rendered, "Translate bonjour into English.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Parse a template and collect its placeholder names in order of first use.
    pub fn new<S: Into<String>>(template: S) -> Result<Self> {
        let template = template.into();
        let placeholder = Regex::new(PLACEHOLDER_PATTERN)
            .map_err(|e| RagError::internal(format!("invalid placeholder pattern: {e}")))?;

        let mut variables: Vec<String> = Vec::new();
        for capture in placeholder.captures_iter(&template) {
            let name = &capture[1];
            if !variables.iter().any(|v| v == name) {
                variables.push(name.to_string());
            }
        }

        Ok(Self {
            template,
            variables,
        })
    }

    /// The raw template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names, in order of first appearance.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Fail with a configuration error if any `required` variable is missing.
    pub fn validate_variables(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !self.variables.iter().any(|v| v == name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RagError::configuration(format!(
                "prompt template is missing required variables: {}",
                missing.join(", ")
            )))
        }
    }

    /// Substitute every placeholder in one pass. Fails if any placeholder is unbound.
    ///
    /// Substituted values are inserted verbatim: a value that itself contains
    /// `{Variable}` text is never expanded.
    pub fn render(&self, values: &HashMap<&str, String>) -> Result<String> {
        if let Some(name) = self
            .variables
            .iter()
            .find(|name| !values.contains_key(name.as_str()))
        {
            return Err(RagError::invalid_input(format!(
                "prompt variable '{name}' is not bound"
            )));
        }

        let placeholder = Regex::new(PLACEHOLDER_PATTERN)
            .map_err(|e| RagError::internal(format!("invalid placeholder pattern: {e}")))?;
        let rendered = placeholder.replace_all(&self.template, |captures: &Captures<'_>| {
            values
                .get(&captures[1])
                .cloned()
                .unwrap_or_else(|| captures[0].to_string())
        });
        Ok(rendered.into_owned())
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
