//! Document type and related structures.
//!
//! Documents are the scored text chunks produced by retrievers and reshaped
//! by refiners on their way to the augmenter.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An identifiable, optionally scored text chunk.
///
/// Two documents with the same `id` are duplicates regardless of their text.
/// Refiners never edit documents in place; they build new sequences.
///
/// # Examples
///
/// ```rust
/// use lynx_rag_core::types::Document;
///
/// let doc = Document::builder()
///     .id("doc-1")
///     .text("Rust has no garbage collector.")
///     .score(0.82)
///     .metadata("source", "faq.md")
///     .build();
///
/// assert_eq!(doc.id, "doc-1");
/// assert_eq!(doc.score, Some(0.82));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identity of the document.
    pub id: String,

    /// Text content.
    pub text: String,

    /// Similarity or relevance score. May be negative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Free-form metadata (source, page, author, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a new document with a random identifier.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lynx_rag_core::types::Document;
    ///
    /// let doc = Document::new("Hello, world!");
    /// assert_eq!(doc.text, "Hello, world!");
    /// assert!(doc.score.is_none());
    /// assert!(doc.metadata.is_empty());
    /// ```
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), text)
    }

    /// Create a new document with a specific ID.
    pub fn with_id<I: Into<String>, S: Into<String>>(id: I, text: S) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            score: None,
            metadata: HashMap::new(),
        }
    }

    /// Create a builder for constructing documents with fluent API.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Set the score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Add or update metadata for this document.
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Get a metadata value by key.
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Score used for ordering: a missing score ranks below every real score.
    #[must_use]
    pub fn rank_score(&self) -> f64 {
        self.score.unwrap_or(f64::NEG_INFINITY)
    }
}

/// Builder for creating documents with a fluent API.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    id: Option<String>,
    text: Option<String>,
    score: Option<f64>,
    metadata: HashMap<String, serde_json::Value>,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document ID.
    pub fn id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the document text.
    pub fn text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the score.
    pub fn score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Add metadata.
    pub fn metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Build the document. A missing ID is generated, missing text is empty.
    pub fn build(self) -> Document {
        Document {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            text: self.text.unwrap_or_default(),
            score: self.score,
            metadata: self.metadata,
        }
    }
}
