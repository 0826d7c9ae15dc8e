//! The query model and its metadata bag.
//!
//! A [`Query`] carries the user's text plus an `extra` map of side-channel
//! values (chat history, filters, user ids...) keyed by string. Stages never
//! mutate a query they were handed: they clone it and return the clone.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ChatMessage, Document};
use crate::filter::FilterExpr;
use crate::keys;
use crate::{RagError, Result};

/// A value stored in a query's extras or a response's metadata.
///
/// Collection variants are reference counted, so cloning a map of extras
/// copies the map but shares the collections it points at.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraValue {
    /// Any JSON value (strings, numbers, request parameters...).
    Value(Value),
    /// A conversation history.
    Messages(Arc<Vec<ChatMessage>>),
    /// A document set.
    Documents(Arc<Vec<Document>>),
    /// A parsed metadata filter.
    Filter(Arc<FilterExpr>),
}

impl ExtraValue {
    /// The value as a string slice, if it is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The value as JSON, if it is one.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a message list, if it is one.
    #[must_use]
    pub fn as_messages(&self) -> Option<&[ChatMessage]> {
        match self {
            Self::Messages(m) => Some(m),
            _ => None,
        }
    }

    /// The value as a document list, if it is one.
    #[must_use]
    pub fn as_documents(&self) -> Option<&[Document]> {
        match self {
            Self::Documents(d) => Some(d),
            _ => None,
        }
    }

    /// The value as a filter expression, if it is one.
    #[must_use]
    pub fn as_filter(&self) -> Option<&FilterExpr> {
        match self {
            Self::Filter(f) => Some(f),
            _ => None,
        }
    }
}

impl From<Value> for ExtraValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for ExtraValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for ExtraValue {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<Vec<ChatMessage>> for ExtraValue {
    fn from(value: Vec<ChatMessage>) -> Self {
        Self::Messages(Arc::new(value))
    }
}

impl From<Vec<Document>> for ExtraValue {
    fn from(value: Vec<Document>) -> Self {
        Self::Documents(Arc::new(value))
    }
}

impl From<FilterExpr> for ExtraValue {
    fn from(value: FilterExpr) -> Self {
        Self::Filter(Arc::new(value))
    }
}

/// The metadata bag carried by a query.
pub type Extras = HashMap<String, ExtraValue>;

/// A user query flowing through the pipeline.
///
/// # Examples
///
/// ```rust
/// use lynx_rag_core::types::Query;
///
/// let mut query = Query::new("what is ownership?").unwrap();
/// assert!(query.extra().is_none());
///
/// query.set("user_id", "u-42");
/// let copy = query.clone();
/// assert_eq!(copy.get("user_id").and_then(|v| v.as_str()), Some("u-42"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    text: String,
    extra: Option<Extras>,
}

impl Query {
    /// Create a query. Fails with [`RagError::InvalidInput`] on empty text.
    pub fn new<S: Into<String>>(text: S) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(RagError::invalid_input("query text must not be empty"));
        }
        Ok(Self { text, extra: None })
    }

    /// The query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The extras map, `None` until the first [`set`](Self::set).
    #[must_use]
    pub fn extra(&self) -> Option<&Extras> {
        self.extra.as_ref()
    }

    /// Mutable access to the extras map, initialising it on first use.
    pub fn extra_mut(&mut self) -> &mut Extras {
        self.extra.get_or_insert_with(HashMap::new)
    }

    /// Read an extra value. Never initialises the map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ExtraValue> {
        self.extra.as_ref().and_then(|extra| extra.get(key))
    }

    /// Store an extra value, overwriting any previous value under `key`.
    pub fn set<K: Into<String>, V: Into<ExtraValue>>(&mut self, key: K, value: V) {
        self.extra_mut().insert(key.into(), value.into());
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with_extra<K: Into<String>, V: Into<ExtraValue>>(mut self, key: K, value: V) -> Self {
        self.set(key, value);
        self
    }

    /// Replace the text in place. Fails on empty text and leaves the query untouched.
    pub fn set_text<S: Into<String>>(&mut self, text: S) -> Result<()> {
        let text = text.into();
        if text.is_empty() {
            return Err(RagError::invalid_input("query text must not be empty"));
        }
        self.text = text;
        Ok(())
    }

    /// Clone this query with new text, keeping every extra.
    pub fn with_text<S: Into<String>>(&self, text: S) -> Result<Self> {
        let mut copy = self.clone();
        copy.set_text(text)?;
        Ok(copy)
    }

    /// The conversation history under the reserved chat-history key.
    ///
    /// A value of the wrong shape is treated as absent.
    #[must_use]
    pub fn chat_history(&self) -> Option<&[ChatMessage]> {
        self.get(keys::CHAT_HISTORY)
            .and_then(ExtraValue::as_messages)
    }

    /// The raw filter value under the reserved filter-expression key.
    #[must_use]
    pub fn filter_expression(&self) -> Option<&ExtraValue> {
        self.get(keys::FILTER_EXPRESSION)
    }
}
