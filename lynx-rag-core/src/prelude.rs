//! Prelude module for convenient imports.
//!
//! ```rust
//! use lynx_rag_core::prelude::*;
//!
//! let doc = Document::new("Hello, world!");
//! let query = Query::new("What is this about?").unwrap();
//! ```

pub use crate::error::{RagError, Result, Stage};

pub use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, Document, DocumentBuilder, ExtraValue, Extras,
    MessageRole, Query,
};

pub use crate::traits::{
    ChatHandler, ChatModel, ChatStream, DocumentRefiner, DocumentRetriever, QueryAugmenter,
    QueryExpander, QueryTransformer, SearchRequest, StreamHandler, VectorStore,
};

pub use crate::config::{
    AugmenterSettings, ExpanderSettings, PipelineSettings, RagSettings, RetrieverSettings,
};

pub use crate::context::ExecutionContext;
pub use crate::filter::FilterExpr;
pub use crate::keys::{CHAT_HISTORY, DOCUMENT_CONTEXT, FILTER_EXPRESSION};
pub use crate::noop::{NoopStage, noop};
pub use crate::prompt::PromptTemplate;

pub use async_trait::async_trait;
