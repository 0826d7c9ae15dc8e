//! Built-in query transformers.
//!
//! Each transformer asks a chat model to reshape the query and returns a
//! copy of the input with new text. Extras always carry over, and an empty
//! model answer leaves the query unchanged.

pub mod compression;
pub mod rewrite;
pub mod translation;

pub use compression::CompressionQueryTransformer;
pub use rewrite::RewriteQueryTransformer;
pub use translation::TranslationQueryTransformer;

use lynx_rag_core::{Query, Result};

/// Copy `query` with `completion` as its text, or unchanged if the completion is empty.
fn replace_text(query: &Query, completion: String) -> Result<Query> {
    if completion.is_empty() {
        tracing::warn!("Chat model returned an empty query, keeping the input");
        return Ok(query.clone());
    }
    query.with_text(completion)
}
