//! Query augmentation stage.

use async_trait::async_trait;

use crate::{Document, ExecutionContext, Query, Result};

/// Injects refined documents into the query handed to the chat model.
#[async_trait]
pub trait QueryAugmenter: Send + Sync + std::fmt::Debug {
    /// Build the augmented query from the original query and `documents`.
    async fn augment(
        &self,
        ctx: &ExecutionContext,
        query: &Query,
        documents: &[Document],
    ) -> Result<Query>;

    /// Get a human-readable name for this augmenter.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
