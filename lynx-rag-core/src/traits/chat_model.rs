//! Text completion interface used by the LLM-backed stages.

use async_trait::async_trait;

use crate::Result;

/// A chat model that turns a rendered prompt into a completion.
///
/// Built-in transformers, expanders and augmenters depend on this trait only,
/// so any client can be plugged in behind an `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync + std::fmt::Debug {
    /// Complete `prompt` and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RagError::Llm`] when the model call fails.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get a human-readable name for this model.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
