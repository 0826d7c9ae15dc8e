//! Built-in query augmenters.

pub mod contextual;

pub use contextual::{ContextualQueryAugmenter, DocumentFormatter};
