//! Error types for the Lynx RAG runtime.
//!
//! Every failure surfaced by a pipeline is a [`RagError`]. Stage failures are
//! wrapped in [`RagError::Stage`] so the failing stage (and, for the chained
//! stages, the zero-based position in the chain) can be read straight off the
//! message while the original cause stays reachable through
//! [`std::error::Error::source`].

use std::fmt;

use thiserror::Error;

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Query transformer chain.
    Transform,
    /// Single query expander.
    Expand,
    /// Concurrent retrieval fan-out.
    Retrieve,
    /// Document refiner chain.
    Refine,
    /// Single query augmenter.
    Augment,
}

impl Stage {
    /// Stable lowercase tag used in error messages and log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Expand => "expand",
            Self::Retrieve => "retrieve",
            Self::Refine => "refine",
            Self::Augment => "augment",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn index_label(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!("index {i}: "),
        None => String::new(),
    }
}

/// Core error type for the Lynx RAG runtime.
#[derive(Error, Debug)]
pub enum RagError {
    /// Invalid or missing configuration, surfaced at construction time.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Detailed error message
        message: String,
    },

    /// Empty query text, missing required metadata, or a wrong-shaped value.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Detailed error message
        message: String,
    },

    /// Chat model call failed.
    #[error("LLM error: {message}")]
    Llm {
        /// Detailed error message
        message: String,
    },

    /// Vector store operation failed.
    #[error("Vector store error: {message}")]
    VectorStore {
        /// Detailed error message
        message: String,
    },

    /// A retriever failed for a reason other than the vector store itself.
    #[error("Retrieval error: {message}")]
    Retrieval {
        /// Detailed error message
        message: String,
    },

    /// A pipeline stage failed. The message is prefixed with the stage tag.
    #[error("pipeline stage '{stage}' failed: {}{source}", index_label(.index))]
    Stage {
        /// The failing stage.
        stage: Stage,
        /// Position inside the transformer or refiner chain.
        index: Option<usize>,
        /// The underlying cause.
        #[source]
        source: Box<RagError>,
    },

    /// Every `(sub-query, retriever)` pair of the retrieve stage failed.
    #[error("all retrievers failed: {source}")]
    AllRetrieversFailed {
        /// Number of failed retrieval attempts.
        failed: usize,
        /// The first failure observed.
        #[source]
        source: Box<RagError>,
    },

    /// The execution context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The execution context deadline elapsed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Internal runtime errors (broken invariants).
    #[error("Internal error: {message}")]
    Internal {
        /// Detailed error message
        message: String,
    },

    /// Generic errors from external dependencies
    #[error("External error: {source}")]
    External {
        /// The underlying error
        #[source]
        source: anyhow::Error,
    },
}

impl RagError {
    /// Create a new configuration error with a message.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new invalid input error with a message.
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new LLM error with a message.
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a new vector store error with a message.
    pub fn vector_store<S: Into<String>>(message: S) -> Self {
        Self::VectorStore {
            message: message.into(),
        }
    }

    /// Create a new retrieval error with a message.
    pub fn retrieval<S: Into<String>>(message: S) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    /// Create a new internal error with a message.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new external error from any error that implements `Into<anyhow::Error>`.
    pub fn external<E: Into<anyhow::Error>>(error: E) -> Self {
        Self::External {
            source: error.into(),
        }
    }

    /// Wrap `source` with a stage tag.
    #[must_use]
    pub fn at_stage(stage: Stage, index: Option<usize>, source: RagError) -> Self {
        Self::Stage {
            stage,
            index,
            source: Box::new(source),
        }
    }

    /// The stage tag of this error, if it is a stage failure.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The chain index of this error, if it is an indexed stage failure.
    #[must_use]
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Stage { index, .. } => *index,
            _ => None,
        }
    }

    /// Walk through stage and aggregation wrappers to the innermost cause.
    #[must_use]
    pub fn root_cause(&self) -> &RagError {
        match self {
            Self::Stage { source, .. } | Self::AllRetrieversFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Check if this error was caused by cancellation or an elapsed deadline.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Check if this error is a client error.
    ///
    /// Returns `true` for errors caused by invalid input or configuration
    /// that won't be fixed by retrying.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Configuration { .. } | Self::InvalidInput { .. }
        )
    }
}

/// Convert from `anyhow::Error` to `RagError`.
impl From<anyhow::Error> for RagError {
    fn from(error: anyhow::Error) -> Self {
        Self::External { source: error }
    }
}

impl From<serde_json::Error> for RagError {
    fn from(error: serde_json::Error) -> Self {
        Self::configuration(format!("JSON error: {error}"))
    }
}

impl From<toml::de::Error> for RagError {
    fn from(error: toml::de::Error) -> Self {
        Self::configuration(format!("TOML error: {error}"))
    }
}

/// Result type alias used throughout the runtime.
pub type Result<T> = std::result::Result<T, RagError>;
