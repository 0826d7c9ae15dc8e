//! Execution state machine for a single pipeline run.

use std::fmt;

use lynx_rag_core::{RagError, Result};

/// Progress of one pipeline execution.
///
/// States advance strictly in order, `Init` to `Done`. Any non-terminal state
/// may move to `Failed`. Terminal states cannot be left and no state is
/// entered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineState {
    /// Nothing has run yet.
    #[default]
    Init,
    /// The transformer chain finished.
    Transformed,
    /// The expander produced the sub-queries.
    Expanded,
    /// Retrieval fan-out joined.
    Retrieved,
    /// The refiner chain finished.
    Refined,
    /// The augmenter produced the final query.
    Augmented,
    /// The run completed successfully.
    Done,
    /// A stage failed and the run halted.
    Failed,
}

impl PipelineState {
    /// The only state reachable from `self` on success.
    #[must_use]
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Transformed),
            Self::Transformed => Some(Self::Expanded),
            Self::Expanded => Some(Self::Retrieved),
            Self::Retrieved => Some(Self::Refined),
            Self::Refined => Some(Self::Augmented),
            Self::Augmented => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Whether the run is over.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Move to `next`, which must be the immediate successor.
    pub fn advance(&mut self, next: Self) -> Result<()> {
        if self.successor() != Some(next) {
            return Err(RagError::internal(format!(
                "illegal pipeline transition {self} -> {next}"
            )));
        }
        tracing::debug!(from = %self, to = %next, "Pipeline state transition");
        *self = next;
        Ok(())
    }

    /// Move to `Failed`.
    pub fn fail(&mut self) -> Result<()> {
        if self.is_terminal() {
            return Err(RagError::internal(format!(
                "cannot fail pipeline in terminal state {self}"
            )));
        }
        tracing::debug!(from = %self, "Pipeline failed");
        *self = Self::Failed;
        Ok(())
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::Transformed => "transformed",
            Self::Expanded => "expanded",
            Self::Retrieved => "retrieved",
            Self::Refined => "refined",
            Self::Augmented => "augmented",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}
