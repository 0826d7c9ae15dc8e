//! Ambient cancellation and deadline context handed to every stage call.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{RagError, Result};

/// Cancellation token plus optional deadline, threaded through a pipeline run.
///
/// Cloning is cheap and clones observe the same cancellation. Stages call
/// [`ExecutionContext::check`] before starting expensive work and wrap their
/// awaits in [`ExecutionContext::run`] so that a cancelled run stops at the
/// next I/O yield point.
///
/// # Examples
///
/// ```rust
/// use lynx_rag_core::ExecutionContext;
/// use std::time::Duration;
///
/// let ctx = ExecutionContext::new().with_timeout(Duration::from_secs(5));
/// assert!(ctx.check().is_ok());
/// ctx.cancel();
/// assert!(ctx.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecutionContext {
    /// Create a context that is never cancelled unless [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context driven by an existing cancellation token.
    #[must_use]
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set an absolute deadline. An earlier existing deadline is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Set a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context. Cancelling the child does not cancel the parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// The underlying cancellation token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check whether the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(RagError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(RagError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Resolve once the context is cancelled or its deadline elapses, yielding the cause.
    pub async fn done(&self) -> RagError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => RagError::Cancelled,
                    () = tokio::time::sleep_until(deadline) => RagError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                RagError::Cancelled
            }
        }
    }

    /// Drive `future` to completion unless the context finishes first.
    pub async fn run<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            cause = self.done() => Err(cause),
            result = future => result,
        }
    }
}
