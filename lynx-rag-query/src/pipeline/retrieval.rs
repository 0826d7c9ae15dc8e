//! Concurrent retrieval fan-out with a partial-failure quorum.

use std::sync::Arc;

use lynx_rag_core::traits::DocumentRetriever;
use lynx_rag_core::{Document, ExecutionContext, Query, RagError, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, debug_span, warn};

type TaskOutcome = (usize, usize, &'static str, Result<Vec<Document>>);

/// Run every retriever against every query and concatenate the results.
///
/// Succeeds when at least one pair succeeds. Results are ordered by query,
/// then by retriever, with each retriever's own ordering kept. When every
/// pair fails the first failure is returned inside
/// [`RagError::AllRetrieversFailed`].
///
/// A cancelled context aborts the outstanding tasks. A panicking retriever
/// aborts the rest and the panic resumes on the calling task.
pub(crate) async fn fan_out(
    ctx: &ExecutionContext,
    queries: &[Query],
    retrievers: &[Arc<dyn DocumentRetriever>],
    max_concurrency: Option<usize>,
) -> Result<Vec<Document>> {
    let total = queries.len() * retrievers.len();
    // No more than one permit per task can ever be held.
    let permits = max_concurrency.unwrap_or(total).min(total).max(1);
    debug!(tasks = total, permits, "Starting retrieval fan-out");

    let semaphore = Arc::new(Semaphore::new(permits));
    let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();

    for (query_index, query) in queries.iter().enumerate() {
        for (retriever_index, retriever) in retrievers.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let retriever = Arc::clone(retriever);
            let query = query.clone();
            let ctx = ctx.clone();
            let span = debug_span!(
                "retrieve",
                retriever = retriever.name(),
                query_index,
                retriever_index
            );

            tasks.spawn(
                async move {
                    let outcome = async {
                        let _permit = semaphore.acquire_owned().await.map_err(|e| {
                            RagError::internal(format!("retrieval semaphore closed: {e}"))
                        })?;
                        ctx.run(retriever.retrieve(&ctx, &query)).await
                    }
                    .await;
                    (query_index, retriever_index, retriever.name(), outcome)
                }
                .instrument(span),
            );
        }
    }

    let mut batches: Vec<(usize, usize, Vec<Document>)> = Vec::new();
    let mut first_failure: Option<RagError> = None;
    let mut failed = 0usize;

    loop {
        let joined = tokio::select! {
            biased;
            cause = ctx.done() => {
                tasks.abort_all();
                return Err(cause);
            }
            joined = tasks.join_next() => joined,
        };

        let Some(joined) = joined else { break };

        match joined {
            Ok((query_index, retriever_index, name, Ok(documents))) => {
                debug!(
                    retriever = name,
                    query_index,
                    count = documents.len(),
                    "Retriever succeeded"
                );
                batches.push((query_index, retriever_index, documents));
            }
            Ok((query_index, _, name, Err(error))) => {
                warn!(retriever = name, query_index, %error, "Retriever failed");
                failed += 1;
                first_failure.get_or_insert(error);
            }
            Err(join_error) if join_error.is_panic() => {
                tasks.abort_all();
                std::panic::resume_unwind(join_error.into_panic());
            }
            Err(join_error) => {
                failed += 1;
                first_failure.get_or_insert(RagError::internal(format!(
                    "retrieval task aborted: {join_error}"
                )));
            }
        }
    }

    if batches.is_empty() {
        ctx.check()?;
        let source = first_failure
            .unwrap_or_else(|| RagError::internal("retrieval produced no outcome"));
        return Err(RagError::AllRetrieversFailed {
            failed,
            source: Box::new(source),
        });
    }

    if failed > 0 {
        warn!(
            failed,
            succeeded = batches.len(),
            "Retrieval completed with partial failures"
        );
    }

    batches.sort_by_key(|(query_index, retriever_index, _)| (*query_index, *retriever_index));
    Ok(batches
        .into_iter()
        .flat_map(|(_, _, documents)| documents)
        .collect())
}
