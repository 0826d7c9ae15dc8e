//! Integration tests for the pipeline orchestrator.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::*;
use lynx_rag_core::prelude::*;
use lynx_rag_query::RagPipeline;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_minimal_pipeline_passes_query_through() {
    let pipeline = RagPipeline::builder()
        .add_retriever(StaticRetriever::new(vec![doc("a", 0.9), doc("b", 0.4)]))
        .build()
        .unwrap();

    let output = pipeline
        .run(&ExecutionContext::new(), "What is Rust?")
        .await
        .unwrap();

    assert_eq!(output.query.text(), "What is Rust?");
    assert_eq!(ids(&output.documents), vec!["a", "b"]);
}

#[tokio::test]
async fn test_full_chain() {
    let augmenter = Arc::new(RecordingAugmenter::new(" augmented"));
    let retriever = Arc::new(EchoRetriever::default());
    let pipeline = RagPipeline::builder()
        .add_transformer(AppendTransformer { suffix: " transformed" })
        .with_expander(SuffixExpander {
            suffixes: vec![" variant1", " variant2"],
        })
        .add_retriever_arc(retriever.clone())
        .add_refiner(HalfRefiner)
        .with_augmenter_arc(augmenter.clone())
        .build()
        .unwrap();

    let output = pipeline.run(&ExecutionContext::new(), "test").await.unwrap();

    let seen: Vec<String> = retriever
        .seen
        .lock()
        .unwrap()
        .iter()
        .map(|q| q.text().to_string())
        .collect();
    let mut seen_sorted = seen.clone();
    seen_sorted.sort();
    assert_eq!(
        seen_sorted,
        vec!["test transformed variant1", "test transformed variant2"]
    );

    // Two retrieved, half kept, in sub-query order.
    assert_eq!(ids(&output.documents), vec!["test transformed variant1"]);
    assert_eq!(output.query.text(), "test augmented");
}

#[tokio::test]
async fn test_partial_retriever_failure_is_tolerated() {
    let pipeline = RagPipeline::builder()
        .add_retriever(StaticRetriever::new(vec![doc("a", 0.9)]))
        .add_retriever(FailingRetriever { message: "index offline" })
        .build()
        .unwrap();

    let output = pipeline.run(&ExecutionContext::new(), "q").await.unwrap();
    assert_eq!(ids(&output.documents), vec!["a"]);
}

#[tokio::test]
async fn test_all_retrievers_failing_fails_retrieve_stage() {
    let pipeline = RagPipeline::builder()
        .add_retriever(FailingRetriever { message: "first down" })
        .add_retriever(FailingRetriever { message: "second down" })
        .build()
        .unwrap();

    let err = pipeline.run(&ExecutionContext::new(), "q").await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Retrieve));
    assert!(
        err.to_string()
            .starts_with("pipeline stage 'retrieve' failed: all retrievers failed: ")
    );
    assert!(matches!(err.root_cause(), RagError::VectorStore { .. }));
}

#[tokio::test]
async fn test_retrieval_is_union_of_successes() {
    let pipeline = RagPipeline::builder()
        .with_expander(SuffixExpander {
            suffixes: vec![" one", " two"],
        })
        .add_retriever(StaticRetriever::new(vec![doc("a", 0.1)]))
        .add_retriever(FailingRetriever { message: "down" })
        .add_retriever(StaticRetriever::new(vec![doc("b", 0.2), doc("c", 0.3)]))
        .build()
        .unwrap();

    let output = pipeline.run(&ExecutionContext::new(), "q").await.unwrap();

    // Ordered by sub-query, then by retriever position.
    assert_eq!(ids(&output.documents), vec!["a", "b", "c", "a", "b", "c"]);
}

#[tokio::test]
async fn test_empty_expansion_falls_back_to_transformed_query() {
    let retriever = Arc::new(EchoRetriever::default());
    let pipeline = RagPipeline::builder()
        .add_transformer(AppendTransformer { suffix: "!" })
        .with_expander(SuffixExpander { suffixes: vec![] })
        .add_retriever_arc(retriever.clone())
        .build()
        .unwrap();

    let output = pipeline.run(&ExecutionContext::new(), "hi").await.unwrap();

    assert_eq!(ids(&output.documents), vec!["hi!"]);
    assert_eq!(retriever.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_transformer_failure_is_tagged_with_index() {
    let pipeline = RagPipeline::builder()
        .add_transformer(AppendTransformer { suffix: "?" })
        .add_transformer(FailingTransformer)
        .add_retriever(StaticRetriever::new(vec![]))
        .build()
        .unwrap();

    let err = pipeline.run(&ExecutionContext::new(), "q").await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Transform));
    assert_eq!(err.stage_index(), Some(1));
    assert_eq!(
        err.to_string(),
        "pipeline stage 'transform' failed: index 1: LLM error: model unavailable"
    );
}

#[tokio::test]
async fn test_refiner_failure_is_tagged_and_sees_original_query() {
    let refiner = Arc::new(FailingRefiner::default());
    let pipeline = RagPipeline::builder()
        .add_transformer(AppendTransformer { suffix: " rewritten" })
        .add_retriever(StaticRetriever::new(vec![doc("a", 1.0)]))
        .add_refiner_arc(refiner.clone())
        .build()
        .unwrap();

    let err = pipeline
        .run(&ExecutionContext::new(), "original")
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Refine));
    assert_eq!(err.stage_index(), Some(0));
    assert_eq!(refiner.seen.lock().unwrap()[0].text(), "original");
}

#[tokio::test]
async fn test_augmenter_receives_original_query() {
    let augmenter = Arc::new(RecordingAugmenter::new(" +ctx"));
    let pipeline = RagPipeline::builder()
        .add_transformer(AppendTransformer { suffix: " rewritten" })
        .add_retriever(StaticRetriever::new(vec![doc("a", 1.0)]))
        .with_augmenter_arc(augmenter.clone())
        .build()
        .unwrap();

    let query = Query::new("original")
        .unwrap()
        .with_extra("tenant", json!("acme"));
    let output = pipeline
        .execute(&ExecutionContext::new(), &query)
        .await
        .unwrap();

    let seen = augmenter.seen.lock().unwrap();
    assert_eq!(seen[0].0, query);
    assert_eq!(ids(&seen[0].1), vec!["a"]);
    assert_eq!(output.query.text(), "original +ctx");
    assert_eq!(output.query.get("tenant"), query.get("tenant"));
}

#[tokio::test]
async fn test_input_query_is_not_modified() {
    let pipeline = RagPipeline::builder()
        .add_transformer(AppendTransformer { suffix: " more" })
        .add_retriever(StaticRetriever::new(vec![doc("a", 1.0)]))
        .with_augmenter(RecordingAugmenter::new(" augmented"))
        .build()
        .unwrap();

    let query = Query::new("keep me").unwrap().with_extra("k", json!(1));
    let snapshot = query.clone();
    pipeline
        .execute(&ExecutionContext::new(), &query)
        .await
        .unwrap();

    assert_eq!(query, snapshot);
}

#[tokio::test]
async fn test_cancelled_context_fails_first_stage() {
    let pipeline = RagPipeline::builder()
        .add_retriever(StaticRetriever::new(vec![doc("a", 1.0)]))
        .build()
        .unwrap();

    let ctx = ExecutionContext::new();
    ctx.cancel();
    let err = pipeline.run(&ctx, "q").await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Transform));
    assert!(err.is_cancellation());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_aborts_in_flight_retrievals() {
    let slow = Arc::new(SlowRetriever::new(Duration::from_secs(60)));
    let pipeline = RagPipeline::builder()
        .add_retriever_arc(slow.clone())
        .build()
        .unwrap();

    let ctx = ExecutionContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = pipeline.run(&ctx, "q").await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Retrieve));
    assert!(matches!(err.root_cause(), RagError::Cancelled));
    assert_eq!(slow.started.load(Ordering::SeqCst), 1);
    assert_eq!(slow.finished.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_setting_bounds_execution() {
    let pipeline = RagPipeline::builder()
        .add_retriever(SlowRetriever::new(Duration::from_secs(60)))
        .with_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = pipeline
        .run(&ExecutionContext::new(), "q")
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Retrieve));
    assert!(matches!(err.root_cause(), RagError::DeadlineExceeded));
}

#[tokio::test(start_paused = true)]
async fn test_max_concurrency_caps_in_flight_retrievals() {
    let slow = Arc::new(SlowRetriever::new(Duration::from_millis(10)));
    let pipeline = RagPipeline::builder()
        .with_expander(SuffixExpander {
            suffixes: vec![" a", " b", " c", " d"],
        })
        .add_retriever_arc(slow.clone())
        .add_retriever_arc(slow.clone())
        .with_max_concurrency(2)
        .build()
        .unwrap();

    let output = pipeline.run(&ExecutionContext::new(), "q").await.unwrap();

    assert_eq!(output.documents.len(), 8);
    assert_eq!(slow.finished.load(Ordering::SeqCst), 8);
    assert!(slow.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_huge_max_concurrency_is_clamped_to_task_count() {
    let pipeline = RagPipeline::builder()
        .add_retriever(StaticRetriever::new(vec![doc("a", 0.9)]))
        .add_retriever(StaticRetriever::new(vec![doc("b", 0.8)]))
        .with_max_concurrency(usize::MAX)
        .build()
        .unwrap();

    let output = pipeline.run(&ExecutionContext::new(), "q").await.unwrap();

    assert_eq!(ids(&output.documents), vec!["a", "b"]);
}

#[tokio::test]
#[should_panic(expected = "retriever exploded")]
async fn test_retriever_panic_propagates() {
    let pipeline = RagPipeline::builder()
        .add_retriever(PanickingRetriever)
        .build()
        .unwrap();

    let _ = pipeline.run(&ExecutionContext::new(), "q").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_executions_share_pipeline() {
    let pipeline = Arc::new(
        RagPipeline::builder()
            .add_transformer(AppendTransformer { suffix: "!" })
            .add_retriever(EchoRetriever::default())
            .build()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            pipeline
                .run(&ExecutionContext::new(), &format!("query {i}"))
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let output = handle.await.unwrap().unwrap();
        assert_eq!(ids(&output.documents), vec![format!("query {i}!")]);
    }
}

#[tokio::test]
async fn test_built_from_config_record() {
    let config = lynx_rag_query::RagPipelineConfig {
        retrievers: vec![
            Arc::new(StaticRetriever::new(vec![doc("z", 0.1)])) as Arc<dyn DocumentRetriever>,
        ],
        settings: PipelineSettings::default().with_max_concurrency(1),
        ..Default::default()
    };
    let pipeline = RagPipeline::from_config(Some(config)).unwrap();

    assert_eq!(pipeline.retriever_count(), 1);
    assert_eq!(pipeline.settings().max_concurrency, Some(1));
    let output = pipeline.run(&ExecutionContext::new(), "q").await.unwrap();
    assert_eq!(ids(&output.documents), vec!["z"]);
}
