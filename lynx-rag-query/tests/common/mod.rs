//! Hand-written test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lynx_rag_core::prelude::*;

/// Route tracing output through the test harness. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn doc(id: &str, score: f64) -> Document {
    Document::with_id(id, format!("text of {id}")).with_score(score)
}

pub fn ids(documents: &[Document]) -> Vec<String> {
    documents.iter().map(|d| d.id.clone()).collect()
}

pub fn sorted_ids(documents: &[Document]) -> Vec<String> {
    let mut ids = ids(documents);
    ids.sort();
    ids
}

/// Returns the same documents for every query.
#[derive(Debug, Clone)]
pub struct StaticRetriever {
    pub documents: Vec<Document>,
}

impl StaticRetriever {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentRetriever for StaticRetriever {
    async fn retrieve(&self, _ctx: &ExecutionContext, _query: &Query) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

/// Always fails.
#[derive(Debug, Clone)]
pub struct FailingRetriever {
    pub message: &'static str,
}

#[async_trait]
impl DocumentRetriever for FailingRetriever {
    async fn retrieve(&self, _ctx: &ExecutionContext, _query: &Query) -> Result<Vec<Document>> {
        Err(RagError::vector_store(self.message))
    }
}

/// Returns one document per query, identified by the query text, and records queries.
#[derive(Debug, Default)]
pub struct EchoRetriever {
    pub seen: Mutex<Vec<Query>>,
}

#[async_trait]
impl DocumentRetriever for EchoRetriever {
    async fn retrieve(&self, _ctx: &ExecutionContext, query: &Query) -> Result<Vec<Document>> {
        self.seen.lock().unwrap().push(query.clone());
        Ok(vec![Document::with_id(query.text(), query.text()).with_score(0.5)])
    }
}

/// Sleeps before answering and counts starts, completions and peak concurrency.
#[derive(Debug, Default)]
pub struct SlowRetriever {
    pub delay: Duration,
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl SlowRetriever {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl DocumentRetriever for SlowRetriever {
    async fn retrieve(&self, _ctx: &ExecutionContext, query: &Query) -> Result<Vec<Document>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Document::with_id(query.text(), "slow")])
    }
}

/// Panics on every call.
#[derive(Debug)]
pub struct PanickingRetriever;

#[async_trait]
impl DocumentRetriever for PanickingRetriever {
    async fn retrieve(&self, _ctx: &ExecutionContext, _query: &Query) -> Result<Vec<Document>> {
        panic!("retriever exploded");
    }
}

/// Appends a suffix to the query text.
#[derive(Debug, Clone)]
pub struct AppendTransformer {
    pub suffix: &'static str,
}

#[async_trait]
impl QueryTransformer for AppendTransformer {
    async fn transform(&self, _ctx: &ExecutionContext, query: &Query) -> Result<Query> {
        query.with_text(format!("{}{}", query.text(), self.suffix))
    }
}

/// Always fails.
#[derive(Debug, Clone)]
pub struct FailingTransformer;

#[async_trait]
impl QueryTransformer for FailingTransformer {
    async fn transform(&self, _ctx: &ExecutionContext, _query: &Query) -> Result<Query> {
        Err(RagError::llm("model unavailable"))
    }
}

/// Produces one variant per suffix.
#[derive(Debug, Clone)]
pub struct SuffixExpander {
    pub suffixes: Vec<&'static str>,
}

#[async_trait]
impl QueryExpander for SuffixExpander {
    async fn expand(&self, _ctx: &ExecutionContext, query: &Query) -> Result<Vec<Query>> {
        self.suffixes
            .iter()
            .map(|suffix| query.with_text(format!("{}{suffix}", query.text())))
            .collect()
    }
}

/// Keeps the first half of the documents.
#[derive(Debug, Clone)]
pub struct HalfRefiner;

#[async_trait]
impl DocumentRefiner for HalfRefiner {
    async fn refine(
        &self,
        _ctx: &ExecutionContext,
        _query: &Query,
        documents: &[Document],
    ) -> Result<Vec<Document>> {
        Ok(documents[..documents.len() / 2].to_vec())
    }
}

/// Records the query it was handed and fails.
#[derive(Debug, Default)]
pub struct FailingRefiner {
    pub seen: Mutex<Vec<Query>>,
}

#[async_trait]
impl DocumentRefiner for FailingRefiner {
    async fn refine(
        &self,
        _ctx: &ExecutionContext,
        query: &Query,
        _documents: &[Document],
    ) -> Result<Vec<Document>> {
        self.seen.lock().unwrap().push(query.clone());
        Err(RagError::internal("refiner broke"))
    }
}

/// Records its inputs and appends a suffix to the query text.
#[derive(Debug)]
pub struct RecordingAugmenter {
    pub suffix: &'static str,
    pub seen: Mutex<Vec<(Query, Vec<Document>)>>,
}

impl RecordingAugmenter {
    pub fn new(suffix: &'static str) -> Self {
        Self {
            suffix,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QueryAugmenter for RecordingAugmenter {
    async fn augment(
        &self,
        _ctx: &ExecutionContext,
        query: &Query,
        documents: &[Document],
    ) -> Result<Query> {
        self.seen
            .lock()
            .unwrap()
            .push((query.clone(), documents.to_vec()));
        query.with_text(format!("{}{}", query.text(), self.suffix))
    }
}

/// Replies with a fixed completion and records every prompt.
#[derive(Debug)]
pub struct ScriptedChatModel {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedChatModel {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Returns fixed documents and records every search request.
#[derive(Debug, Default)]
pub struct RecordingVectorStore {
    pub documents: Vec<Document>,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl RecordingVectorStore {
    pub fn new(documents: Vec<Document>) -> Arc<Self> {
        Arc::new(Self {
            documents,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn last_request(&self) -> SearchRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no search request recorded")
    }
}

#[async_trait]
impl VectorStore for RecordingVectorStore {
    async fn similarity_search(&self, request: &SearchRequest) -> Result<Vec<Document>> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.documents.clone())
    }
}

/// Returns a fixed response and records the requests it received.
#[derive(Debug, Default)]
pub struct FixedChatHandler {
    pub content: &'static str,
    pub calls: Mutex<Vec<ChatRequest>>,
}

#[async_trait]
impl ChatHandler for FixedChatHandler {
    async fn call(
        &self,
        _ctx: &ExecutionContext,
        request: &mut ChatRequest,
    ) -> Result<ChatResponse> {
        self.calls.lock().unwrap().push(request.clone());
        Ok(ChatResponse::new(self.content))
    }
}

/// Streams fixed chunks and records the requests it received.
#[derive(Debug, Default)]
pub struct FixedStreamHandler {
    pub chunks: Vec<&'static str>,
    pub calls: Arc<Mutex<Vec<ChatRequest>>>,
}

impl StreamHandler for FixedStreamHandler {
    fn stream(&self, _ctx: ExecutionContext, request: ChatRequest) -> ChatStream {
        self.calls.lock().unwrap().push(request);
        let chunks: Vec<Result<ChatResponse>> = self
            .chunks
            .iter()
            .map(|chunk| Ok(ChatResponse::new(*chunk)))
            .collect();
        Box::pin(stream::iter(chunks))
    }
}

/// Sets `dropped` when the stream owning it goes away.
#[derive(Debug)]
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Streams numbered chunks forever, counting how many were pulled.
#[derive(Debug, Default)]
pub struct EndlessStreamHandler {
    pub pulled: Arc<AtomicUsize>,
    pub dropped: Arc<AtomicBool>,
}

impl StreamHandler for EndlessStreamHandler {
    fn stream(&self, _ctx: ExecutionContext, _request: ChatRequest) -> ChatStream {
        let guard = DropFlag(Arc::clone(&self.dropped));
        let pulled = Arc::clone(&self.pulled);
        Box::pin(stream::unfold(guard, move |guard| {
            let pulled = Arc::clone(&pulled);
            async move {
                let n = pulled.fetch_add(1, Ordering::SeqCst);
                Some((Ok(ChatResponse::new(format!("chunk {n}"))), guard))
            }
        }))
    }
}
