//! Integration tests for the LLM-driven stages and the vector-store retriever.

mod common;

use std::sync::Arc;

use common::*;
use lynx_rag_core::prelude::*;
use lynx_rag_query::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn query_with_extras(text: &str) -> Query {
    Query::new(text)
        .unwrap()
        .with_extra("tenant", json!("acme"))
        .with_extra(
            CHAT_HISTORY,
            vec![
                ChatMessage::user("Tell me about Rust"),
                ChatMessage::assistant("Rust is a systems language."),
            ],
        )
}

async fn transform(transformer: &dyn QueryTransformer, query: &Query) -> Query {
    transformer
        .transform(&ExecutionContext::new(), query)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_rewrite_replaces_text_and_keeps_extras() {
    let model = ScriptedChatModel::new("  rust ownership rules \n");
    let transformer = RewriteQueryTransformer::new(model.clone()).unwrap();
    let query = query_with_extras("uh so how does ownership work in rust??");
    let snapshot = query.clone();

    let rewritten = transform(&transformer, &query).await;

    assert_eq!(rewritten.text(), "rust ownership rules");
    assert_eq!(rewritten.extra(), query.extra());
    assert_eq!(query, snapshot);
    assert!(model.last_prompt().contains("querying a vector store"));
    assert!(model.last_prompt().contains("uh so how does ownership work in rust??"));
}

#[tokio::test]
async fn test_rewrite_target_is_bound() {
    let model = ScriptedChatModel::new("rewritten");
    let transformer = RewriteQueryTransformer::new(model.clone())
        .unwrap()
        .with_target("web search engine")
        .unwrap();

    transform(&transformer, &Query::new("q").unwrap()).await;

    assert!(model.last_prompt().contains("querying a web search engine"));
}

#[tokio::test]
async fn test_translation_binds_language_and_keeps_extras() {
    let model = ScriptedChatModel::new("Qu'est-ce que Rust ?");
    let transformer = TranslationQueryTransformer::new(model.clone(), "french").unwrap();
    let query = query_with_extras("What is Rust?");

    let translated = transform(&transformer, &query).await;

    assert_eq!(translated.text(), "Qu'est-ce que Rust ?");
    assert_eq!(translated.extra(), query.extra());
    assert_eq!(transformer.target_language(), "french");
    assert!(model.last_prompt().contains("translate it to french"));
}

#[test_case("" ; "empty")]
#[test_case("   " ; "blank")]
fn test_translation_requires_language(language: &str) {
    let err = TranslationQueryTransformer::new(ScriptedChatModel::new("x"), language).unwrap_err();
    assert!(matches!(err, RagError::Configuration { .. }));
}

#[tokio::test]
async fn test_compression_uses_chat_history() {
    let model = ScriptedChatModel::new("How does the Rust borrow checker work?");
    let transformer = CompressionQueryTransformer::new(model.clone()).unwrap();
    let query = query_with_extras("and the borrow checker?");

    let compressed = transform(&transformer, &query).await;

    assert_eq!(compressed.text(), "How does the Rust borrow checker work?");
    assert_eq!(compressed.extra(), query.extra());
    let prompt = model.last_prompt();
    assert!(prompt.contains("user: Tell me about Rust\nassistant: Rust is a systems language."));
    assert!(prompt.contains("Follow-up query:\nand the borrow checker?"));
}

#[tokio::test]
async fn test_compression_without_history() {
    let model = ScriptedChatModel::new("standalone");
    let transformer = CompressionQueryTransformer::new(model.clone()).unwrap();

    let compressed = transform(&transformer, &Query::new("follow up").unwrap()).await;

    assert_eq!(compressed.text(), "standalone");
    assert!(model.last_prompt().contains("Conversation history:\n\n"));
}

#[tokio::test]
async fn test_empty_completion_keeps_query() {
    let query = query_with_extras("keep me");
    let transformers: Vec<Box<dyn QueryTransformer>> = vec![
        Box::new(RewriteQueryTransformer::new(ScriptedChatModel::new("  ")).unwrap()),
        Box::new(TranslationQueryTransformer::new(ScriptedChatModel::new(""), "german").unwrap()),
        Box::new(CompressionQueryTransformer::new(ScriptedChatModel::new("\n")).unwrap()),
    ];

    for transformer in &transformers {
        assert_eq!(transform(transformer.as_ref(), &query).await, query);
    }
}

#[test]
fn test_templates_missing_variables_rejected() {
    let model: Arc<dyn ChatModel> = ScriptedChatModel::new("x");

    let rewrite = RewriteQueryTransformer::new(Arc::clone(&model))
        .unwrap()
        .with_prompt_template("Rewrite {Query}");
    let compression = CompressionQueryTransformer::new(Arc::clone(&model))
        .unwrap()
        .with_prompt_template("{History}");
    let expander = MultiQueryExpander::new(model)
        .unwrap()
        .with_prompt_template("Give variants of {Query}");

    for err in [rewrite.unwrap_err(), compression.unwrap_err(), expander.unwrap_err()] {
        assert!(matches!(err, RagError::Configuration { .. }));
        assert!(err.to_string().contains("missing required variables"));
    }
}

#[tokio::test]
async fn test_custom_template_is_used() {
    let model = ScriptedChatModel::new("answer");
    let transformer = RewriteQueryTransformer::new(model.clone())
        .unwrap()
        .with_prompt_template("[{Target}] {Query}")
        .unwrap();

    transform(&transformer, &Query::new("q").unwrap()).await;

    assert_eq!(model.last_prompt(), "[vector store] q");
}

async fn expand(expander: &MultiQueryExpander, query: &Query) -> Vec<Query> {
    expander
        .expand(&ExecutionContext::new(), query)
        .await
        .unwrap()
}

fn texts(queries: &[Query]) -> Vec<&str> {
    queries.iter().map(Query::text).collect()
}

#[tokio::test]
async fn test_multi_query_splits_and_trims_lines() {
    let model =
        ScriptedChatModel::new("  first variant \n\n second variant\nthird variant\nfourth variant");
    let expander = MultiQueryExpander::new(model.clone()).unwrap();
    let query = query_with_extras("original");

    let expanded = expand(&expander, &query).await;

    assert_eq!(
        texts(&expanded),
        vec!["first variant", "second variant", "third variant"]
    );
    for variant in &expanded {
        assert_eq!(variant.extra(), query.extra());
    }
    assert!(model.last_prompt().contains("generate 3 different versions"));
}

#[tokio::test]
async fn test_multi_query_include_original() {
    let model = ScriptedChatModel::new("a\nb");
    let settings = ExpanderSettings::default()
        .with_number_of_queries(2)
        .with_include_original(true);
    let expander = MultiQueryExpander::with_settings(model, settings).unwrap();
    let query = Query::new("original").unwrap();

    let expanded = expand(&expander, &query).await;

    assert_eq!(texts(&expanded), vec!["original", "a", "b"]);
}

#[tokio::test]
async fn test_multi_query_without_variants_returns_input() {
    let expander = MultiQueryExpander::new(ScriptedChatModel::new(" \n \n")).unwrap();
    let query = query_with_extras("original");

    let expanded = expand(&expander, &query).await;

    assert_eq!(expanded, vec![query]);
}

#[test]
fn test_multi_query_rejects_zero_queries() {
    let settings = ExpanderSettings::default().with_number_of_queries(0);
    assert!(MultiQueryExpander::with_settings(ScriptedChatModel::new("x"), settings).is_err());
}

async fn retrieve(
    retriever: &VectorStoreDocumentRetriever,
    query: &Query,
) -> Result<Vec<Document>> {
    retriever.retrieve(&ExecutionContext::new(), query).await
}

#[tokio::test]
async fn test_retriever_builds_request_from_settings() {
    let store = RecordingVectorStore::new(vec![doc("a", 0.9)]);
    let settings = RetrieverSettings::default()
        .with_top_k(7)
        .with_min_score(0.25);
    let retriever = VectorStoreDocumentRetriever::with_settings(store.clone(), settings).unwrap();

    let documents = retrieve(&retriever, &Query::new("what is rust").unwrap())
        .await
        .unwrap();

    assert_eq!(ids(&documents), vec!["a"]);
    let request = store.last_request();
    assert_eq!(request.query, "what is rust");
    assert_eq!(request.top_k, 7);
    assert_eq!(request.min_score, 0.25);
    assert_eq!(request.filter, None);
}

#[tokio::test]
async fn test_retriever_zero_top_k_uses_default() {
    let store = RecordingVectorStore::new(vec![]);
    let settings = RetrieverSettings::default().with_top_k(0);
    let retriever = VectorStoreDocumentRetriever::with_settings(store.clone(), settings).unwrap();

    retrieve(&retriever, &Query::new("q").unwrap()).await.unwrap();

    assert_eq!(store.last_request().top_k, lynx_rag_core::traits::DEFAULT_TOP_K);
}

#[test_case(-0.1 ; "below range")]
#[test_case(1.5 ; "above range")]
fn test_retriever_rejects_out_of_range_min_score(min_score: f64) {
    let settings = RetrieverSettings::default().with_min_score(min_score);
    let err =
        VectorStoreDocumentRetriever::with_settings(RecordingVectorStore::new(vec![]), settings)
            .unwrap_err();
    assert!(matches!(err, RagError::Configuration { .. }));
}

#[tokio::test]
async fn test_retriever_uses_filter_expression_from_extras() {
    let store = RecordingVectorStore::new(vec![]);
    let retriever = VectorStoreDocumentRetriever::new(store.clone())
        .with_filter_fn(|_| Some(FilterExpr::eq("source", "fallback")));
    let filter = FilterExpr::eq("genre", "drama").and(FilterExpr::in_list("year", [2020, 2021]));
    let query = Query::new("q").unwrap().with_extra(FILTER_EXPRESSION, filter.clone());

    retrieve(&retriever, &query).await.unwrap();

    assert_eq!(store.last_request().filter, Some(filter));
}

#[tokio::test]
async fn test_retriever_parses_filter_string() {
    let store = RecordingVectorStore::new(vec![]);
    let retriever = VectorStoreDocumentRetriever::new(store.clone());
    let query = Query::new("q")
        .unwrap()
        .with_extra(FILTER_EXPRESSION, "genre == 'drama' AND year > 2020");

    retrieve(&retriever, &query).await.unwrap();

    assert_eq!(
        store.last_request().filter,
        Some(FilterExpr::parse("genre == 'drama' && year > 2020").unwrap())
    );
}

#[tokio::test]
async fn test_retriever_rejects_malformed_filter_string() {
    let store = RecordingVectorStore::new(vec![]);
    let retriever = VectorStoreDocumentRetriever::new(store.clone());
    let query = Query::new("q")
        .unwrap()
        .with_extra(FILTER_EXPRESSION, "genre == ");

    let err = retrieve(&retriever, &query).await.unwrap_err();

    assert!(matches!(err, RagError::InvalidInput { .. }));
    assert!(store.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_retriever_falls_back_to_filter_fn() {
    let store = RecordingVectorStore::new(vec![]);
    let retriever = VectorStoreDocumentRetriever::new(store.clone()).with_filter_fn(|extras| {
        extras
            .get("tenant")
            .and_then(ExtraValue::as_str)
            .map(|tenant| FilterExpr::eq("tenant", tenant))
    });

    retrieve(&retriever, &query_with_extras("q")).await.unwrap();
    assert_eq!(
        store.last_request().filter,
        Some(FilterExpr::eq("tenant", "acme"))
    );

    retrieve(&retriever, &Query::new("q").unwrap()).await.unwrap();
    assert_eq!(store.last_request().filter, None);
}

#[tokio::test]
async fn test_retriever_ignores_blank_filter_string() {
    let store = RecordingVectorStore::new(vec![]);
    let retriever = VectorStoreDocumentRetriever::new(store.clone());
    let query = Query::new("q").unwrap().with_extra(FILTER_EXPRESSION, "   ");

    retrieve(&retriever, &query).await.unwrap();

    assert_eq!(store.last_request().filter, None);
}

#[tokio::test]
async fn test_stages_in_a_pipeline() {
    init_test_logging();
    let model = ScriptedChatModel::new("variant one\nvariant two");
    let store = RecordingVectorStore::new(vec![doc("a", 0.9), doc("b", 0.3), doc("a", 0.9)]);

    let pipeline = RagPipeline::builder()
        .with_expander(MultiQueryExpander::new(model).unwrap())
        .add_retriever(VectorStoreDocumentRetriever::new(store.clone()))
        .add_refiner(DeduplicationRefiner::new())
        .add_refiner(RankRefiner::new(5))
        .with_augmenter(ContextualQueryAugmenter::new().unwrap())
        .build()
        .unwrap();

    let output = pipeline
        .run(&ExecutionContext::new(), "What is Rust?")
        .await
        .unwrap();

    assert_eq!(ids(&output.documents), vec!["a", "b"]);
    assert!(output.query.text().contains("Query: What is Rust?"));
    assert!(output.query.text().contains("text of a\ntext of b"));
    assert_eq!(store.requests.lock().unwrap().len(), 2);
}
