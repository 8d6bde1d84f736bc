use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rag_chatbot::error::RagError;
use rag_chatbot::gemini::GeminiClient;
use rag_chatbot::rag::embeddings::{embed_documents, Embedder, TaskType, MAX_BATCH_SIZE};
use rag_chatbot::rag::generator::Generator;

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    api_key: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

/// Minimal stand-in for the Generative Language API.
async fn stub(State(log): State<Log>, uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let path = uri.path().to_string();
    log.lock().unwrap().push(Recorded {
        path: path.clone(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    if path.ends_with(":embedContent") {
        return Json(json!({ "embedding": { "values": [0.1, 0.2, 0.3] } })).into_response();
    }

    if path.ends_with(":batchEmbedContents") {
        let embeddings: Vec<Value> = body["requests"]
            .as_array()
            .map(|requests| {
                requests
                    .iter()
                    .map(|r| {
                        let text = r["content"]["parts"][0]["text"].as_str().unwrap_or_default();
                        json!({ "values": [text.len() as f32, 1.0] })
                    })
                    .collect()
            })
            .unwrap_or_default();
        return Json(json!({ "embeddings": embeddings })).into_response();
    }

    if path.ends_with(":generateContent") {
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
        if prompt.contains("FAIL") {
            return (StatusCode::TOO_MANY_REQUESTS, "quota exceeded").into_response();
        }
        if prompt.contains("EMPTY") {
            return Json(json!({ "candidates": [] })).into_response();
        }
        return Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "**Hello**\n" }, { "text": "world" }] }
            }]
        }))
        .into_response();
    }

    StatusCode::NOT_FOUND.into_response()
}

async fn start_stub() -> (GeminiClient, Log) {
    let log = Log::default();
    let app = Router::new().fallback(stub).with_state(log.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = GeminiClient::new("test-key".to_string())
        .with_base_url(&format!("http://{}/v1beta/", addr))
        .with_system_instruction("Answer from the context only.");
    (client, log)
}

#[tokio::test]
async fn test_query_embedding_request() {
    let (client, log) = start_stub().await;

    let vector = client.embed("Where did you study?", TaskType::RetrievalQuery).await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/v1beta/models/text-embedding-004:embedContent");
    assert_eq!(calls[0].api_key.as_deref(), Some("test-key"));
    assert_eq!(calls[0].body["taskType"], "RETRIEVAL_QUERY");
    assert_eq!(calls[0].body["content"]["parts"][0]["text"], "Where did you study?");
}

#[tokio::test]
async fn test_batch_embedding_keeps_order() {
    let (client, log) = start_stub().await;
    let texts = vec!["a".to_string(), "bbb".to_string(), "cc".to_string()];

    let vectors = client.embed_batch(&texts, TaskType::RetrievalDocument).await.unwrap();
    assert_eq!(vectors, vec![vec![1.0, 1.0], vec![3.0, 1.0], vec![2.0, 1.0]]);

    let calls = log.lock().unwrap().clone();
    let requests = calls[0].body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 3);
    for request in requests {
        assert_eq!(request["model"], "models/text-embedding-004");
        assert_eq!(request["taskType"], "RETRIEVAL_DOCUMENT");
    }
}

#[tokio::test]
async fn test_corpus_of_250_uses_three_batch_calls() {
    let (client, log) = start_stub().await;
    let texts: Vec<String> = (0..250).map(|i| "x".repeat(i % 7 + 1)).collect();

    let entries = embed_documents(&client, &texts, MAX_BATCH_SIZE, |_| {}).await.unwrap();

    let sizes: Vec<usize> = log
        .lock()
        .unwrap()
        .iter()
        .map(|c| c.body["requests"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    assert_eq!(entries.len(), 250);
    for (text, entry) in texts.iter().zip(&entries) {
        assert_eq!(&entry.text, text);
        assert_eq!(entry.vector[0], text.len() as f32);
    }
}

#[tokio::test]
async fn test_generation_joins_parts_and_sends_system_instruction() {
    let (client, log) = start_stub().await;

    let text = client.generate("Question: hi\n\nContext:\n\n\nAnswer:").await.unwrap();
    assert_eq!(text, "**Hello**\nworld");

    let calls = log.lock().unwrap().clone();
    assert_eq!(calls[0].path, "/v1beta/models/gemini-1.5-flash:generateContent");
    assert_eq!(
        calls[0].body["systemInstruction"]["parts"][0]["text"],
        "Answer from the context only."
    );
    assert_eq!(calls[0].body["contents"][0]["role"], "user");
}

#[tokio::test]
async fn test_error_status_is_upstream_error() {
    let (client, _) = start_stub().await;

    let err = client.generate("FAIL please").await.unwrap_err();
    match err {
        RagError::Upstream(msg) => assert!(msg.contains("429"), "unexpected message: {}", msg),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_candidates_is_upstream_error() {
    let (client, _) = start_stub().await;
    let err = client.generate("EMPTY").await.unwrap_err();
    assert!(matches!(err, RagError::Upstream(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_upstream_error() {
    let client = GeminiClient::new("k".to_string()).with_base_url("http://127.0.0.1:9");
    let err = client.embed("hi", TaskType::RetrievalQuery).await.unwrap_err();
    assert!(matches!(err, RagError::Upstream(_)));
}
