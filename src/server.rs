use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{AskRequest, AskResponse, HealthResponse};
use crate::rag::RAGEngine;

pub const WELCOME_MESSAGE: &str = "Welcome to the CV chatbot API. POST a JSON body {\"question\": \"...\"} to /ask.";

pub struct AppState {
    pub rag: RAGEngine,
}

pub fn router(state: Arc<AppState>) -> Router {
    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    // Routes
    Router::new()
        .route("/", get(welcome_handler))
        .route("/ask", post(ask_handler))
        .route("/health", get(health_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Embeds the corpus in the background; `/ask` answers 503 until it is published.
///
/// A failed or panicking build is logged and leaves the service not ready.
pub fn spawn_corpus_build(
    state: Arc<AppState>,
    texts: Vec<String>,
    batch_size: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = AssertUnwindSafe(state.rag.build_corpus(&texts, batch_size, |_| {}))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(count)) => tracing::info!("Corpus index ready with {} documents", count),
            Ok(Err(e)) => tracing::error!("Corpus embedding failed, service stays not ready: {}", e),
            Err(_) => tracing::error!("Corpus embedding panicked, service stays not ready"),
        }
    })
}

async fn welcome_handler() -> &'static str {
    WELCOME_MESSAGE
}

async fn ask_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<AskRequest>>,
) -> Result<Json<AskResponse>, ApiError> {
    let request_id = Uuid::new_v4();

    // 1. Validate
    let Some(question) = payload.as_ref().and_then(|Json(req)| req.question()) else {
        tracing::warn!("Rejected request {} without a question", request_id);
        return Err(ApiError::Validation);
    };
    tracing::info!("Received question for request {}: {}", request_id, question);

    // 2. Readiness gate
    if !state.rag.is_ready() {
        tracing::warn!("Request {} arrived before the corpus index was ready", request_id);
        return Err(ApiError::NotReady);
    }

    // 3. Retrieve and generate
    let answer = state.rag.answer(question).await.map_err(|e| {
        tracing::error!("Error processing request {}: {}", request_id, e);
        ApiError::from(e)
    })?;

    Ok(Json(AskResponse { answer }))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let options = state.rag.options();

    Json(HealthResponse {
        status: "healthy".to_string(),
        ready: state.rag.is_ready(),
        documents: state.rag.corpus().map(|c| c.len()).unwrap_or(0),
        metric: options.metric.to_string(),
        top_k: options.top_k,
        timestamp: Utc::now(),
    })
}
